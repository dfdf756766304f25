//! JSON request bodies and response decoding.
//!
//! Built entirely on the core [`body`](crate::body) option and response
//! [`Handler`]s. [`JsonConfig`] lets callers swap the encoder or decoder,
//! e.g. to emit a canonical form or to decode into a pre-populated value.

use crate::error::BoxError;
use crate::hook::{store, Handler};
use crate::option::{body, RequestOption};
use crate::Response;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// The content type sent with JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";

type EncodeFn<T> = dyn Fn(&T) -> Result<Vec<u8>, BoxError> + Send + Sync;
type DecodeFn<T> = dyn Fn(&[u8], &mut T) -> Result<(), BoxError> + Send + Sync;

/// Overridable JSON encoding and decoding for values of type `T`.
///
/// Without overrides, `serde_json` is used in both directions.
///
/// # Examples
///
/// ```
/// use hookwire::json::JsonConfig;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Greeting {
///     message: String,
/// }
///
/// let pretty = JsonConfig::<Greeting>::new()
///     .encode_fn(|value| Ok(serde_json::to_vec_pretty(value)?));
///
/// let option = pretty.json(Greeting { message: "hi".to_string() });
/// ```
pub struct JsonConfig<T> {
    encode_fn: Option<Arc<EncodeFn<T>>>,
    decode_fn: Option<Arc<DecodeFn<T>>>,
}

impl<T> JsonConfig<T> {
    /// Creates a config using `serde_json` for both directions.
    pub fn new() -> Self {
        Self {
            encode_fn: None,
            decode_fn: None,
        }
    }

    /// Overrides how request bodies are encoded.
    pub fn encode_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    {
        self.encode_fn = Some(Arc::new(f));
        self
    }

    /// Overrides how response bodies are decoded into the destination.
    pub fn decode_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8], &mut T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.decode_fn = Some(Arc::new(f));
        self
    }
}

impl<T> JsonConfig<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// Sends `value` as a JSON request body.
    pub fn json(&self, value: T) -> RequestOption {
        let value = Arc::new(value);
        let encode_fn = self.encode_fn.clone();
        body(APPLICATION_JSON, move || {
            let encoded = match &encode_fn {
                Some(f) => f(value.as_ref())?,
                None => serde_json::to_vec(&*value)?,
            };
            Ok(Bytes::from(encoded))
        })
    }
}

impl<T> JsonConfig<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Decodes the response body into `dest`.
    ///
    /// `dest` is only written when the handler runs and decoding succeeds.
    pub fn as_json(&self, dest: Arc<Mutex<T>>) -> Handler {
        let decode_fn = self.decode_fn.clone();
        Handler::new(move |response: &Response| match &decode_fn {
            Some(f) => {
                let mut guard = dest
                    .lock()
                    .map_err(|_| "response destination lock poisoned")?;
                f(&response.body()[..], &mut *guard)
            }
            None => store(&*dest, response.json::<T>()?),
        })
    }
}

impl<T> Default for JsonConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonConfig<T> {
    fn clone(&self) -> Self {
        Self {
            encode_fn: self.encode_fn.clone(),
            decode_fn: self.decode_fn.clone(),
        }
    }
}

impl<T> fmt::Debug for JsonConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonConfig")
            .field("custom_encode", &self.encode_fn.is_some())
            .field("custom_decode", &self.decode_fn.is_some())
            .finish()
    }
}

/// Sends `value` as a JSON request body using `serde_json`.
///
/// # Examples
///
/// ```no_run
/// use hookwire::{as_error, json, when_failure};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct NewPost {
///     title: String,
/// }
///
/// # async fn example() -> hookwire::Result<()> {
/// hookwire::post(
///     "https://api.example.com/posts",
///     [
///         json(NewPost { title: "hello".to_string() }),
///         when_failure(as_error()),
///     ],
/// )
/// .await
/// # }
/// ```
pub fn json<T>(value: T) -> RequestOption
where
    T: Serialize + Send + Sync + 'static,
{
    JsonConfig::new().json(value)
}

/// Decodes the response body into `dest` using `serde_json`.
///
/// # Examples
///
/// ```no_run
/// use hookwire::{as_json, when_success};
/// use serde::Deserialize;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default, Deserialize)]
/// struct Echo {
///     message: String,
/// }
///
/// # async fn example() -> hookwire::Result<()> {
/// let out = Arc::new(Mutex::new(Echo::default()));
/// hookwire::get("https://api.example.com/echo", [when_success(as_json(out.clone()))]).await?;
/// println!("{}", out.lock().unwrap().message);
/// # Ok(())
/// # }
/// ```
pub fn as_json<T>(dest: Arc<Mutex<T>>) -> Handler
where
    T: DeserializeOwned + Send + 'static,
{
    JsonConfig::new().as_json(dest)
}
