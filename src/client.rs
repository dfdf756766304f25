//! Immutable clients, request verbs and the process-wide default client.
//!
//! A [`Client`] is a snapshot of base options. Every verb call builds a fresh
//! [`Config`] by applying the base options and then the call-site options,
//! sends the request through the composed transport chain and routes the
//! buffered response through the registered hooks.

use crate::config::Config;
use crate::error::{BoxError, Cancelled, TimedOut};
use crate::hook;
use crate::option::{self, RequestOption};
use crate::transport::Transport;
use crate::{Error, Response, ResponseError, Result};
use http::Method;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// A reusable set of base options.
///
/// Cloning is cheap. Deriving a client with [`Client::with`] copies the base
/// options, so the parent is never affected.
///
/// # Examples
///
/// ```no_run
/// use hookwire::{as_error, as_json, base_url, bearer, when_failure, when_success, Client};
/// use serde::Deserialize;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # async fn example() -> hookwire::Result<()> {
/// let client = Client::new([
///     base_url("https://api.example.com"),
///     bearer("token"),
///     when_failure(as_error()),
/// ])?;
///
/// let user = Arc::new(Mutex::new(User::default()));
/// client
///     .get("/users/123", [when_success(as_json(user.clone()))])
///     .await?;
/// println!("User: {}", user.lock().unwrap().name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http_client: reqwest::Client,
    options: Vec<RequestOption>,
}

impl Client {
    /// Creates a client with the given base options.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(options: impl IntoIterator<Item = RequestOption>) -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self::with_http_client(http_client, options))
    }

    /// Creates a client sending through `http_client` unless an option
    /// replaces it.
    pub fn with_http_client(
        http_client: reqwest::Client,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client,
                options: options.into_iter().collect(),
            }),
        }
    }

    /// Returns a new client whose base options are this client's followed
    /// by `options`.
    pub fn with(&self, options: impl IntoIterator<Item = RequestOption>) -> Self {
        let options = self
            .inner
            .options
            .iter()
            .cloned()
            .chain(options)
            .collect();
        Self {
            inner: Arc::new(ClientInner {
                http_client: self.inner.http_client.clone(),
                options,
            }),
        }
    }

    /// The base options, in application order.
    pub fn options(&self) -> &[RequestOption] {
        &self.inner.options
    }

    /// Builds the configuration for one request.
    ///
    /// Base options are applied first, then `options`; the first failure
    /// is returned as-is.
    pub fn config<'a>(
        &self,
        options: impl IntoIterator<Item = &'a RequestOption>,
    ) -> Result<Config> {
        let mut config = Config::new(self.inner.http_client.clone());
        option::apply_all(&mut config, &self.inner.options)?;
        option::apply_all(&mut config, options)?;
        Ok(config)
    }

    /// Sends a request with an arbitrary method.
    ///
    /// Returns `Ok(())` unless an option fails, the transport fails or a
    /// hook fails. A failure status with no hook turning it into an error
    /// is not an error.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<()> {
        let options: Vec<RequestOption> = options.into_iter().collect();
        let config = self.config(&options)?;
        let request = config.build_request(method, url)?;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            hooks = config.hooks().len(),
            "Executing HTTP request"
        );

        let response = execute(&config, request).await.map_err(|err| {
            tracing::debug!(error = %err, "Transport failed");
            ResponseError::transport(err)
        })?;

        tracing::debug!(
            status = response.status().as_u16(),
            latency_ms = response.latency().as_millis(),
            "Received HTTP response"
        );

        hook::dispatch(config.hooks(), &response)?;
        Ok(())
    }

    /// Sends a GET request.
    pub async fn get(
        &self,
        url: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<()> {
        self.request(Method::GET, url, options).await
    }

    /// Sends a POST request.
    pub async fn post(
        &self,
        url: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<()> {
        self.request(Method::POST, url, options).await
    }

    /// Sends a PUT request.
    pub async fn put(
        &self,
        url: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<()> {
        self.request(Method::PUT, url, options).await
    }

    /// Sends a PATCH request.
    pub async fn patch(
        &self,
        url: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<()> {
        self.request(Method::PATCH, url, options).await
    }

    /// Sends a DELETE request.
    pub async fn delete(
        &self,
        url: &str,
        options: impl IntoIterator<Item = RequestOption>,
    ) -> Result<()> {
        self.request(Method::DELETE, url, options).await
    }
}

/// Runs the exchange, bounded by the configured timeout and cancellation.
async fn execute(
    config: &Config,
    request: reqwest::Request,
) -> std::result::Result<Response, BoxError> {
    let transport = config.transport_chain();
    let exchange = async move {
        match config.timeout() {
            Some(limit) => tokio::time::timeout(limit, round_trip(transport, request))
                .await
                .unwrap_or_else(|_| Err(TimedOut(limit).into())),
            None => round_trip(transport, request).await,
        }
    };

    match config.cancellation() {
        Some(token) => token
            .run_until_cancelled(exchange)
            .await
            .unwrap_or_else(|| Err(Cancelled.into())),
        None => exchange.await,
    }
}

async fn round_trip(
    transport: Arc<dyn Transport>,
    request: reqwest::Request,
) -> std::result::Result<Response, BoxError> {
    let started = Instant::now();
    let response = transport.round_trip(request).await?;
    Ok(Response::read(response, started).await?)
}

static DEFAULT_CLIENT: OnceLock<Client> = OnceLock::new();
static FALLBACK_CLIENT: OnceLock<Client> = OnceLock::new();

/// Installs the client used by the package-level verbs.
///
/// The default can be installed once; later attempts return the rejected
/// client. Install it before issuing package-level requests.
///
/// # Examples
///
/// ```no_run
/// use hookwire::{as_error, user_agent, when_failure, Client};
///
/// # fn example() -> hookwire::Result<()> {
/// let client = Client::new([user_agent("my-app/1.0"), when_failure(as_error())])?;
/// hookwire::set_default_client(client).expect("default client already installed");
/// # Ok(())
/// # }
/// ```
pub fn set_default_client(client: Client) -> std::result::Result<(), Client> {
    DEFAULT_CLIENT.set(client)
}

/// The client used by the package-level verbs.
///
/// Falls back to a client without base options when none was installed.
pub fn default_client() -> Result<Client> {
    if let Some(client) = DEFAULT_CLIENT.get() {
        return Ok(client.clone());
    }
    if let Some(client) = FALLBACK_CLIENT.get() {
        return Ok(client.clone());
    }
    let client = Client::new(Vec::new())?;
    Ok(FALLBACK_CLIENT.get_or_init(|| client).clone())
}

/// Sends a GET request with the default client.
pub async fn get(url: &str, options: impl IntoIterator<Item = RequestOption>) -> Result<()> {
    default_client()?.get(url, options).await
}

/// Sends a POST request with the default client.
pub async fn post(url: &str, options: impl IntoIterator<Item = RequestOption>) -> Result<()> {
    default_client()?.post(url, options).await
}

/// Sends a PUT request with the default client.
pub async fn put(url: &str, options: impl IntoIterator<Item = RequestOption>) -> Result<()> {
    default_client()?.put(url, options).await
}

/// Sends a PATCH request with the default client.
pub async fn patch(url: &str, options: impl IntoIterator<Item = RequestOption>) -> Result<()> {
    default_client()?.patch(url, options).await
}

/// Sends a DELETE request with the default client.
pub async fn delete(url: &str, options: impl IntoIterator<Item = RequestOption>) -> Result<()> {
    default_client()?.delete(url, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{header, query};

    #[test]
    fn test_with_does_not_mutate_parent() {
        let parent = Client::new([header("Message", "foo")]).unwrap();
        let child = parent.with([header("Message", "bar"), query("count", "3")]);

        assert_eq!(parent.options().len(), 1);
        assert_eq!(child.options().len(), 3);

        let parent_config = parent.config([]).unwrap();
        assert_eq!(parent_config.headers()["message"], "foo");
        assert!(parent_config.query().is_empty());

        let child_config = child.config([]).unwrap();
        assert_eq!(child_config.headers()["message"], "bar");
        assert_eq!(child_config.query().len(), 1);
    }

    #[test]
    fn test_call_site_options_follow_base_options() {
        let client = Client::new([header("Message", "base")]).unwrap();
        let call_site = [header("Message", "call")];
        let config = client.config(&call_site).unwrap();
        assert_eq!(config.headers()["message"], "call");
    }
}
