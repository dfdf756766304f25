//! Response hooks and the dispatcher that routes a response through them.
//!
//! A [`Hook`] pairs a [`Condition`] with a [`Handler`]. Once the body of a
//! response has been read, every hook is visited in registration order and
//! each one whose condition matches runs. The first handler that fails stops
//! the dispatch; its error is returned inside a [`ResponseError`].

use crate::error::BoxError;
use crate::{Response, ResponseError};
use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Decides whether a hook runs for a given response.
#[derive(Clone)]
pub enum Condition {
    /// Runs for 2xx and 3xx responses.
    Success,
    /// Runs for every response that is not a success.
    Failure,
    /// Runs when the status code equals this one, whatever its class.
    Status(StatusCode),
    /// Runs when the predicate returns `true`.
    Custom(Arc<dyn Fn(&Response) -> bool + Send + Sync>),
}

impl Condition {
    /// Returns `true` if a hook with this condition runs for `response`.
    pub fn matches(&self, response: &Response) -> bool {
        match self {
            Condition::Success => response.is_success(),
            Condition::Failure => !response.is_success(),
            Condition::Status(status) => response.status() == *status,
            Condition::Custom(predicate) => predicate(response),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Success => f.write_str("Success"),
            Condition::Failure => f.write_str("Failure"),
            Condition::Status(status) => f.debug_tuple("Status").field(status).finish(),
            Condition::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A response handler.
///
/// Any closure `Fn(&Response) -> Result<(), BoxError>` converts into a
/// `Handler`. An error it returns becomes the inner error of a
/// [`ResponseError`] carrying the received response. That includes a
/// `ResponseError` from some other exchange.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(&Response) -> Result<(), BoxError> + Send + Sync>);

impl Handler {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Response) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, response: &Response) -> Result<(), BoxError> {
        (self.0)(response)
    }
}

impl<F> From<F> for Handler
where
    F: Fn(&Response) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Handler::new(f)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// A registered (condition, handler) pair.
#[derive(Clone, Debug)]
pub struct Hook {
    pub(crate) condition: Condition,
    pub(crate) handler: Handler,
}

impl Hook {
    /// Pairs a condition with a handler.
    pub fn new(condition: Condition, handler: impl Into<Handler>) -> Self {
        Self {
            condition,
            handler: handler.into(),
        }
    }

    /// The condition under which this hook runs.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

/// Runs every matching hook in order and stops at the first failure.
pub(crate) fn dispatch(hooks: &[Hook], response: &Response) -> Result<(), ResponseError> {
    for (index, hook) in hooks.iter().enumerate() {
        if !hook.condition.matches(response) {
            continue;
        }
        tracing::trace!(
            hook = index,
            condition = ?hook.condition,
            status = response.status().as_u16(),
            "Running response hook"
        );
        if let Err(err) = hook.handler.call(response) {
            return Err(into_response_error(response, err));
        }
    }
    Ok(())
}

fn into_response_error(response: &Response, err: BoxError) -> ResponseError {
    if err.is::<StatusFailure>() {
        ResponseError::status_error(response.clone())
    } else {
        ResponseError::wrap(response.clone(), err)
    }
}

/// Marks the bare status failure raised by [`as_error`].
#[derive(Debug, thiserror::Error)]
#[error("response status is a failure")]
struct StatusFailure;

/// Stores `value` into a caller-held destination.
pub(crate) fn store<T>(dest: &Mutex<T>, value: T) -> Result<(), BoxError> {
    let mut guard = dest
        .lock()
        .map_err(|_| "response destination lock poisoned")?;
    *guard = value;
    Ok(())
}

/// Fails with a bare status [`ResponseError`] for whatever response it sees.
///
/// Register it with [`when_failure`](crate::when_failure) to turn failure
/// statuses into errors; without it, failure responses are ignored.
pub fn as_error() -> Handler {
    Handler::new(|_: &Response| Err(Box::new(StatusFailure) as BoxError))
}

/// Decodes a JSON error body as `E` and fails the hook with it.
///
/// The decoded value becomes the inner error of the returned
/// [`ResponseError`]. If the body is not a valid `E`, the decode error is
/// the inner error instead.
pub fn as_json_error<E>() -> Handler
where
    E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    Handler::new(|response: &Response| {
        let err: E = response.json()?;
        Err(Box::new(err) as BoxError)
    })
}

/// Copies the raw response body into `dest`.
pub fn as_bytes(dest: Arc<Mutex<Bytes>>) -> Handler {
    Handler::new(move |response: &Response| store(&*dest, response.body().clone()))
}
