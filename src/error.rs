//! Error types for option application, transport failures and hook failures.
//!
//! Anything that goes wrong before a request reaches the transport is reported
//! as a plain [`Error`] variant. Everything that happens once the transport has
//! been invoked is reported as [`Error::Response`], carrying a [`ResponseError`]
//! with the received [`Response`] attached when there is one.

use crate::Response;
use http::StatusCode;
use std::fmt;
use std::time::Duration;

/// A boxed, thread-safe error used for hook, transport and encoder failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type returned by every verb.
///
/// # Examples
///
/// ```no_run
/// use hookwire::{as_error, when_failure, Error};
///
/// # async fn example() {
/// match hookwire::get("https://api.example.com/users/1", [when_failure(as_error())]).await {
///     Ok(()) => println!("ok"),
///     Err(Error::Response(err)) if err.is_transport() => {
///         eprintln!("transport failed: {}", err);
///     }
///     Err(Error::Response(err)) => {
///         eprintln!("server answered {:?}", err.status());
///     }
///     Err(e) => eprintln!("request was never sent: {}", e),
/// }
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An option could not be applied.
    ///
    /// No request was sent. Custom options built with
    /// [`option_fn`](crate::option_fn) usually report their failures here.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The target or base URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The body producer failed to build the outgoing payload.
    ///
    /// No request was sent.
    #[error("Failed to encode request body: {0}")]
    EncodeFailed(#[source] BoxError),

    /// The exchange failed in the transport or in a response hook.
    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl Error {
    /// Returns the [`ResponseError`] if the request reached the transport.
    pub fn as_response_error(&self) -> Option<&ResponseError> {
        match self {
            Error::Response(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code of the received response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.as_response_error()?.status()
    }
}

/// The error produced once a request has been handed to the transport.
///
/// There are three shapes:
///
/// * transport failure: no response, no inner error. The transport's own
///   error is kept as [`transport_error`](Self::transport_error);
/// * bare status failure (see [`as_error`](crate::as_error)): response
///   present, no inner error;
/// * hook failure: response present, [`inner`](Self::inner) holds the error
///   the hook returned (a decode error, a decoded error body, ...).
pub struct ResponseError {
    response: Option<Response>,
    cause: Option<BoxError>,
}

impl ResponseError {
    /// Creates an error for a transport failure where no response exists.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self {
            response: None,
            cause: Some(err.into()),
        }
    }

    /// Creates a bare status error for the given response.
    pub fn status_error(response: Response) -> Self {
        Self {
            response: Some(response),
            cause: None,
        }
    }

    /// Creates an error for the given response wrapping a hook's error.
    pub fn wrap(response: Response, inner: impl Into<BoxError>) -> Self {
        Self {
            response: Some(response),
            cause: Some(inner.into()),
        }
    }

    /// Returns the response that triggered this error.
    ///
    /// `None` when the transport failed before a response was received.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Returns the status code of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(Response::status)
    }

    /// Returns `true` if the transport failed before any response existed.
    pub fn is_transport(&self) -> bool {
        self.response.is_none()
    }

    /// Returns the error wrapped by this one.
    ///
    /// `None` means this error is the root cause: either a bare status
    /// failure or a transport failure.
    pub fn inner(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self.response {
            Some(_) => self.cause.as_deref(),
            None => None,
        }
    }

    /// Consumes the error and returns the wrapped inner error, if any.
    pub fn into_inner(self) -> Option<BoxError> {
        match self.response {
            Some(_) => self.cause,
            None => None,
        }
    }

    /// Returns the transport's error when no response was received.
    pub fn transport_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self.response {
            Some(_) => None,
            None => self.cause.as_deref(),
        }
    }

    /// Returns `true` if the transport failure was caused by [`TimedOut`].
    pub fn is_timeout(&self) -> bool {
        let Some(err) = self.transport_error() else {
            return false;
        };
        if err.is::<TimedOut>() {
            return true;
        }
        err.downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.response, &self.cause) {
            (None, Some(cause)) => write!(f, "request failed: {}", cause),
            (None, None) => f.write_str("request failed"),
            (Some(resp), None) => write!(f, "{} responded with {}", resp.url(), resp.status()),
            (Some(resp), Some(inner)) => {
                write!(f, "{} responded with {}: {}", resp.url(), resp.status(), inner)
            }
        }
    }
}

impl fmt::Debug for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseError")
            .field("status", &self.status())
            .field("url", &self.response.as_ref().map(Response::url))
            .field("cause", &self.cause)
            .finish()
    }
}

impl std::error::Error for ResponseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Returned as the transport cause when a [`timeout`](crate::timeout) elapses.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Returned as the transport cause when a [`cancel_on`](crate::cancel_on)
/// token fires before the exchange completes.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request cancelled")]
pub struct Cancelled;

/// A specialized `Result` type for hookwire calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::HeaderMap;
    use url::Url;

    fn response(status: u16) -> Response {
        Response::new(
            Url::parse("http://localhost/test").unwrap(),
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
            Duration::from_millis(1),
        )
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_status_error_has_no_inner() {
        let err = ResponseError::status_error(response(400));
        assert!(err.inner().is_none());
        assert!(!err.is_transport());
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_wrapped_error_exposes_inner() {
        let err = ResponseError::wrap(response(400), Boom);
        let inner = err.inner().expect("inner error");
        assert!(inner.is::<Boom>());
        assert_eq!(err.to_string(), "http://localhost/test responded with 400 Bad Request: boom");

        let inner = err.into_inner().unwrap();
        assert!(inner.downcast::<Boom>().is_ok());
    }

    #[test]
    fn test_transport_error_keeps_cause_outside_inner() {
        let err = ResponseError::transport(TimedOut(Duration::from_millis(10)));
        assert!(err.is_transport());
        assert!(err.inner().is_none());
        assert!(err.response().is_none());
        assert!(err.is_timeout());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_status_passthrough() {
        let err: Error = ResponseError::status_error(response(503)).into();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));

        let err = Error::ConfigurationError("bad".to_string());
        assert!(err.status().is_none());
        assert!(err.as_response_error().is_none());
    }
}
