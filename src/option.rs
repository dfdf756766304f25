//! Request options and their constructors.
//!
//! A [`RequestOption`] is one unit of configuration: given a [`Config`], it
//! applies a single change and may fail. Options are applied strictly in the
//! order they are given, base options of a [`Client`](crate::Client) first.

use crate::config::{Body, Config, Credentials};
use crate::error::BoxError;
use crate::hook::{Condition, Handler, Hook};
use crate::transport::{Layer, Middleware, Transport};
use crate::{Error, Response, Result};
use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderName, HeaderValue, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

type ApplyFn = dyn Fn(&mut Config) -> Result<()> + Send + Sync;

/// A composable unit of request configuration.
///
/// Options are cheap to clone and can be stored as a client's base options
/// and replayed for every request.
#[derive(Clone)]
pub struct RequestOption(Arc<ApplyFn>);

impl RequestOption {
    /// Applies this option to `config`.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        (self.0)(config)
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestOption")
    }
}

/// Applies `options` in order, stopping at the first failure.
pub(crate) fn apply_all<'a>(
    config: &mut Config,
    options: impl IntoIterator<Item = &'a RequestOption>,
) -> Result<()> {
    for option in options {
        option.apply(config)?;
    }
    Ok(())
}

/// Builds an option from a closure.
///
/// # Examples
///
/// ```
/// use hookwire::{option_fn, Error};
///
/// let reject = option_fn(|_config| {
///     Err(Error::ConfigurationError("requests are disabled".to_string()))
/// });
/// ```
pub fn option_fn<F>(f: F) -> RequestOption
where
    F: Fn(&mut Config) -> Result<()> + Send + Sync + 'static,
{
    RequestOption(Arc::new(f))
}

/// Sets the URL relative targets are resolved against.
///
/// The URL is parsed when the option is applied; an invalid URL fails the
/// call with [`Error::InvalidUrl`] before anything is sent.
pub fn base_url(url: impl AsRef<str>) -> RequestOption {
    let url = url.as_ref().to_string();
    option_fn(move |config| {
        config.set_base_url(Url::parse(&url)?);
        Ok(())
    })
}

/// Adds a query parameter.
pub fn query(key: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let key = key.into();
    let value = value.into();
    option_fn(move |config| {
        config.set_query(key.clone(), value.clone());
        Ok(())
    })
}

/// Sets a header, replacing an earlier value for the same name.
pub fn header(name: impl AsRef<str>, value: impl AsRef<str>) -> RequestOption {
    let name = name.as_ref().to_string();
    let value = value.as_ref().to_string();
    option_fn(move |config| {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        config.set_header(name, value);
        Ok(())
    })
}

/// Sets the `User-Agent` header.
pub fn user_agent(value: impl AsRef<str>) -> RequestOption {
    header(USER_AGENT.as_str(), value)
}

/// Uses HTTP basic authentication.
pub fn basic_auth(username: impl Into<String>, password: impl Into<String>) -> RequestOption {
    let credentials = Credentials::Basic {
        username: username.into(),
        password: Some(password.into()),
    };
    option_fn(move |config| {
        config.set_credentials(credentials.clone());
        Ok(())
    })
}

/// Uses a bearer token.
pub fn bearer(token: impl Into<String>) -> RequestOption {
    let credentials = Credentials::Bearer(token.into());
    option_fn(move |config| {
        config.set_credentials(credentials.clone());
        Ok(())
    })
}

/// Bounds the whole exchange, including reading the response body.
pub fn timeout(timeout: Duration) -> RequestOption {
    option_fn(move |config| {
        config.set_timeout(timeout);
        Ok(())
    })
}

/// Replaces the `reqwest::Client` used to send requests.
///
/// Like [`transport`], this replaces the whole chain; layers registered
/// before it are dropped.
pub fn http_client(client: reqwest::Client) -> RequestOption {
    option_fn(move |config| {
        config.set_http_client(client.clone());
        Ok(())
    })
}

/// Replaces the whole transport chain.
///
/// Layers registered earlier with [`transport_from`] or [`transport_func`]
/// are dropped. Layers registered after this option wrap the replacement.
pub fn transport<T: Transport>(transport: T) -> RequestOption {
    let transport: Arc<dyn Transport> = Arc::new(transport);
    option_fn(move |config| {
        config.set_transport(Arc::clone(&transport));
        Ok(())
    })
}

/// Adds a layer built from the transport stacked beneath it.
///
/// `f` receives the raw transport with every earlier layer already applied,
/// and returns the transport that takes its place.
pub fn transport_from<F>(f: F) -> RequestOption
where
    F: Fn(Arc<dyn Transport>) -> Arc<dyn Transport> + Send + Sync + 'static,
{
    let f: Arc<dyn Fn(Arc<dyn Transport>) -> Arc<dyn Transport> + Send + Sync> = Arc::new(f);
    option_fn(move |config| {
        config.push_layer(Layer::From(Arc::clone(&f)));
        Ok(())
    })
}

/// Adds a middleware in front of the transport stacked beneath it.
///
/// The middleware registered last is outermost: it sees the request first
/// and the response last.
pub fn transport_func<M: Middleware>(middleware: M) -> RequestOption {
    let middleware: Arc<dyn Middleware> = Arc::new(middleware);
    option_fn(move |config| {
        config.push_layer(Layer::Middleware(Arc::clone(&middleware)));
        Ok(())
    })
}

/// Registers a hook for an arbitrary condition.
pub fn when<P>(predicate: P, handler: impl Into<Handler>) -> RequestOption
where
    P: Fn(&Response) -> bool + Send + Sync + 'static,
{
    hook(Condition::Custom(Arc::new(predicate)), handler.into())
}

/// Registers a hook for 2xx and 3xx responses.
pub fn when_success(handler: impl Into<Handler>) -> RequestOption {
    hook(Condition::Success, handler.into())
}

/// Registers a hook for every response that is not a success.
pub fn when_failure(handler: impl Into<Handler>) -> RequestOption {
    hook(Condition::Failure, handler.into())
}

/// Registers a hook for one exact status code.
pub fn when_status(handler: impl Into<Handler>, status: StatusCode) -> RequestOption {
    hook(Condition::Status(status), handler.into())
}

fn hook(condition: Condition, handler: Handler) -> RequestOption {
    let hook = Hook::new(condition, handler);
    option_fn(move |config| {
        config.push_hook(hook.clone());
        Ok(())
    })
}

/// Sets the request body.
///
/// `producer` runs once per request when the request is assembled. A
/// failure aborts the call with [`Error::EncodeFailed`].
pub fn body<F>(content_type: impl AsRef<str>, producer: F) -> RequestOption
where
    F: Fn() -> std::result::Result<Bytes, BoxError> + Send + Sync + 'static,
{
    let content_type = content_type.as_ref().to_string();
    let producer = Arc::new(producer);
    option_fn(move |config| {
        let content_type = HeaderValue::try_from(content_type.as_str())
            .map_err(|e| Error::ConfigurationError(format!("Invalid content type: {}", e)))?;
        let producer = Arc::clone(&producer);
        config.set_body(Body::new(Some(content_type), move || producer()));
        Ok(())
    })
}

/// Aborts the exchange when `token` is cancelled.
///
/// A cancelled exchange fails with a transport-level
/// [`ResponseError`](crate::ResponseError) whose cause is
/// [`Cancelled`](crate::Cancelled).
pub fn cancel_on(token: CancellationToken) -> RequestOption {
    option_fn(move |config| {
        config.set_cancellation(token.clone());
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::as_error;

    fn apply(options: &[RequestOption]) -> Result<Config> {
        let mut config = Config::new(reqwest::Client::new());
        apply_all(&mut config, options)?;
        Ok(config)
    }

    #[test]
    fn test_scalar_options_last_writer_wins() {
        let config = apply(&[
            base_url("http://first.local"),
            timeout(Duration::from_secs(1)),
            basic_auth("foo", "bar"),
            base_url("http://second.local"),
            timeout(Duration::from_millis(10)),
            bearer("tokentoken"),
        ])
        .unwrap();

        assert_eq!(config.base_url().unwrap().as_str(), "http://second.local/");
        assert_eq!(config.timeout(), Some(Duration::from_millis(10)));
        assert_eq!(
            config.credentials(),
            Some(&Credentials::Bearer("tokentoken".to_string()))
        );
    }

    #[test]
    fn test_multi_valued_options_accumulate() {
        let config = apply(&[
            header("Message", "foo"),
            query("count", "3"),
            when_success(as_error()),
            header("X-Trace", "1"),
            query("page", "2"),
            when_failure(as_error()),
            when_status(as_error(), StatusCode::BAD_REQUEST),
            transport_from(|t| t),
        ])
        .unwrap();

        assert_eq!(config.headers().len(), 2);
        assert_eq!(config.query().len(), 2);
        assert_eq!(config.hooks().len(), 3);
        assert_eq!(config.layer_count(), 1);
    }

    #[test]
    fn test_invalid_header_fails_application() {
        let err = apply(&[header("bad header", "x")]).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_invalid_base_url_fails_application() {
        let err = apply(&[base_url("not a url")]).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_application_stops_at_first_failure() {
        let config_err = apply(&[
            option_fn(|_| Err(Error::ConfigurationError("stop".to_string()))),
            option_fn(|_| panic!("must not be applied")),
        ])
        .unwrap_err();
        assert_eq!(config_err.to_string(), "Configuration error: stop");
    }

    #[test]
    fn test_user_agent_sets_header() {
        let config = apply(&[user_agent("hookwire-test/1.0")]).unwrap();
        assert_eq!(config.headers()[USER_AGENT], "hookwire-test/1.0");
    }
}
