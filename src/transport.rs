//! Pluggable transports and the layer chain wrapped around them.
//!
//! A [`Transport`] performs one HTTP exchange. The innermost transport is the
//! configured `reqwest::Client` unless a full replacement was installed with
//! [`transport`](crate::transport()). Layers registered with
//! [`transport_from`](crate::transport_from) and
//! [`transport_func`](crate::transport_func) are folded over it in
//! registration order: the first layer sits closest to the raw transport and
//! the last one is outermost, seeing the request first and the response last.

use crate::error::BoxError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Performs a single HTTP exchange.
///
/// # Examples
///
/// ```
/// use hookwire::{async_trait, BoxError, Transport};
///
/// struct Recorder {
///     inner: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl Transport for Recorder {
///     async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
///         println!("{} {}", request.method(), request.url());
///         Ok(self.inner.execute(request).await?)
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends the request and returns the response head.
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        (**self).round_trip(request).await
    }
}

/// The transport beneath a middleware.
pub type Next = Arc<dyn Transport>;

/// Intercepts a request on its way to the next transport.
///
/// Implemented for any closure `Fn(reqwest::Request, Next) -> impl Future`,
/// so most middleware is written inline:
///
/// ```
/// use hookwire::{transport_func, Next};
///
/// let auth = transport_func(|mut req: reqwest::Request, next: Next| async move {
///     req.headers_mut()
///         .insert("x-api-key", http::HeaderValue::from_static("secret"));
///     next.round_trip(req).await
/// });
/// ```
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handles the request, usually by forwarding it to `next`.
    async fn handle(
        &self,
        request: reqwest::Request,
        next: Next,
    ) -> Result<reqwest::Response, BoxError>;
}

#[async_trait]
impl<F, Fut> Middleware for F
where
    F: Fn(reqwest::Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<reqwest::Response, BoxError>> + Send + 'static,
{
    async fn handle(
        &self,
        request: reqwest::Request,
        next: Next,
    ) -> Result<reqwest::Response, BoxError> {
        (self)(request, next).await
    }
}

type WrapFn = dyn Fn(Arc<dyn Transport>) -> Arc<dyn Transport> + Send + Sync;

/// One registered step of the transport chain.
#[derive(Clone)]
pub(crate) enum Layer {
    /// Builds a new transport from the one stacked beneath it.
    From(Arc<WrapFn>),
    /// Runs a middleware in front of the transport stacked beneath it.
    Middleware(Arc<dyn Middleware>),
}

impl Layer {
    fn wrap(&self, inner: Arc<dyn Transport>) -> Arc<dyn Transport> {
        match self {
            Layer::From(f) => f(inner),
            Layer::Middleware(middleware) => Arc::new(MiddlewareTransport {
                middleware: Arc::clone(middleware),
                next: inner,
            }),
        }
    }
}

struct MiddlewareTransport {
    middleware: Arc<dyn Middleware>,
    next: Next,
}

#[async_trait]
impl Transport for MiddlewareTransport {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        self.middleware
            .handle(request, Arc::clone(&self.next))
            .await
    }
}

/// Folds `layers` over `raw`; the last layer ends up outermost.
pub(crate) fn compose(raw: Arc<dyn Transport>, layers: &[Layer]) -> Arc<dyn Transport> {
    layers.iter().fold(raw, |inner, layer| layer.wrap(inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::sync::Mutex;
    use url::Url;

    type Trail = Arc<Mutex<Vec<String>>>;

    struct Raw {
        trail: Trail,
    }

    #[async_trait]
    impl Transport for Raw {
        async fn round_trip(
            &self,
            _request: reqwest::Request,
        ) -> Result<reqwest::Response, BoxError> {
            self.trail.lock().unwrap().push("raw".to_string());
            Ok(http::Response::new("ok").into())
        }
    }

    fn named(name: &'static str, trail: Trail) -> Layer {
        Layer::Middleware(Arc::new(move |req: reqwest::Request, next: Next| {
            let trail = trail.clone();
            async move {
                trail.lock().unwrap().push(format!("{} in", name));
                let resp = next.round_trip(req).await;
                trail.lock().unwrap().push(format!("{} out", name));
                resp
            }
        }))
    }

    fn request() -> reqwest::Request {
        reqwest::Request::new(Method::GET, Url::parse("http://localhost/").unwrap())
    }

    #[tokio::test]
    async fn test_last_layer_is_outermost() {
        let trail: Trail = Arc::default();
        let raw: Arc<dyn Transport> = Arc::new(Raw {
            trail: trail.clone(),
        });

        let chain = compose(
            raw,
            &[named("first", trail.clone()), named("second", trail.clone())],
        );
        chain.round_trip(request()).await.unwrap();

        assert_eq!(
            *trail.lock().unwrap(),
            vec!["second in", "first in", "raw", "first out", "second out"]
        );
    }

    #[tokio::test]
    async fn test_from_layer_receives_stack_beneath_it() {
        let trail: Trail = Arc::default();
        let raw: Arc<dyn Transport> = Arc::new(Raw {
            trail: trail.clone(),
        });

        let seen = trail.clone();
        let from = Layer::From(Arc::new(move |beneath: Arc<dyn Transport>| {
            seen.lock().unwrap().push("built".to_string());
            beneath
        }));

        let chain = compose(raw, &[named("inner", trail.clone()), from]);
        chain.round_trip(request()).await.unwrap();

        assert_eq!(
            *trail.lock().unwrap(),
            vec!["built", "inner in", "raw", "inner out"]
        );
    }

    #[tokio::test]
    async fn test_no_layers_uses_raw() {
        let trail: Trail = Arc::default();
        let raw: Arc<dyn Transport> = Arc::new(Raw {
            trail: trail.clone(),
        });

        let resp = compose(raw, &[]).round_trip(request()).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(*trail.lock().unwrap(), vec!["raw"]);
    }
}
