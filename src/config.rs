//! The per-request configuration that options write into.
//!
//! A fresh [`Config`] is built for every call by applying the client's base
//! options followed by the call-site options. It is then read once to
//! assemble the `reqwest::Request`, compose the transport chain and route
//! the response through the registered hooks, and dropped afterwards.

use crate::error::BoxError;
use crate::hook::Hook;
use crate::transport::{self, Layer, Transport};
use crate::{Error, Result};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Credentials attached to the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication.
    Basic {
        /// The user name.
        username: String,
        /// The password, if any.
        password: Option<String>,
    },
    /// A bearer token.
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

type ProducerFn = dyn Fn() -> std::result::Result<Bytes, BoxError> + Send + Sync;

/// Produces the outgoing payload and its content type.
///
/// The producer runs once per request, right before the request is
/// assembled.
#[derive(Clone)]
pub struct Body {
    content_type: Option<HeaderValue>,
    producer: Arc<ProducerFn>,
}

impl Body {
    /// Creates a body from a content type and a producer.
    pub fn new<F>(content_type: Option<HeaderValue>, producer: F) -> Self
    where
        F: Fn() -> std::result::Result<Bytes, BoxError> + Send + Sync + 'static,
    {
        Self {
            content_type,
            producer: Arc::new(producer),
        }
    }

    /// The content type sent along with the payload.
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    /// Runs the producer.
    pub fn produce(&self) -> std::result::Result<Bytes, BoxError> {
        (self.producer)()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// The mutable aggregate populated by options.
///
/// Scalar settings (base URL, credentials, body, timeout, HTTP client,
/// transport, cancellation token) keep the last value written. Headers and
/// query parameters accumulate by distinct key, with a later value for the
/// same key replacing the earlier one. Transport layers and hooks only ever
/// accumulate.
#[derive(Clone)]
pub struct Config {
    base_url: Option<Url>,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    credentials: Option<Credentials>,
    body: Option<Body>,
    timeout: Option<Duration>,
    http_client: reqwest::Client,
    transport: Option<Arc<dyn Transport>>,
    layers: Vec<Layer>,
    hooks: Vec<Hook>,
    cancel: Option<CancellationToken>,
}

impl Config {
    /// Creates an empty configuration sending through `http_client`.
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            base_url: None,
            headers: HeaderMap::new(),
            query: Vec::new(),
            credentials: None,
            body: None,
            timeout: None,
            http_client,
            transport: None,
            layers: Vec::new(),
            hooks: Vec::new(),
            cancel: None,
        }
    }

    /// Sets the URL relative targets are resolved against.
    pub fn set_base_url(&mut self, url: Url) {
        self.base_url = Some(url);
    }

    /// Sets a header, replacing any earlier value for the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Adds a query parameter.
    ///
    /// Keys are compared ignoring ASCII case; a later pair for an existing
    /// key replaces it in place.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        set_pair(&mut self.query, key, value);
    }

    /// Sets the credentials, replacing earlier ones.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Sets the body producer, replacing an earlier one.
    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    /// Bounds the whole exchange, including reading the body.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Replaces the client used by the innermost transport.
    ///
    /// This replaces the whole chain: a transport override and every layer
    /// registered so far are dropped. Later layers wrap the new client.
    pub fn set_http_client(&mut self, client: reqwest::Client) {
        self.http_client = client;
        self.transport = None;
        self.layers.clear();
    }

    /// Replaces the whole chain with `transport`.
    ///
    /// Layers registered so far are dropped; later ones wrap `transport`.
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
        self.layers.clear();
    }

    /// Aborts the exchange when `token` is cancelled.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    /// Appends a response hook.
    pub fn push_hook(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    pub(crate) fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// The configured base URL.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The headers set so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The query parameters set so far, in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The active credentials.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The active body producer.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The registered hooks, in registration order.
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// The number of registered transport layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub(crate) fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Resolves `target` against the base URL and merges in the query.
    ///
    /// A configured pair replaces a pair of the same key already present
    /// in `target`, following the same rule as [`set_query`](Self::set_query).
    pub fn resolve_url(&self, target: &str) -> Result<Url> {
        let mut url = match &self.base_url {
            Some(base) => base.join(target)?,
            None => Url::parse(target)?,
        };
        if !self.query.is_empty() {
            let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
            for (key, value) in &self.query {
                set_pair(&mut pairs, key.clone(), value.clone());
            }
            url.query_pairs_mut().clear().extend_pairs(&pairs);
        }
        Ok(url)
    }

    /// Assembles the outgoing request.
    pub(crate) fn build_request(&self, method: Method, target: &str) -> Result<reqwest::Request> {
        let url = self.resolve_url(target)?;
        let mut request = self.http_client.request(method, url);

        if let Some(body) = &self.body {
            let payload = body.produce().map_err(Error::EncodeFailed)?;
            if let Some(content_type) = body.content_type() {
                request = request.header(CONTENT_TYPE, content_type.clone());
            }
            request = request.body(payload);
        }

        let mut headers = self.headers.clone();
        if self.credentials.is_some() {
            headers.remove(AUTHORIZATION);
        }
        request = request.headers(headers);

        request = match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, password.as_ref())
            }
            Some(Credentials::Bearer(token)) => request.bearer_auth(token),
            None => request,
        };

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build request: {}", e))
        })
    }

    /// Composes the transport chain for this request.
    pub(crate) fn transport_chain(&self) -> Arc<dyn Transport> {
        let raw: Arc<dyn Transport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(self.http_client.clone()),
        };
        transport::compose(raw, &self.layers)
    }
}

/// Replaces the pair whose key matches ignoring ASCII case, or appends.
fn set_pair(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
    {
        Some(pair) => *pair = (key, value),
        None => pairs.push((key, value)),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("credentials", &self.credentials)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("custom_transport", &self.transport.is_some())
            .field("layers", &self.layers.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}
