//! Buffered response handed to every hook.
//!
//! The [`Response`] type holds the status, headers and the fully read body of
//! an HTTP exchange, so any number of hooks can inspect it and the same value
//! can travel inside a [`ResponseError`](crate::ResponseError).

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

/// A received HTTP response with its body already buffered.
///
/// # Examples
///
/// ```
/// # use hookwire::Response;
/// # use bytes::Bytes;
/// # use http::{HeaderMap, StatusCode};
/// # use std::time::Duration;
/// # use url::Url;
/// let response = Response::new(
///     Url::parse("https://api.example.com/ping").unwrap(),
///     StatusCode::OK,
///     HeaderMap::new(),
///     Bytes::from_static(b"pong"),
///     Duration::from_millis(12),
/// );
///
/// assert!(response.is_success());
/// assert_eq!(response.text(), "pong");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    latency: Duration,
}

impl Response {
    /// Creates a new `Response`.
    ///
    /// This is called by the client once the body has been read, and is
    /// public so custom transports and tests can build one.
    pub fn new(
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        latency: Duration,
    ) -> Self {
        Self {
            url,
            status,
            headers,
            body,
            latency,
        }
    }

    /// Reads a `reqwest::Response` to completion.
    ///
    /// `started` is when the request was handed to the transport.
    pub(crate) async fn read(
        response: reqwest::Response,
        started: Instant,
    ) -> Result<Self, reqwest::Error> {
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::new(url, status, headers, body, started.elapsed()))
    }

    /// The final URL of the exchange.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Time from handing the request to the transport until the body was read.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns `true` for 2xx and 3xx responses.
    ///
    /// Every other status, including 1xx, is a failure.
    ///
    /// ```
    /// # use hookwire::Response;
    /// # use bytes::Bytes;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// # use url::Url;
    /// let url = Url::parse("http://localhost/").unwrap();
    /// let redirect = Response::new(url.clone(), StatusCode::FOUND, HeaderMap::new(), Bytes::new(), Duration::ZERO);
    /// let missing = Response::new(url, StatusCode::NOT_FOUND, HeaderMap::new(), Bytes::new(), Duration::ZERO);
    ///
    /// assert!(redirect.is_success());
    /// assert!(!missing.is_success());
    /// ```
    pub fn is_success(&self) -> bool {
        self.status.is_success() || self.status.is_redirection()
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;

    fn response(status: StatusCode, body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        Response::new(
            Url::parse("http://localhost/echo").unwrap(),
            status,
            headers,
            Bytes::from_static(body.as_bytes()),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_classification() {
        assert!(response(StatusCode::OK, "").is_success());
        assert!(response(StatusCode::NO_CONTENT, "").is_success());
        assert!(response(StatusCode::NOT_MODIFIED, "").is_success());
        assert!(!response(StatusCode::CONTINUE, "").is_success());
        assert!(!response(StatusCode::BAD_REQUEST, "").is_success());
        assert!(!response(StatusCode::INTERNAL_SERVER_ERROR, "").is_success());
    }

    #[test]
    fn test_json_and_header() {
        #[derive(Deserialize)]
        struct Message {
            message: String,
        }

        let resp = response(StatusCode::OK, r#"{"message":"hi"}"#);
        let msg: Message = resp.json().unwrap();
        assert_eq!(msg.message, "hi");
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
        assert_eq!(resp.header("x-missing"), None);
    }
}
