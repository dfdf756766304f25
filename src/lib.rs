//! # Hookwire - composable requests with outcome-routed response hooks
//!
//! Hookwire is a thin layer over `reqwest`. A request is assembled from
//! [`RequestOption`] values, sent through an optional chain of transport
//! middleware, and the buffered response is routed through hooks registered
//! for success, failure or an exact status code. Call sites never branch on
//! status codes themselves.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hookwire::{as_error, as_json, json, query, when_failure, when_success};
//! use serde::{Deserialize, Serialize};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default, Deserialize)]
//! struct Echo {
//!     message: String,
//! }
//!
//! #[derive(Serialize)]
//! struct NewPost {
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hookwire::Error> {
//!     let echo = Arc::new(Mutex::new(Echo::default()));
//!     hookwire::get(
//!         "https://api.example.com/echo",
//!         [
//!             query("message", "It, Works!"),
//!             when_success(as_json(echo.clone())),
//!             when_failure(as_error()),
//!         ],
//!     )
//!     .await?;
//!     println!("echo: {}", echo.lock().unwrap().message);
//!
//!     hookwire::post(
//!         "https://api.example.com/posts",
//!         [
//!             json(NewPost { title: "hello".to_string() }),
//!             when_failure(as_error()),
//!         ],
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Hooks
//!
//! Every hook whose condition matches runs, in registration order. A
//! status-specific hook and a general failure hook can both fire for the
//! same response; the first hook that fails stops the dispatch. Failure
//! responses are ignored unless a hook turns them into an error:
//!
//! ```no_run
//! use hookwire::{as_error, as_json_error, when_failure, when_status, Error};
//! use http::StatusCode;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, thiserror::Error)]
//! #[error("{message}")]
//! struct ApiError {
//!     message: String,
//! }
//!
//! # async fn example() {
//! let result = hookwire::get(
//!     "https://api.example.com/error",
//!     [
//!         when_status(as_json_error::<ApiError>(), StatusCode::BAD_REQUEST),
//!         when_failure(as_error()),
//!     ],
//! )
//! .await;
//!
//! if let Err(Error::Response(err)) = result {
//!     if let Some(api) = err.inner().and_then(|e| e.downcast_ref::<ApiError>()) {
//!         eprintln!("API rejected the call: {}", api.message);
//!     }
//! }
//! # }
//! ```
//!
//! ## Transport middleware
//!
//! ```no_run
//! use hookwire::{transport_func, Client, Next};
//!
//! # fn example() -> hookwire::Result<()> {
//! let client = Client::new([transport_func(|req: reqwest::Request, next: Next| async move {
//!     tracing::info!(url = %req.url(), "outgoing");
//!     next.round_trip(req).await
//! })])?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod hook;
pub mod json;
mod option;
mod response;
pub mod transport;

pub use async_trait::async_trait;
pub use client::{default_client, delete, get, patch, post, put, set_default_client, Client};
pub use config::{Body, Config, Credentials};
pub use error::{BoxError, Cancelled, Error, ResponseError, Result, TimedOut};
pub use hook::{as_bytes, as_error, as_json_error, Condition, Handler, Hook};
pub use json::{as_json, json};
pub use option::{
    base_url, basic_auth, bearer, body, cancel_on, header, http_client, option_fn, query,
    timeout, transport, transport_from, transport_func, user_agent, when, when_failure,
    when_status, when_success, RequestOption,
};
pub use response::Response;
pub use transport::{Middleware, Next, Transport};
