//! Example demonstrating transport middleware and derived clients.
//!
//! This example shows how to:
//! - Log every exchange from a middleware closure
//! - Wrap the transport beneath with a custom `Transport`
//! - Derive a client without touching its parent
//!
//! Run with: `cargo run --example middleware`

use hookwire::{
    as_error, async_trait, base_url, header, transport_from, transport_func, when_failure,
    BoxError, Client, Next, Transport,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

struct Counting {
    inner: Arc<dyn Transport>,
    sent: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for Counting {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.inner.round_trip(request).await
    }
}

#[tokio::main]
async fn main() -> Result<(), hookwire::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("hookwire=debug,middleware=info")
        .init();

    let sent = Arc::new(AtomicUsize::new(0));
    let counter = sent.clone();

    let client = Client::new([
        base_url("https://jsonplaceholder.typicode.com"),
        transport_from(move |inner: Arc<dyn Transport>| -> Arc<dyn Transport> {
            Arc::new(Counting {
                inner,
                sent: counter.clone(),
            })
        }),
        transport_func(|req: reqwest::Request, next: Next| async move {
            let started = Instant::now();
            let method = req.method().clone();
            let url = req.url().clone();
            let resp = next.round_trip(req).await;
            match &resp {
                Ok(r) => tracing::info!(
                    %method,
                    %url,
                    status = r.status().as_u16(),
                    elapsed = ?started.elapsed(),
                    "exchange"
                ),
                Err(e) => tracing::info!(
                    %method,
                    %url,
                    error = %e,
                    "exchange failed"
                ),
            }
            resp
        }),
        when_failure(as_error()),
    ])?;

    client.get("/posts/1", []).await?;

    let tagged = client.with([header("X-Demo", "derived")]);
    tagged.get("/posts/2", []).await?;

    println!("Parent options: {}", client.options().len());
    println!("Derived options: {}", tagged.options().len());
    println!("Requests sent: {}", sent.load(Ordering::Relaxed));

    Ok(())
}
