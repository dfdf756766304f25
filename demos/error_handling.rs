//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Turn failure statuses into errors
//! - Inspect the response carried by an error
//! - Tell decode failures apart from status failures
//! - Recognize transport failures and timeouts
//!
//! Run with: `cargo run --example error_handling`

use hookwire::{
    as_error, as_json, base_url, timeout, when_failure, when_success, Client, Error,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("hookwire=info")
        .init();

    let client = Client::new([
        base_url("https://jsonplaceholder.typicode.com"),
        when_failure(as_error()),
    ])?;

    println!("=== Example 1: Handling HTTP Errors ===");
    let post = Arc::new(Mutex::new(Post::default()));
    match client
        .get("/posts/999999", [when_success(as_json(post.clone()))])
        .await
    {
        Ok(()) => println!("Success: {:?}", post.lock().unwrap()),
        Err(Error::Response(err)) => {
            if let Some(resp) = err.response() {
                println!("HTTP Error!");
                println!("  Status: {}", resp.status());
                println!("  Is client error (4xx): {}", resp.status().is_client_error());
                println!("  Raw response: {}", resp.text());
                println!("  Content-Type: {:?}", resp.header("content-type"));
            }
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Handling Decode Errors ===");
    #[derive(Debug, Default, Deserialize)]
    #[allow(dead_code)]
    struct WrongSchema {
        nonexistent_field: String,
    }

    let wrong = Arc::new(Mutex::new(WrongSchema::default()));
    match client
        .get("/posts/1", [when_success(as_json(wrong.clone()))])
        .await
    {
        Ok(()) => println!("Unexpected success"),
        Err(Error::Response(err)) => {
            println!("Decode failed with status {:?}", err.status());
            if let Some(inner) = err.inner() {
                println!("  Cause: {}", inner);
            }
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 3: Handling Timeouts ===");
    match client
        .get("/posts", [timeout(Duration::from_millis(1))])
        .await
    {
        Ok(()) => println!("Finished before the deadline"),
        Err(Error::Response(err)) if err.is_transport() => {
            println!("Transport failure: {}", err);
            println!("  Timed out: {}", err.is_timeout());
        }
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}
