//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create a client with a base URL
//! - Decode a JSON response on success
//! - Send a JSON body and react to a specific status code
//!
//! Run with: `cargo run --example basic_call`

use hookwire::{
    as_bytes, as_error, as_json, base_url, json, user_agent, when_failure, when_status,
    when_success, BoxError, Client, Error, Response,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("hookwire=debug,basic_call=info")
        .init();

    let client = Client::new([
        base_url("https://jsonplaceholder.typicode.com"),
        user_agent("hookwire-demo/0.1"),
        when_failure(as_error()),
    ])?;

    println!("=== GET Request Example ===");
    let post = Arc::new(Mutex::new(Post::default()));
    client
        .get("/posts/1", [when_success(as_json(post.clone()))])
        .await?;

    {
        let post = post.lock().unwrap();
        println!("Post ID: {}", post.id);
        println!("Title: {}", post.title);
        println!("Body: {}", post.body);
    }
    println!();

    println!("=== POST Request Example ===");
    let created = Arc::new(Mutex::new(Post::default()));
    let raw = Arc::new(Mutex::new(bytes::Bytes::new()));
    client
        .post(
            "/posts",
            [
                json(NewPost {
                    title: "My New Post".to_string(),
                    body: "This is the content of my new post!".to_string(),
                    user_id: 1,
                }),
                when_status(
                    |resp: &Response| -> Result<(), BoxError> {
                        println!("Created in {:?}", resp.latency());
                        Ok(())
                    },
                    StatusCode::CREATED,
                ),
                when_success(as_json(created.clone())),
                when_success(as_bytes(raw.clone())),
            ],
        )
        .await?;

    println!("Created post ID: {}", created.lock().unwrap().id);
    println!("Raw response length: {} bytes", raw.lock().unwrap().len());

    Ok(())
}
