//! Test helpers for integration tests
//!
//! Starts a real server on a dynamic port and provides small request helpers
//! shared by the HTTP suites.

#![allow(dead_code)]

use person_service::{PersonServer, RequestValidator, ServerConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "person_service=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Find an available port for testing
pub async fn find_available_port() -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// A server running on a background task for the length of one test
pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: tokio::task::JoinHandle<()>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start a server with default configuration on a dynamic port
    pub async fn start() -> Self {
        Self::start_with(PersonServer::new(ServerConfig::default())).await
    }

    /// Start a server with a custom validator
    pub async fn start_with_validator(validator: RequestValidator) -> Self {
        Self::start_with(PersonServer::new(ServerConfig::default()).with_validator(validator)).await
    }

    pub async fn start_with(server: PersonServer) -> Self {
        init_test_tracing();

        let (handle, port) = server
            .start_dynamic()
            .await
            .expect("Failed to start server on dynamic port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let client = reqwest::Client::new();

        for _ in 0..10 {
            match client.get(format!("http://{addr}/health")).send().await {
                Ok(response) if response.status() == reqwest::StatusCode::OK => break,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }

        TestServer { addr, handle, client }
    }

    /// Get the HTTP URL for a path on this server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed");
        read(response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed");
        read(response).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed");
        read(response).await
    }

    /// Stop the server
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

async fn read(response: reqwest::Response) -> (reqwest::StatusCode, Value) {
    let status = response.status();
    let body = response.json().await.expect("response body is JSON");
    (status, body)
}

pub fn valid_person() -> Value {
    json!({
        "first_name": "Rocío",
        "last_name": "Pérez",
        "age": 31,
        "hair_color": "red",
        "is_married": true,
        "email": "rocio.perez@example.org",
        "payment_card_number": "5555555555554444",
        "favorite_color": "#663399"
    })
}

pub fn valid_location() -> Value {
    json!({
        "city": "Córdoba",
        "state": "Córdoba",
        "country": "Argentina"
    })
}

/// `(loc, type)` of every reported violation, with `loc` joined by dots
pub fn violations(body: &Value) -> Vec<(String, String)> {
    body["detail"]
        .as_array()
        .expect("detail is a list")
        .iter()
        .map(|v| {
            let loc = v["loc"]
                .as_array()
                .expect("loc is a list")
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(".");
            (loc, v["type"].as_str().unwrap_or_default().to_string())
        })
        .collect()
}
