//! Shared helpers for chatlink-axum integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use chatlink_axum::bootstrap::{ServerConfig, bootstrap};
use chatlink_axum::state::AppState;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;

/// CORS origin used by origin-restricted configurations.
pub const TEST_CORS_ORIGIN: &str = "http://localhost:3000";

/// Application state with default session timing and no listener.
pub fn test_state() -> AppState {
    state_with(ServerConfig {
        port: 0, // Not used in tests
        ..ServerConfig::with_defaults()
    })
}

pub fn state_with(config: ServerConfig) -> AppState {
    Arc::new(bootstrap(config, CancellationToken::new()).expect("valid test config"))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
