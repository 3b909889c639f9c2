//! Shared setup for the HTTP integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use film_server::{api, config::Config};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

pub const ALPHA_ID: &str = "00000000-0000-0000-0000-000000000001";
pub const MISSING_ID: &str = "00000000-0000-0000-0000-000000000999";

pub fn setup_test_app(seed: bool) -> (Router, api::AppState) {
    let state = api::AppState::in_memory(seed);
    let app = api::create_router(state.clone(), &Config::default());
    (app, state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        bytes,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// `PUT /api/v1/films/:id`, with `If-Match` when `version` is given.
pub fn update_request(id: &str, version: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/films/{}", id))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(version) = version {
        builder = builder.header(header::IF_MATCH, version);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Body of scenario A
pub fn alpha() -> Value {
    serde_json::json!({
        "title": "Alpha",
        "price": 11.1,
        "studio": "DISNEY",
        "genre": "DOKUMENTATION",
        "description": "desc-A"
    })
}
