//! Integration tests for the middleware stack
//!
//! These tests verify:
//! - CORS headers are set for configured and wildcard origins
//! - Preflight requests allow the conditional request headers
//! - Version headers are exposed to browsers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};

use film_server::{
    api,
    config::{Config, CorsConfig},
};

mod helpers;
use helpers::{send, ALPHA_ID};

fn app_with_cors(cors: CorsConfig) -> Router {
    let config = Config {
        cors,
        ..Config::default()
    };
    api::create_router(api::AppState::in_memory(true), &config)
}

#[tokio::test]
async fn test_cors_headers_with_specific_origin() {
    let app = app_with_cors(CorsConfig {
        allowed_origins: vec!["http://localhost:3000".to_string()],
        allow_credentials: true,
    });

    let request = Request::builder()
        .uri(format!("/api/v1/films/{}", ALPHA_ID))
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some("http://localhost:3000")
    );
    assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS), Some("true"));

    let exposed = response
        .header(header::ACCESS_CONTROL_EXPOSE_HEADERS)
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("etag"));
    assert!(exposed.contains("location"));
}

#[tokio::test]
async fn test_cors_preflight_allows_if_match() {
    let app = app_with_cors(CorsConfig {
        allowed_origins: vec!["http://localhost:3000".to_string()],
        allow_credentials: false,
    });

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(format!("/api/v1/films/{}", ALPHA_ID))
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "if-match")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert!(response.status.is_success());
    let methods = response.header(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap();
    assert!(methods.contains("PUT"));
    let headers = response
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_ascii_lowercase();
    assert!(headers.contains("if-match"));
}

#[tokio::test]
async fn test_cors_wildcard_origin() {
    let app = app_with_cors(CorsConfig {
        allowed_origins: vec!["*".to_string()],
        allow_credentials: true,
    });

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://anywhere.example")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
    assert!(response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
}

#[tokio::test]
async fn test_compression_when_requested() {
    let app = app_with_cors(CorsConfig {
        allowed_origins: vec![],
        allow_credentials: false,
    });

    let request = Request::builder()
        .uri("/api/v1/films")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_ENCODING), Some("gzip"));
}
