//! Integration tests for film attachments

use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
};
use film_server::storage::{BlobStore, InMemoryBlobStore};
use std::sync::Arc;
use uuid::Uuid;

mod helpers;
use helpers::{get, send, setup_test_app, ALPHA_ID, MISSING_ID};

fn upload(id: &str, content_type: &str, body: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/films/{}/file", id))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_then_download() {
    let (app, state) = setup_test_app(true);

    let response = send(&app, upload(ALPHA_ID, "image/png", b"\x89PNG fake image")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, get(&format!("/api/v1/films/{}/file", ALPHA_ID))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), Some("image/png"));
    assert_eq!(response.bytes, b"\x89PNG fake image");

    let stored = state.blobs.list(Uuid::parse_str(ALPHA_ID).unwrap()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].checksum.as_deref(),
        Some(film_common::checksum::sha256_hex(b"\x89PNG fake image").as_str())
    );
}

#[tokio::test]
async fn test_upload_replaces_previous_file() {
    let (app, state) = setup_test_app(true);

    send(&app, upload(ALPHA_ID, "text/plain", b"first")).await;
    let response = send(&app, upload(ALPHA_ID, "text/plain", b"second")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let stored = state.blobs.list(Uuid::parse_str(ALPHA_ID).unwrap()).await.unwrap();
    assert_eq!(stored.len(), 1);

    let response = send(&app, get(&format!("/api/v1/films/{}/file", ALPHA_ID))).await;
    assert_eq!(response.bytes, b"second");
}

#[tokio::test]
async fn test_upload_for_unknown_film() {
    let (app, state) = setup_test_app(true);

    for id in [MISSING_ID, "not-a-uuid"] {
        let response = send(&app, upload(id, "text/plain", b"data")).await;
        assert_eq!(response.status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(response.json()["error"]["code"], "NOT_FOUND");
    }

    let missing = Uuid::parse_str(MISSING_ID).unwrap();
    assert!(state.blobs.list(missing).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_empty_body() {
    let (app, _) = setup_test_app(true);

    let response = send(&app, upload(ALPHA_ID, "text/plain", b"")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_without_file() {
    let (app, _) = setup_test_app(true);

    let response = send(&app, get(&format!("/api/v1/films/{}/file", ALPHA_ID))).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["success"], false);
}

#[tokio::test]
async fn test_download_for_unknown_film() {
    let (app, _) = setup_test_app(true);

    let response = send(&app, get(&format!("/api/v1/films/{}/file", MISSING_ID))).await;

    assert_eq!(response.status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_download_with_several_files_is_internal_error() {
    let (_, seeded) = setup_test_app(true);
    let blobs = Arc::new(InMemoryBlobStore::new());
    let alpha = Uuid::parse_str(ALPHA_ID).unwrap();
    blobs.save(alpha, Bytes::from_static(b"one"), None).await.unwrap();
    blobs.save(alpha, Bytes::from_static(b"two"), None).await.unwrap();

    let state = film_server::api::AppState {
        films: seeded.films,
        blobs,
    };
    let app = film_server::api::create_router(state, &film_server::config::Config::default());

    let response = send(&app, get(&format!("/api/v1/films/{}/file", ALPHA_ID))).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"]["code"], "MULTIPLE_FILES");
}
