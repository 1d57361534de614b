//! Integration tests for middleware
//!
//! These tests verify:
//! - CORS headers for the configured front-end origin
//! - The health endpoint behind the full middleware stack
//! - Upload size limits

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

use itemport_ingest::{ConflictPolicy, MemoryItemSink};
use itemport_server::{
    api,
    config::{Config, StoreBackend},
    features::FeatureState,
};

mod common;

use common::{body_json, csv_upload, get, memory_app};

fn app_with_config(config: &Config) -> axum::Router {
    let store = Arc::new(MemoryItemSink::new(ConflictPolicy::Replace));
    api::create_router(FeatureState::new(store, &config.import), config)
}

#[tokio::test]
async fn test_health() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_cors_preflight_from_front_end_origin() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/csv/upload")
                .header(header::ORIGIN, "http://localhost:8081")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:8081"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn test_cors_allows_only_content_headers() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/items")
                .header(header::ORIGIN, "http://localhost:8081")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let allowed = response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_lowercase();
    assert!(allowed.contains("content-type"));
    assert!(!allowed.contains("authorization"));
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let mut config = Config::default();
    config.store = StoreBackend::Memory;
    config.upload.max_bytes = 16;
    let app = app_with_config(&config);

    let mut body = String::from("id,item_name\n");
    for id in 0..20_000 {
        body.push_str(&format!("{id},item number {id}\n"));
    }

    let response = app.oneshot(csv_upload(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
