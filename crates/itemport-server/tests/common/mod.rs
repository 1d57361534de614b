//! Shared helpers for router-level tests
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;

use itemport_ingest::{ConflictPolicy, Item, ItemDraft, MemoryItemSink, PersistenceSink, SinkError};
use itemport_server::{api, config::Config, features::FeatureState};

pub const BOUNDARY: &str = "itemport-test-boundary";

/// Router over a fresh in-memory store, returned together with the store
pub fn memory_app(policy: ConflictPolicy) -> (Router, Arc<MemoryItemSink>) {
    let store = Arc::new(MemoryItemSink::new(policy));
    (app_with_store(store.clone()), store)
}

pub fn app_with_store(store: Arc<dyn PersistenceSink<Record = Item, Draft = ItemDraft>>) -> Router {
    let mut config = Config::default();
    config.store = itemport_server::config::StoreBackend::Memory;
    let state = FeatureState::new(store, &config.import);
    api::create_router(state, &config)
}

/// Store whose every call fails as if the database were down
pub struct UnavailableSink;

#[async_trait]
impl PersistenceSink for UnavailableSink {
    type Record = Item;
    type Draft = ItemDraft;

    fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy::Replace
    }

    async fn save_all(&self, _records: Vec<Item>) -> Result<Vec<Item>, SinkError> {
        Err(SinkError::Unavailable("connection refused".to_string()))
    }

    async fn find_all(&self) -> Result<Vec<Item>, SinkError> {
        Err(SinkError::Unavailable("connection refused".to_string()))
    }

    async fn save(&self, _draft: ItemDraft) -> Result<Item, SinkError> {
        Err(SinkError::Unavailable("connection refused".to_string()))
    }
}

/// `multipart/form-data` upload with one field
pub fn upload_request(
    field: &str,
    filename: &str,
    content_type: Option<&str>,
    body: &str,
) -> Request<Body> {
    let mut payload = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
    );
    if let Some(content_type) = content_type {
        payload.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    payload.push_str("\r\n");
    payload.push_str(body);
    payload.push_str(&format!("\r\n--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/csv/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(payload))
        .unwrap()
}

pub fn csv_upload(body: &str) -> Request<Body> {
    upload_request("file", "items.csv", Some("text/csv"), body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
