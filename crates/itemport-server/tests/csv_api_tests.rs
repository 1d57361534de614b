//! Integration tests for the CSV upload and download endpoints
//!
//! These tests verify:
//! - Status codes and messages of the upload endpoint
//! - The import report carried in upload responses
//! - The CSV export attachment

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::{header, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use itemport_ingest::{ConflictPolicy, Item, MemoryItemSink, PersistenceSink};

mod common;

use common::{app_with_store, body_bytes, body_json, csv_upload, get, memory_app, upload_request, UnavailableSink};

#[tokio::test]
async fn test_upload_well_formed_file() {
    let (app, store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(csv_upload("id,item_name\n1,Pen\n2,Notebook\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Uploaded the file successfully: items.csv");
    assert_eq!(body["report"]["importedCount"], 2);
    assert_eq!(body["report"]["skippedCount"], 0);
    assert_eq!(
        store.find_all().await.unwrap(),
        vec![Item::new(1, "Pen"), Item::new(2, "Notebook")]
    );
}

#[tokio::test]
async fn test_upload_reports_skipped_rows() {
    let (app, store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(csv_upload("id,item_name\n1,Pen\n2,Notebook\nX,Eraser\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["report"],
        json!({
            "importedCount": 2,
            "skippedCount": 1,
            "skipped": [{ "rowIndex": 3, "reason": "invalid integer at column id" }]
        })
    );
    assert_eq!(store.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_wrong_media_type_is_bad_request() {
    let (app, store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(upload_request(
            "file",
            "items.xlsx",
            Some("application/vnd.ms-excel"),
            "id,item_name\n1,Pen\n",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Please upload a csv file!");
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_declared_type_is_bad_request() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(upload_request("file", "items.csv", None, "id,item_name\n1,Pen\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_field_is_bad_request() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(upload_request("attachment", "items.csv", Some("text/csv"), "id,item_name\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Please upload a csv file!");
}

#[tokio::test]
async fn test_upload_with_missing_column_is_expectation_failed() {
    let (app, store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(csv_upload("id,name\n1,Pen\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Could not upload the file: items.csv!");
    assert!(body["detail"].as_str().unwrap().contains("item_name"));
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_with_unterminated_quote_is_expectation_failed() {
    let (app, store) = memory_app(ConflictPolicy::Replace);

    let response = app
        .oneshot(csv_upload("id,item_name\n\"1\",\"unterminated\n2,Ink\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "Input could not be read at row 1: unterminated quoted field"
    );
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_colliding_keys_under_reject_policy() {
    let store = Arc::new(MemoryItemSink::with_items(
        ConflictPolicy::Reject,
        [Item::new(1, "Pen")],
    ));
    let app = app_with_store(store.clone());

    let response = app
        .oneshot(csv_upload("id,item_name\n1,Pen again\n2,Ink\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Duplicate primary key(s): 1");
    assert_eq!(store.find_all().await.unwrap(), vec![Item::new(1, "Pen")]);
}

#[tokio::test]
async fn test_upload_with_store_down_is_expectation_failed() {
    let app = app_with_store(Arc::new(UnavailableSink));

    let response = app
        .oneshot(csv_upload("id,item_name\n1,Pen\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
}

#[tokio::test]
async fn test_download_exports_items_as_attachment() {
    let store = Arc::new(MemoryItemSink::with_items(
        ConflictPolicy::Replace,
        [Item::new(1, "Pen"), Item::new(2, "Pens, blue")],
    ));
    let app = app_with_store(store);

    let response = app.oneshot(get("/api/csv/download")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=items.csv"
    );
    assert_eq!(
        body_bytes(response).await,
        b"id,item_name\n1,Pen\n2,\"Pens, blue\"\n".to_vec()
    );
}

#[tokio::test]
async fn test_download_with_store_down_is_internal_error() {
    let app = app_with_store(Arc::new(UnavailableSink));

    let response = app.oneshot(get("/api/csv/download")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_uploaded_file_downloads_unchanged() {
    let (app, _store) = memory_app(ConflictPolicy::Replace);
    let file = "id,item_name\n1,Pen\n2,\"Note\nbook\"\n";

    let response = app.clone().oneshot(csv_upload(file)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/csv/download")).await.unwrap();
    assert_eq!(body_bytes(response).await, file.as_bytes().to_vec());
}
