//! Itemport Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP server for bulk CSV item imports.
//!
//! # Overview
//!
//! - **CSV upload**: `POST /api/csv/upload` runs the uploaded file through the
//!   import pipeline from `itemport-ingest`
//! - **CSV download**: `GET /api/csv/download` exports every item
//! - **Items**: `GET /api/items` and `POST /api/items`
//! - **Health**: `GET /health`
//!
//! Items live in PostgreSQL (via SQLx) or, for local runs and tests, in an
//! in-process store. Both implement the same `PersistenceSink` trait.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use itemport_ingest::{ConflictPolicy, MemoryItemSink};
//! use itemport_server::{api, config::Config, features::FeatureState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Arc::new(MemoryItemSink::new(ConflictPolicy::Replace));
//!     let state = FeatureState::new(store, &config.import);
//!     api::serve(config, state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, AppResult};
