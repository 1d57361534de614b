//! Feature modules implementing the itemport API
//!
//! Each feature is a vertical slice with its own commands, queries and routes.
//!
//! # Features
//!
//! - **csv**: bulk import of uploaded CSV files and CSV export of every item
//! - **items**: list and create items
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Handlers call the command or query `handle` function directly with the
//! store taken from [`FeatureState`].

pub mod csv;
pub mod items;

use axum::Router;
use itemport_ingest::{
    FormatValidator, ImportPipeline, Item, ItemDraft, PersistenceSink, Record, RowParser,
};
use std::sync::Arc;

use crate::config::ImportSettings;

/// The item store as seen by the HTTP layer
pub type ItemSink = dyn PersistenceSink<Record = Item, Draft = ItemDraft>;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Item store backing both the REST endpoints and CSV imports
    pub items: Arc<ItemSink>,
    /// CSV import pipeline writing into `items`
    pub importer: ImportPipeline<ItemSink>,
}

impl FeatureState {
    pub fn new(items: Arc<ItemSink>, settings: &ImportSettings) -> Self {
        let importer = ImportPipeline::new(
            FormatValidator::new(settings.expected_media_type.clone()),
            RowParser::new().with_delimiter(settings.delimiter_byte()),
            Arc::new(Item::schema().clone()),
            Arc::clone(&items),
        )
        .with_config(settings.pipeline_config());

        Self { items, importer }
    }
}

/// Creates the API router with all feature routes mounted
///
/// - `/csv/upload`, `/csv/download` - CSV import and export
/// - `/items` - Item listing and creation
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(csv::csv_routes())
        .merge(items::items_routes())
        .with_state(state)
}
