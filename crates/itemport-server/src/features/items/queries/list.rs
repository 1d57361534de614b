use itemport_ingest::{Item, PersistenceSink, SinkError};

use crate::features::ItemSink;

#[derive(Debug, Clone, Default)]
pub struct ListItemsQuery;

#[derive(Debug, thiserror::Error)]
pub enum ListItemsError {
    #[error("Store error: {0}")]
    Store(#[from] SinkError),
}

/// Every stored item, ordered by id
#[tracing::instrument(skip(items, _query))]
pub async fn handle(items: &ItemSink, _query: ListItemsQuery) -> Result<Vec<Item>, ListItemsError> {
    Ok(items.find_all().await?)
}
