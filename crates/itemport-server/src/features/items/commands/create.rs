use itemport_ingest::{Item, ItemDraft, PersistenceSink, SinkError};
use serde::{Deserialize, Serialize};

use crate::features::ItemSink;

/// Request body of `POST /api/items`; the store assigns the id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemCommand {
    pub item_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateItemError {
    #[error("Store error: {0}")]
    Store(#[from] SinkError),
}

#[tracing::instrument(skip(items, command))]
pub async fn handle(items: &ItemSink, command: CreateItemCommand) -> Result<Item, CreateItemError> {
    let item = items.save(ItemDraft::new(command.item_name)).await?;
    tracing::info!(id = item.id, "Item created");
    Ok(item)
}
