use itemport_ingest::export::to_csv_bytes;
use itemport_ingest::{PersistenceSink, SinkError};

use crate::features::ItemSink;

/// File name offered to the browser for the export
pub const DOWNLOAD_FILENAME: &str = "items.csv";

#[derive(Debug, Clone, Default)]
pub struct DownloadCsvQuery;

#[derive(Debug, thiserror::Error)]
pub enum DownloadCsvError {
    #[error("Store error: {0}")]
    Store(#[from] SinkError),
    #[error("CSV encoding failed: {0}")]
    Encode(String),
}

/// Render every stored item as CSV
#[tracing::instrument(skip(items, _query))]
pub async fn handle(items: &ItemSink, _query: DownloadCsvQuery) -> Result<Vec<u8>, DownloadCsvError> {
    let all = items.find_all().await?;
    let bytes = to_csv_bytes(&all).map_err(|e| DownloadCsvError::Encode(e.to_string()))?;

    tracing::debug!(items = all.len(), bytes = bytes.len(), "CSV export rendered");
    Ok(bytes)
}
