use itemport_ingest::{ImportError, ImportPipeline, ImportReport, Item, Upload};

use crate::features::ItemSink;

#[derive(Debug, Clone)]
pub struct UploadCsvCommand {
    /// Original file name as sent by the client
    pub filename: Option<String>,
    /// Media type declared on the multipart field
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl UploadCsvCommand {
    /// File name for user-facing messages; empty when the client sent none
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadCsvError {
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl UploadCsvError {
    /// The upload was refused for its declared type rather than failing to import
    pub fn is_rejected_format(&self) -> bool {
        match self {
            UploadCsvError::Import(err) => err.is_validation(),
        }
    }
}

#[tracing::instrument(skip(importer, command), fields(filename = %command.display_name(), bytes = command.content.len()))]
pub async fn handle(
    importer: &ImportPipeline<ItemSink>,
    command: UploadCsvCommand,
) -> Result<ImportReport<Item>, UploadCsvError> {
    let upload = Upload {
        filename: command.filename,
        media_type: command.content_type,
        reader: command.content.as_slice(),
    };

    Ok(importer.import(upload).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{Config, ImportSettings};
    use crate::features::FeatureState;
    use itemport_ingest::{ConflictPolicy, MemoryItemSink, PersistenceSink};
    use std::sync::Arc;

    fn state_with(settings: &ImportSettings) -> FeatureState {
        FeatureState::new(Arc::new(MemoryItemSink::new(ConflictPolicy::Replace)), settings)
    }

    fn command(content_type: &str, body: &str) -> UploadCsvCommand {
        UploadCsvCommand {
            filename: Some("items.csv".to_string()),
            content_type: Some(content_type.to_string()),
            content: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_imports_into_state_store() {
        let state = state_with(&Config::default().import);
        let report = handle(&state.importer, command("text/csv", "id,item_name\n1,Pen\n"))
            .await
            .unwrap();

        assert_eq!(report.imported_count(), 1);
        assert_eq!(state.items.find_all().await.unwrap(), vec![Item::new(1, "Pen")]);
    }

    #[tokio::test]
    async fn test_configured_delimiter_and_media_type() {
        let mut settings = Config::default().import;
        settings.delimiter = ';';
        settings.expected_media_type = "text/plain".to_string();
        let state = state_with(&settings);

        let err = handle(&state.importer, command("text/csv", "id;item_name\n1;Pen\n"))
            .await
            .unwrap_err();
        assert!(err.is_rejected_format());

        let report = handle(&state.importer, command("text/plain", "id;item_name\n1;Pen, red\n"))
            .await
            .unwrap();
        assert_eq!(report.imported().cloned().collect::<Vec<_>>(), vec![Item::new(1, "Pen, red")]);
    }

    #[test]
    fn test_display_name_defaults_to_empty() {
        let cmd = UploadCsvCommand {
            filename: None,
            content_type: None,
            content: Vec::new(),
        };
        assert_eq!(cmd.display_name(), "");
    }
}
