use crate::api::response::{ErrorResponse, MessageResponse, ReportSummary};
use crate::features::FeatureState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::{
    commands::{UploadCsvCommand, UploadCsvError},
    queries::{DownloadCsvError, DownloadCsvQuery, DOWNLOAD_FILENAME},
};

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

const REJECTED_FORMAT_MESSAGE: &str = "Please upload a csv file!";

pub fn csv_routes() -> Router<FeatureState> {
    Router::new()
        .route("/csv/upload", post(upload_csv))
        .route("/csv/download", get(download_csv))
}

#[tracing::instrument(skip(state, multipart))]
async fn upload_csv(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, CsvApiError> {
    let mut command: Option<UploadCsvCommand> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await?;

        command = Some(UploadCsvCommand {
            filename,
            content_type,
            content: content.to_vec(),
        });
    }

    let command = command.ok_or(CsvApiError::MissingFile)?;
    let filename = command.display_name().to_string();

    match super::commands::upload::handle(&state.importer, command).await {
        Ok(report) => {
            tracing::info!(
                filename = %filename,
                imported = report.imported_count(),
                skipped = report.skipped_count(),
                "CSV uploaded via API"
            );
            let body = MessageResponse::new(format!("Uploaded the file successfully: {}", filename))
                .with_report(ReportSummary::from(&report));
            Ok(body.with_status(StatusCode::OK))
        },
        Err(error) => Err(CsvApiError::Upload { filename, error }),
    }
}

#[tracing::instrument(skip(state))]
async fn download_csv(State(state): State<FeatureState>) -> Result<Response, CsvApiError> {
    let bytes = super::queries::download::handle(state.items.as_ref(), DownloadCsvQuery).await?;

    let disposition = format!("attachment; filename={}", DOWNLOAD_FILENAME);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV.essence_str().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug)]
enum CsvApiError {
    MissingFile,
    Multipart(MultipartError),
    Upload { filename: String, error: UploadCsvError },
    Download(DownloadCsvError),
}

impl From<MultipartError> for CsvApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<DownloadCsvError> for CsvApiError {
    fn from(err: DownloadCsvError) -> Self {
        Self::Download(err)
    }
}

impl IntoResponse for CsvApiError {
    fn into_response(self) -> Response {
        match self {
            CsvApiError::MissingFile => {
                tracing::warn!("Upload without a file field");
                MessageResponse::new(REJECTED_FORMAT_MESSAGE).with_status(StatusCode::BAD_REQUEST)
            },
            CsvApiError::Multipart(err) => {
                tracing::warn!(error = %err, "Unreadable multipart body");
                let status = err.status();
                MessageResponse::new(err.body_text()).with_status(status)
            },
            CsvApiError::Upload { error, .. } if error.is_rejected_format() => {
                MessageResponse::new(REJECTED_FORMAT_MESSAGE)
                    .with_detail(error.to_string())
                    .with_status(StatusCode::BAD_REQUEST)
            },
            CsvApiError::Upload { filename, error } => {
                tracing::error!(filename = %filename, error = %error, "CSV import failed");
                MessageResponse::new(format!("Could not upload the file: {}!", filename))
                    .with_detail(error.to_string())
                    .with_status(StatusCode::EXPECTATION_FAILED)
            },
            CsvApiError::Download(err) => {
                tracing::error!(error = %err, "CSV export failed");
                let error = ErrorResponse::new("STORE_ERROR", "Could not export items");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for CsvApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile => write!(f, "No file field found in multipart data"),
            Self::Multipart(e) => write!(f, "{}", e),
            Self::Upload { error, .. } => write!(f, "{}", error),
            Self::Download(e) => write!(f, "{}", e),
        }
    }
}
