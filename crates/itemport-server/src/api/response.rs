//! API response types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use itemport_ingest::ImportReport;
use serde::Serialize;

/// Body of every CSV upload response
///
/// `message` is the human-readable outcome; `report` is present on success
/// and `detail` on failure.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            report: None,
            detail: None,
        }
    }

    pub fn with_report(mut self, report: ReportSummary) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Pair the body with a status code
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Import counters plus the reason each skipped row was dropped
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: String,
}

impl<R> From<&ImportReport<R>> for ReportSummary {
    fn from(report: &ImportReport<R>) -> Self {
        Self {
            imported_count: report.imported_count(),
            skipped_count: report.skipped_count(),
            skipped: report
                .skipped()
                .map(|(row_index, reason)| SkippedRow {
                    row_index,
                    reason: reason.to_string(),
                })
                .collect(),
        }
    }
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
