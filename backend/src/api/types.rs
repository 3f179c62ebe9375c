//! REST API response types.
//!
//! History and entry payloads are the model types themselves; only the
//! migration summary and error bodies have their own shapes.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ExportError, PipelineError, ServerError, StoreError};
use crate::models::HistoryStats;
use crate::transform::normalizer::DroppedRow;
use crate::transform::pipeline::{CsvInfo, MigrateMode, MigrationReport, StoreSummary};

/// Response sent after `POST /api/admin/migrate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateResponse {
    pub success: bool,
    pub message: String,
    pub mode: MigrateMode,
    pub created: usize,
    pub updated: usize,
    pub stats: HistoryStats,
    pub csv_info: CsvInfo,
    pub dropped: Vec<DroppedRowInfo>,
    pub skipped_lines: Vec<usize>,
}

/// A dropped input row, as shown to the admin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedRowInfo {
    pub line: usize,
    pub reason: String,
}

impl From<&DroppedRow> for DroppedRowInfo {
    fn from(row: &DroppedRow) -> Self {
        Self {
            line: row.line,
            reason: row.reason.to_string(),
        }
    }
}

impl MigrateResponse {
    pub fn new(report: MigrationReport, summary: StoreSummary, mode: MigrateMode) -> Self {
        let message = format!(
            "Migrated {} entries ({} created, {} updated)",
            report.dataset.stats.total_years, summary.created, summary.updated
        );

        Self {
            success: true,
            message,
            mode,
            created: summary.created,
            updated: summary.updated,
            dropped: report.dropped.iter().map(DroppedRowInfo::from).collect(),
            stats: report.dataset.stats,
            csv_info: report.csv_info,
            skipped_lines: report.skipped_lines,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Create an error body
pub fn error_response(error: &str, details: Option<&str>) -> Value {
    json!({
        "error": error,
        "details": details,
    })
}

/// HTTP status for a server error.
pub fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Store(e) | ServerError::Pipeline(PipelineError::Store(e)) => store_status(e),
        ServerError::Pipeline(PipelineError::EmptyInput(_))
        | ServerError::Pipeline(PipelineError::Csv(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(PipelineError::Decode(_)) => StatusCode::BAD_REQUEST,
        ServerError::Export(ExportError::UnknownFormat(_)) => StatusCode::BAD_REQUEST,
        ServerError::Export(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidEntry(_) => StatusCode::BAD_REQUEST,
        StoreError::IoError(_) | StoreError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Short error label for a status, used as the `error` field.
pub fn error_label(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable input",
        _ => "Internal server error",
    }
}
