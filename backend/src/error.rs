//! Error types for the archive pipeline, entry store and server.
//!
//! - [`DecodeError`] - Encoding configuration errors
//! - [`CsvError`] - CSV parsing errors
//! - [`StoreError`] - Entry store errors
//! - [`ExportError`] - Export serialization errors
//! - [`PipelineError`] - Top-level migration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Conversion is via `From` implementations so `?` works across boundaries.
//! Row-level problems (missing YEAR/BAND, malformed member strings) are not
//! errors: they are reported as dropped rows or degraded fields.

use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while configuring the decoder.
///
/// Decoding itself never fails: the last resort is a single-byte passthrough.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Encoding label not known to `encoding_rs`.
    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),
}

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entry with this id.
    #[error("Year entry not found: {0}")]
    NotFound(String),

    /// Entry payload rejected.
    #[error("Invalid year entry: {0}")]
    InvalidEntry(String),

    /// IO error.
    #[error("Store IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Writer flush error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Requested format is not supported.
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level migration errors.
///
/// Returned by [`crate::transform::pipeline::build_dataset`] and
/// [`crate::transform::pipeline::migrate_into_store`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unknown encoding label in the migration options.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Storage failure while writing migrated entries.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// No usable rows in the input.
    #[error("No data found in CSV ({0} rows dropped)")]
    EmptyInput(usize),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let store_err = StoreError::NotFound("abc".into());
        let pipeline_err: PipelineError = store_err.into();
        assert!(pipeline_err.to_string().contains("abc"));
    }

    #[test]
    fn test_server_error_wraps_store() {
        let err: ServerError = StoreError::InvalidEntry("band is empty".into()).into();
        let msg = err.to_string();
        assert!(msg.contains("Store error"));
        assert!(msg.contains("band is empty"));
    }

    #[test]
    fn test_empty_input_reports_dropped_count() {
        let err = PipelineError::EmptyInput(7);
        assert!(err.to_string().contains("7 rows dropped"));
    }
}
