//! # Jazz Archive - band history from spreadsheet to JSON
//!
//! Turns the hand-maintained history sheet of a university jazz society
//! (Shift_JIS CSV, one row per band per year) into a typed `{stats, data}`
//! document, keeps it in a small file-backed store and serves it over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV bytes  │────▶│   Parser    │────▶│  Transform  │────▶│   History   │
//! │ (SJIS/UTF8) │     │ (decode+row)│     │ (normalize) │     │ {stats,data}│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌─────────────┐     ┌─────────────┐
//!                                         │ Entry store │────▶│   Export    │
//!                                         │ (JSON files)│     │ (json/csv)  │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jazz_archive::{build_dataset_from_file, MigrationOptions};
//! use std::path::Path;
//!
//! let report = build_dataset_from_file(Path::new("history.csv"), &MigrationOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&report.dataset)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (YearEntry, MusicPiece, MemberRecord)
//! - [`parser`] - Encoding detection and CSV row parsing
//! - [`transform`] - Normalization, aggregation and the migration pipeline
//! - [`store`] - File-backed entry store
//! - [`export`] - JSON and CSV export
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Storage and export
pub mod export;
pub mod store;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, DecodeError, ExportError, PipelineError, ServerError, StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    HistoryDataset, HistoryStats, LeaderGlyph, MemberRecord, MusicPiece, SoloistRecord,
    StoredEntry, YearEntry, YearRange,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_bytes, detect_encoding, parse_csv_file, parse_rows, DecodeOptions, Decoded,
    ParseOptions, ParseResult, RawRow,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    build_dataset, build_dataset_from_file, build_stats, migrate_into_store, normalize_row,
    normalize_rows, parse_member, parse_members, parse_musics, sort_entries, CsvInfo,
    EntryFilter, MigrateMode, MigrationOptions, MigrationReport, StoreSummary,
};

// =============================================================================
// Re-exports - Store, export, config
// =============================================================================

pub use config::ArchiveConfig;
pub use export::{export, ExportFormat};
pub use store::EntryStore;

// Server
pub mod server {
    pub use crate::api::server::{build_router, start_server, AppState};
}
