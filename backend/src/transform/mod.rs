//! Transformation module.
//!
//! This module turns parsed CSV rows into the history dataset:
//! - Normalizer: raw rows to typed year entries
//! - Aggregate: sorting, statistics and filters
//! - Pipeline: decode → parse → normalize → aggregate, and store writes

pub mod aggregate;
pub mod normalizer;
pub mod pipeline;

pub use aggregate::{build_stats, sort_entries, EntryFilter};
pub use normalizer::{normalize_row, normalize_rows, parse_member, parse_members, parse_musics};
pub use pipeline::{
    build_dataset, build_dataset_from_file, migrate_into_store, CsvInfo, MigrateMode,
    MigrationOptions, MigrationReport, StoreSummary,
};
