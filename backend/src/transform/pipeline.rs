//! High-level migration API: CSV bytes to history dataset, and into the store.
//!
//! decode → parse → normalize → sort → aggregate. Nothing is kept between
//! runs. Running two migrations against the same store at once is not
//! supported.
//!
//! # Example
//!
//! ```rust,ignore
//! use jazz_archive::transform::pipeline::{build_dataset_from_file, MigrationOptions};
//! use std::path::Path;
//!
//! let report = build_dataset_from_file(Path::new("history.csv"), &MigrationOptions::default())?;
//! println!("{} entries", report.dataset.stats.total_years);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use super::aggregate::build_dataset as aggregate_dataset;
use super::normalizer::{normalize_rows, DroppedRow};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::HistoryDataset;
use crate::parser::{decode_bytes, parse_rows, DecodeOptions, ParseOptions};
use crate::store::EntryStore;

/// How migrated entries are written to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrateMode {
    /// Delete every stored entry, then insert
    #[default]
    Replace,
    /// Update entries matching on year + band, insert the rest
    Upsert,
}

impl FromStr for MigrateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(MigrateMode::Replace),
            "upsert" => Ok(MigrateMode::Upsert),
            other => Err(format!("Unknown migrate mode: {}", other)),
        }
    }
}

/// Options for the migration pipeline
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    pub decode: DecodeOptions,
    pub parse: ParseOptions,
    pub mode: MigrateMode,
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    /// The passthrough last resort was used; text may be garbled
    pub lossy: bool,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of building a dataset from CSV
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub dataset: HistoryDataset,
    pub csv_info: CsvInfo,
    pub dropped: Vec<DroppedRow>,
    /// Lines skipped as malformed (only with `skip_malformed`)
    pub skipped_lines: Vec<usize>,
}

/// Counts written to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub created: usize,
    pub updated: usize,
}

/// Build the history dataset from a CSV file.
pub fn build_dataset_from_file(
    path: &Path,
    options: &MigrationOptions,
) -> PipelineResult<MigrationReport> {
    let bytes = std::fs::read(path).map_err(crate::error::CsvError::from)?;
    build_dataset(&bytes, options)
}

/// Build the history dataset from raw CSV bytes.
pub fn build_dataset(bytes: &[u8], options: &MigrationOptions) -> PipelineResult<MigrationReport> {
    log_info("📖 Reading CSV...");
    let decoded = decode_bytes(bytes, &options.decode);
    if decoded.lossy {
        log_warning(format!(
            "No candidate encoding fit, decoded as {} (text may be garbled)",
            decoded.encoding
        ));
    } else {
        log_success(format!("Detected encoding: {}", decoded.encoding));
    }

    let parsed = parse_rows(&decoded.text, &options.parse)?;
    log_success(format!(
        "Read {} rows, {} columns",
        parsed.rows.len(),
        parsed.headers.len()
    ));
    if !parsed.skipped_lines.is_empty() {
        log_warning(format!(
            "{} malformed lines skipped (lines: {})",
            parsed.skipped_lines.len(),
            sample_list(parsed.skipped_lines.iter())
        ));
    }

    log_info("⚙️  Normalizing rows...");
    let outcome = normalize_rows(&parsed.rows);
    log_success(outcome.summary());
    print_dropped(&outcome.dropped);

    let csv_info = CsvInfo {
        encoding: decoded.encoding,
        lossy: decoded.lossy,
        headers: parsed.headers,
        row_count: parsed.rows.len(),
    };

    let dataset = aggregate_dataset(outcome.entries);
    print_stats(&dataset);

    Ok(MigrationReport {
        dataset,
        csv_info,
        dropped: outcome.dropped,
        skipped_lines: parsed.skipped_lines,
    })
}

/// Build the dataset and write it to the store.
///
/// An input with no usable rows is rejected before the store is touched, so a
/// wrong file cannot wipe the archive in replace mode.
pub fn migrate_into_store(
    store: &mut EntryStore,
    bytes: &[u8],
    options: &MigrationOptions,
) -> PipelineResult<(MigrationReport, StoreSummary)> {
    let report = build_dataset(bytes, options)?;

    if report.dataset.data.is_empty() {
        return Err(PipelineError::EmptyInput(report.dropped.len()));
    }

    let entries = report.dataset.data.clone();
    let summary = match options.mode {
        MigrateMode::Replace => {
            log_info("🗄️  Replacing all stored entries...");
            StoreSummary {
                created: store.replace_all(entries)?,
                updated: 0,
            }
        }
        MigrateMode::Upsert => {
            log_info("🗄️  Merging into stored entries...");
            let (created, updated) = store.upsert_all(entries)?;
            StoreSummary { created, updated }
        }
    };

    log_success(format!(
        "Stored: {} created, {} updated ({} total)",
        summary.created,
        summary.updated,
        store.len()
    ));

    Ok((report, summary))
}

fn print_dropped(dropped: &[DroppedRow]) {
    if dropped.is_empty() {
        return;
    }

    log_warning(format!("{} rows dropped", dropped.len()));
    for row in dropped.iter().take(5) {
        log_info_indent(format!("line {}: {}", row.line, row.reason), 1);
    }
    if dropped.len() > 5 {
        log_info_indent(format!("... +{}", dropped.len() - 5), 1);
    }
}

fn print_stats(dataset: &HistoryDataset) {
    let stats = &dataset.stats;
    log_success(format!("Entries: {}", stats.total_years));
    log_info_indent(
        format!("Years: {} - {}", stats.year_range.start, stats.year_range.end),
        1,
    );
    log_info_indent(format!("Bands: {}", stats.bands.len()), 1);
    log_info_indent(format!("Pieces: {}", stats.total_musics), 1);
    log_info_indent(format!("Members: {}", stats.total_members), 1);
}

fn sample_list<'a>(items: impl Iterator<Item = &'a usize>) -> String {
    let all: Vec<String> = items.map(|i| i.to_string()).collect();
    if all.len() > 5 {
        format!("{}... +{}", all[..5].join(", "), all.len() - 5)
    } else {
        all.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;
    use tempfile::tempdir;

    const SHEET: &str = "YEAR,BAND,PRIZE,SOLOPRIZE,PICS,MUSICS,URL1,URL2,MEMBER,,\n\
        1998,Blue Notes,Silver,,,Song A<br>Song B,,,★Tb 田中 太郎（大阪大 工3）\n\
        2012,New Wave Jazz Orchestra,Gold,Best Soloist,img/2012.jpg,\"Song, with comma\",,,B・Vo 鈴木 花子<br>Tp 佐藤 次郎（京都大）\n\
        ,Nobody,,,,,,,\n\
        2005,Blue Notes,,,,Song C,,,\n";

    #[test]
    fn test_build_dataset_from_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode(SHEET);
        let report = build_dataset(&bytes, &MigrationOptions::default()).unwrap();

        assert_eq!(report.csv_info.encoding, "Shift_JIS");
        assert_eq!(report.csv_info.headers.len(), 9);
        assert_eq!(report.csv_info.row_count, 4);
        assert_eq!(report.dropped.len(), 1);

        let stats = &report.dataset.stats;
        assert_eq!(stats.total_years, 3);
        assert_eq!(stats.year_range.start, 1998);
        assert_eq!(stats.year_range.end, 2012);
        assert_eq!(stats.bands, vec!["Blue Notes", "The New Wave Jazz Orchestra"]);
        assert_eq!(stats.total_musics, 4);
        assert_eq!(stats.total_members, 3);

        let first = &report.dataset.data[0];
        assert_eq!(first.year, 2012);
        assert_eq!(first.musics[0].title, "Song, with comma");
        assert_eq!(first.members[0].instrument, "B・Vo");
        assert_eq!(first.members[1].affiliation, "京都大");
    }

    #[test]
    fn test_migrate_replace_then_upsert() {
        let dir = tempdir().unwrap();
        let mut store = EntryStore::open(dir.path()).unwrap();
        let (bytes, _, _) = SHIFT_JIS.encode(SHEET);

        let (_, summary) =
            migrate_into_store(&mut store, &bytes, &MigrationOptions::default()).unwrap();
        assert_eq!(summary, StoreSummary { created: 3, updated: 0 });

        let options = MigrationOptions {
            mode: MigrateMode::Upsert,
            ..MigrationOptions::default()
        };
        let (_, summary) = migrate_into_store(&mut store, &bytes, &options).unwrap();
        assert_eq!(summary, StoreSummary { created: 0, updated: 3 });
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_empty_input_leaves_store_alone() {
        let dir = tempdir().unwrap();
        let mut store = EntryStore::open(dir.path()).unwrap();
        store
            .create(crate::models::YearEntry::new(1990, "Keep Me"))
            .unwrap();

        let result = migrate_into_store(
            &mut store,
            b"YEAR,BAND\n,missing year\n",
            &MigrationOptions::default(),
        );

        assert!(matches!(result, Err(PipelineError::EmptyInput(1))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_migrate_mode_parsing() {
        assert_eq!("UPSERT".parse::<MigrateMode>().unwrap(), MigrateMode::Upsert);
        assert_eq!("replace".parse::<MigrateMode>().unwrap(), MigrateMode::Replace);
        assert!("merge".parse::<MigrateMode>().is_err());
    }
}
