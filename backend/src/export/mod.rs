//! Export stored entries.
//!
//! Two representations:
//!
//! - [`ExportFormat::Json`] - the full `{ stats, data }` document, nested
//!   pieces and members preserved
//! - [`ExportFormat::Csv`] - one row per entry for spreadsheet use; pieces and
//!   members are flattened into at most `max_items` columns each and anything
//!   beyond that is left out

use std::str::FromStr;

use crate::error::{ExportError, ExportResult};
use crate::models::YearEntry;
use crate::transform::aggregate::build_dataset;

/// Default number of piece and member columns in the CSV export.
pub const DEFAULT_MAX_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Render entries in the requested format.
pub fn export(entries: Vec<YearEntry>, format: ExportFormat, max_items: usize) -> ExportResult<String> {
    match format {
        ExportFormat::Json => to_json_document(entries),
        ExportFormat::Csv => to_csv_table(&entries, max_items),
    }
}

/// Pretty-printed `{ stats, data }` document.
pub fn to_json_document(entries: Vec<YearEntry>) -> ExportResult<String> {
    let dataset = build_dataset(entries);
    Ok(serde_json::to_string_pretty(&dataset)?)
}

/// Flattened table, one row per entry.
pub fn to_csv_table(entries: &[YearEntry], max_items: usize) -> ExportResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(csv_headers(max_items))?;

    for entry in entries {
        let mut record: Vec<String> = vec![
            entry.year.to_string(),
            entry.band.clone(),
            entry.prize.clone().unwrap_or_default(),
            entry.solo_prize.clone().unwrap_or_default(),
            entry.image_path.clone().unwrap_or_default(),
        ];
        record.extend(padded(
            entry.musics.iter().map(|m| m.title.clone()),
            max_items,
        ));
        record.push(entry.url1.clone().unwrap_or_default());
        record.push(entry.url2.clone().unwrap_or_default());
        record.extend(padded(
            entry.members.iter().map(|m| m.display_line()),
            max_items,
        ));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn csv_headers(max_items: usize) -> Vec<String> {
    let mut headers: Vec<String> = ["Year", "Band", "Prize", "Solo Prize", "Image Path"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    headers.extend((1..=max_items).map(|i| format!("Music {}", i)));
    headers.push("URL 1".to_string());
    headers.push("URL 2".to_string());
    headers.extend((1..=max_items).map(|i| format!("Member {}", i)));
    headers
}

/// Exactly `len` cells: truncated, then padded with empty strings.
fn padded(items: impl Iterator<Item = String>, len: usize) -> Vec<String> {
    let mut cells: Vec<String> = items.take(len).collect();
    cells.resize(len, String::new());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryDataset, MemberRecord, MusicPiece};

    fn sample() -> YearEntry {
        let mut entry = YearEntry::new(2005, "Blue Notes");
        entry.prize = Some("Gold".into());
        entry.musics = (1..=7).map(|i| MusicPiece::new(format!("Song {}", i))).collect();
        entry.members = vec![MemberRecord {
            symbols: "★".into(),
            instrument: "Tb".into(),
            name: "田中 太郎".into(),
            affiliation: "大阪大".into(),
            ..MemberRecord::default()
        }];
        entry
    }

    #[test]
    fn test_csv_truncates_to_max_items() {
        let csv = to_csv_table(&[sample()], 5).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 5 + 5 + 2 + 5);
        assert_eq!(&headers[5], "Music 1");
        assert_eq!(&headers[12], "Member 1");

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "2005");
        assert_eq!(&row[2], "Gold");
        assert_eq!(&row[3], "");
        assert_eq!(&row[9], "Song 5");
        assert!(!csv.contains("Song 6"));
        assert_eq!(&row[12], "★Tb 田中 太郎（大阪大）");
        assert_eq!(&row[13], "");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let mut entry = YearEntry::new(1998, "Band, The");
        entry.musics = vec![MusicPiece::new("Song, with comma")];
        let csv = to_csv_table(&[entry], 2).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "Band, The");
        assert_eq!(&row[5], "Song, with comma");
    }

    #[test]
    fn test_json_document_round_trips() {
        let json = to_json_document(vec![YearEntry::new(1998, "A"), sample()]).unwrap();
        let dataset: HistoryDataset = serde_json::from_str(&json).unwrap();

        assert_eq!(dataset.stats.total_years, 2);
        assert_eq!(dataset.data[0], sample());
        assert_eq!(dataset.data[0].musics.len(), 7);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
