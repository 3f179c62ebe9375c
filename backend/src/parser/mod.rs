//! CSV row parsing for the archive sheet.
//!
//! The sheet uses a comma delimiter and double-quote wrapping. Quoted fields
//! may contain the delimiter. Quotes toggle a `within_quotes` flag and are not
//! kept in the field value, so a line with an odd number of quotes splits
//! wrongly; [`ParseOptions::skip_malformed`] decides whether such lines are
//! skipped or kept as split.

pub mod decode;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;

use crate::error::{CsvError, CsvResult};

pub use decode::{decode_bytes, detect_encoding, DecodeOptions, Decoded};

/// One data line, zipped with the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source text.
    pub line: usize,
    columns: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(line: usize, columns: Vec<(String, String)>) -> Self {
        Self { line, columns }
    }

    /// Value for `column`, or `""` when the column does not exist.
    pub fn get(&self, column: &str) -> &str {
        self.columns
            .iter()
            .find(|(header, _)| header == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (header, value) in &self.columns {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// Row parser settings.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub delimiter: char,
    /// Skip lines with an odd number of quote characters instead of keeping
    /// their (probably wrong) split.
    pub skip_malformed: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            skip_malformed: false,
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Column headers, trailing empty columns removed
    pub headers: Vec<String>,
    /// Parsed rows
    pub rows: Vec<RawRow>,
    /// Line numbers skipped as malformed
    pub skipped_lines: Vec<usize>,
}

/// Parse decoded CSV text into rows.
///
/// # Example
/// ```ignore
/// use jazz_archive::parser::{parse_rows, ParseOptions};
///
/// let csv = "YEAR,BAND\n2005,\"Blue, Notes\"";
/// let result = parse_rows(csv, &ParseOptions::default()).unwrap();
///
/// assert_eq!(result.rows[0].get("BAND"), "Blue, Notes");
/// ```
pub fn parse_rows(content: &str, options: &ParseOptions) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut lines = content.split('\n');
    let header_line = lines.next().ok_or(CsvError::EmptyFile)?;
    let headers = parse_headers(header_line, options.delimiter);

    if headers.is_empty() {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    let mut skipped_lines = Vec::new();

    for (line_idx, raw_line) in lines.enumerate() {
        let line_num = line_idx + 2; // +1 for 0-index, +1 for header
        let line = raw_line.trim();

        if line.is_empty() {
            continue;
        }

        if options.skip_malformed && line.matches('"').count() % 2 != 0 {
            skipped_lines.push(line_num);
            continue;
        }

        let values = align_fields(split_fields(line, options.delimiter), headers.len());
        let columns = headers.iter().cloned().zip(values).collect();
        rows.push(RawRow::new(line_num, columns));
    }

    Ok(ParseResult {
        headers,
        rows,
        skipped_lines,
    })
}

/// Parse a CSV file: decode by trial, then split into rows.
pub fn parse_csv_file<P: AsRef<Path>>(
    path: P,
    decode_options: &DecodeOptions,
    parse_options: &ParseOptions,
) -> CsvResult<(Decoded, ParseResult)> {
    let bytes = std::fs::read(path.as_ref())?;
    let decoded = decode_bytes(&bytes, decode_options);
    let result = parse_rows(&decoded.text, parse_options)?;
    Ok((decoded, result))
}

/// Split the header line and drop trailing empty columns left by stray
/// delimiters.
pub fn parse_headers(line: &str, delimiter: char) -> Vec<String> {
    let mut headers: Vec<String> = line
        .trim_start_matches('\u{feff}')
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').trim().to_string())
        .collect();

    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }

    headers
}

/// Split one line into trimmed fields, honoring double-quote wrapping.
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut within_quotes = false;

    for c in line.chars() {
        if c == '"' {
            within_quotes = !within_quotes;
        } else if c == delimiter && !within_quotes {
            values.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    values.push(current.trim().to_string());

    values
        .into_iter()
        .map(|v| strip_wrapping_quotes(&v).to_string())
        .collect()
}

/// Remove one layer of wrapping quotes.
fn strip_wrapping_quotes(field: &str) -> &str {
    if field.len() > 1 && field.starts_with('"') && field.ends_with('"') {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

/// Truncate or pad with empty strings to exactly `len` fields.
fn align_fields(mut values: Vec<String>, len: usize) -> Vec<String> {
    values.resize(len, String::new());
    values
}
