//! Turn raw CSV rows into typed year entries.
//!
//! The MUSICS and MEMBER cells hold several items separated by a literal
//! `<br>` marker. Member items look like `★Tb 田中 太郎（大阪大 工3）`:
//! leader glyphs, an instrument code, the name, and the affiliation in
//! full-width parentheses. Any part that does not match comes out as an empty
//! string; nothing here rejects a row except a missing or non-numeric YEAR or a
//! missing BAND.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::models::{MemberRecord, MusicPiece, YearEntry};
use crate::parser::RawRow;

/// Item separator inside the MUSICS and MEMBER cells.
pub const ITEM_SEPARATOR: &str = "<br>";

/// Legacy band names and their current canonical form.
const BAND_ALIASES: &[(&str, &str)] = &[("New Wave Jazz Orchestra", "The New Wave Jazz Orchestra")];

static MEMBER_HEAD: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([★◆●◎]*)([A-Za-z]+(?:/[A-Za-z]+|・[A-Za-z]+)*)").ok());

static MEMBER_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[★◆●◎]*[A-Za-z]+(?:/[A-Za-z]+|・[A-Za-z]+)*\s+([^（]+)").ok());

static MEMBER_AFFILIATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"（([^）]+)）").ok());

static WHITESPACE_RUN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s+").ok());

/// Why a row did not become an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingYear,
    MissingBand,
    InvalidYear(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingYear => write!(f, "missing YEAR"),
            DropReason::MissingBand => write!(f, "missing BAND"),
            DropReason::InvalidYear(raw) => write!(f, "non-numeric YEAR '{}'", raw),
        }
    }
}

/// A row that was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    pub line: usize,
    pub reason: DropReason,
}

/// Result of normalizing a batch of rows
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// Entries in input order
    pub entries: Vec<YearEntry>,
    pub dropped: Vec<DroppedRow>,
}

impl NormalizeOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Normalized: {} entries, {} rows dropped",
            self.entries.len(),
            self.dropped.len()
        )
    }
}

/// Normalize every row, collecting the dropped ones.
pub fn normalize_rows(rows: &[RawRow]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for row in rows {
        match normalize_row(row) {
            Ok(entry) => outcome.entries.push(entry),
            Err(reason) => outcome.dropped.push(DroppedRow {
                line: row.line,
                reason,
            }),
        }
    }

    outcome
}

/// Normalize one row into an entry.
pub fn normalize_row(row: &RawRow) -> Result<YearEntry, DropReason> {
    let raw_year = row.get("YEAR").trim();
    let raw_band = row.get("BAND").trim();

    if raw_year.is_empty() {
        return Err(DropReason::MissingYear);
    }
    if raw_band.is_empty() {
        return Err(DropReason::MissingBand);
    }

    let year =
        leading_year(raw_year).ok_or_else(|| DropReason::InvalidYear(raw_year.to_string()))?;

    Ok(YearEntry {
        year,
        band: canonical_band_name(raw_band),
        prize: optional(row.get("PRIZE")),
        solo_prize: optional(row.get("SOLOPRIZE")),
        image_path: optional(row.get("PICS")),
        musics: parse_musics(row.get("MUSICS")),
        url1: optional(row.get("URL1")),
        url2: optional(row.get("URL2")),
        members: parse_members(row.get("MEMBER")),
    })
}

/// Rewrite known legacy band names; everything else passes through.
pub fn canonical_band_name(band: &str) -> String {
    let band = band.trim();
    BAND_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == band)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| band.to_string())
}

/// Split a MUSICS cell into pieces with no soloists.
pub fn parse_musics(cell: &str) -> Vec<MusicPiece> {
    split_items(cell)
        .map(normalize_piece_title)
        .filter(|title| !title.is_empty())
        .map(MusicPiece::new)
        .collect()
}

/// Collapse whitespace and put a space before every opening parenthesis.
///
/// `"Take  the \"A\" Train(arr. X)"` becomes `"Take the \"A\" Train (arr. X)"`.
pub fn normalize_piece_title(title: &str) -> String {
    let collapsed = collapse_whitespace(title);
    collapse_whitespace(&collapsed.replace('(', " ("))
}

/// Split a MEMBER cell into member records.
pub fn parse_members(cell: &str) -> Vec<MemberRecord> {
    split_items(cell).map(parse_member).collect()
}

/// Extract symbols, instrument, name and affiliation from one member item.
pub fn parse_member(item: &str) -> MemberRecord {
    let head = (*MEMBER_HEAD).as_ref().and_then(|re| re.captures(item));
    let symbols = head
        .as_ref()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let instrument = head
        .as_ref()
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let name = capture_trimmed(&MEMBER_NAME, item);
    let affiliation = capture_trimmed(&MEMBER_AFFILIATION, item);

    MemberRecord {
        id: None,
        symbols,
        instrument,
        name,
        affiliation,
    }
}

fn capture_trimmed(pattern: &Lazy<Option<Regex>>, item: &str) -> String {
    (**pattern)
        .as_ref()
        .and_then(|re| re.captures(item))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn split_items(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(ITEM_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    match (*WHITESPACE_RUN).as_ref() {
        Some(re) => re.replace_all(s, " ").trim().to_string(),
        None => s.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Leading integer of a YEAR cell, so `1990年` and `1990（第21回）` read as
/// 1990. `None` when the cell does not start with a digit (after a sign).
fn leading_year(raw: &str) -> Option<i32> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['-', '+']));
    let digits_len = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len() - sign_len);
    if digits_len == 0 {
        return None;
    }
    raw[..sign_len + digits_len].parse().ok()
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(columns: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            2,
            columns
                .iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_member_with_affiliation() {
        let member = parse_member("★Tb 田中 太郎（大阪大 工3）");

        assert_eq!(member.symbols, "★");
        assert_eq!(member.instrument, "Tb");
        assert_eq!(member.name, "田中 太郎");
        assert_eq!(member.affiliation, "大阪大 工3");
    }

    #[test]
    fn test_compound_instrument() {
        let member = parse_member("B・Vo 鈴木 花子");

        assert_eq!(member.symbols, "");
        assert_eq!(member.instrument, "B・Vo");
        assert_eq!(member.name, "鈴木 花子");
        assert_eq!(member.affiliation, "");
    }

    #[test]
    fn test_slash_instrument_and_multiple_glyphs() {
        let member = parse_member("★◎Tb/MC 山田 一郎（京都大）");

        assert_eq!(member.symbols, "★◎");
        assert_eq!(member.instrument, "Tb/MC");
        assert_eq!(member.name, "山田 一郎");
        assert_eq!(member.affiliation, "京都大");
    }

    #[test]
    fn test_malformed_member_degrades() {
        let member = parse_member("田中 太郎（大阪大）");

        assert_eq!(member.instrument, "");
        assert_eq!(member.name, "");
        assert_eq!(member.affiliation, "大阪大");

        let member = parse_member("Tp");
        assert_eq!(member.instrument, "Tp");
        assert_eq!(member.name, "");
    }

    #[test]
    fn test_members_split_on_marker() {
        let members = parse_members("★Tp A（X）<br> <br>Tb B<br>");
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].instrument, "Tb");
        assert_eq!(members[1].name, "B");
        assert!(parse_members("").is_empty());
    }

    #[test]
    fn test_piece_title_normalization() {
        assert_eq!(
            normalize_piece_title("  Sing,   Sing,\tSing(arr. B.Goodman) "),
            "Sing, Sing, Sing (arr. B.Goodman)"
        );
        assert_eq!(normalize_piece_title("Spain (Chick Corea)"), "Spain (Chick Corea)");
    }

    #[test]
    fn test_musics_have_no_soloists() {
        let musics = parse_musics("Song A<br>Song B(live)<br> ");
        assert_eq!(
            musics,
            vec![MusicPiece::new("Song A"), MusicPiece::new("Song B (live)")]
        );
    }

    #[test]
    fn test_band_canonicalization() {
        assert_eq!(
            canonical_band_name("New Wave Jazz Orchestra"),
            "The New Wave Jazz Orchestra"
        );
        assert_eq!(
            canonical_band_name("The New Wave Jazz Orchestra"),
            "The New Wave Jazz Orchestra"
        );
        assert_eq!(canonical_band_name("Blue Notes"), "Blue Notes");
    }

    #[test]
    fn test_normalize_full_row() {
        let entry = normalize_row(&row(&[
            ("YEAR", " 2005 "),
            ("BAND", "New Wave Jazz Orchestra"),
            ("PRIZE", "Gold"),
            ("SOLOPRIZE", ""),
            ("PICS", "img/2005.jpg"),
            ("MUSICS", "Song A<br>Song B"),
            ("URL1", " "),
            ("URL2", "https://example.org/v"),
            ("MEMBER", "★Tb 田中 太郎（大阪大 工3）<br>B・Vo 鈴木 花子"),
        ]))
        .unwrap();

        assert_eq!(entry.year, 2005);
        assert_eq!(entry.band, "The New Wave Jazz Orchestra");
        assert_eq!(entry.prize.as_deref(), Some("Gold"));
        assert_eq!(entry.solo_prize, None);
        assert_eq!(entry.image_path.as_deref(), Some("img/2005.jpg"));
        assert_eq!(entry.url1, None);
        assert_eq!(entry.musics.len(), 2);
        assert_eq!(entry.members.len(), 2);
    }

    #[test]
    fn test_drop_reasons() {
        assert_eq!(
            normalize_row(&row(&[("YEAR", " "), ("BAND", "A")])),
            Err(DropReason::MissingYear)
        );
        assert_eq!(
            normalize_row(&row(&[("YEAR", "2001"), ("BAND", "")])),
            Err(DropReason::MissingBand)
        );
        assert_eq!(
            normalize_row(&row(&[("YEAR", "平成2年"), ("BAND", "A")])),
            Err(DropReason::InvalidYear("平成2年".into()))
        );
        assert_eq!(
            normalize_row(&row(&[("YEAR", "-"), ("BAND", "A")])),
            Err(DropReason::InvalidYear("-".into()))
        );
    }

    #[test]
    fn test_year_keeps_leading_digits() {
        let entry = normalize_row(&row(&[("YEAR", "1990年"), ("BAND", "A")])).unwrap();
        assert_eq!(entry.year, 1990);

        let entry = normalize_row(&row(&[("YEAR", "1990（第21回）"), ("BAND", "A")])).unwrap();
        assert_eq!(entry.year, 1990);

        assert_eq!(leading_year("20o1"), Some(20));
        assert_eq!(leading_year("+2001"), Some(2001));
        assert_eq!(leading_year("abc"), None);
    }

    #[test]
    fn test_entry_count_matches_rows_with_year_and_band() {
        let rows = vec![
            row(&[("YEAR", "2001"), ("BAND", "A")]),
            row(&[("YEAR", ""), ("BAND", "B")]),
            row(&[("YEAR", "2003"), ("BAND", "C")]),
            row(&[("YEAR", "2004"), ("BAND", "  ")]),
        ];
        let outcome = normalize_rows(&rows);

        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.dropped.len(), 2);
        assert!(outcome.summary().contains("2 entries"));
    }
}
