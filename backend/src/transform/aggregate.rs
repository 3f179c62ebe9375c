//! Sorting, statistics and filtering over year entries.

use std::collections::BTreeSet;

use crate::models::{HistoryDataset, HistoryStats, YearEntry, YearRange};

/// Year range reported for an empty dataset.
pub const EMPTY_YEAR_RANGE: YearRange = YearRange { start: 0, end: 0 };

/// Sort newest first. Stable: entries of the same year keep their order.
pub fn sort_entries(entries: &mut [YearEntry]) {
    entries.sort_by_key(|e| std::cmp::Reverse(e.year));
}

/// Compute summary statistics.
pub fn build_stats(entries: &[YearEntry]) -> HistoryStats {
    let year_range = match (
        entries.iter().map(|e| e.year).min(),
        entries.iter().map(|e| e.year).max(),
    ) {
        (Some(start), Some(end)) => YearRange { start, end },
        _ => EMPTY_YEAR_RANGE,
    };

    let bands: BTreeSet<&str> = entries.iter().map(|e| e.band.as_str()).collect();

    HistoryStats {
        total_years: entries.len(),
        year_range,
        bands: bands.into_iter().map(String::from).collect(),
        total_musics: entries.iter().map(|e| e.musics.len()).sum(),
        total_members: entries.iter().map(|e| e.members.len()).sum(),
    }
}

/// Sort and wrap entries into the public `{ stats, data }` document.
pub fn build_dataset(mut entries: Vec<YearEntry>) -> HistoryDataset {
    sort_entries(&mut entries);
    HistoryDataset {
        stats: build_stats(&entries),
        data: entries,
    }
}

pub fn filter_by_year(entries: &[YearEntry], year: i32) -> Vec<YearEntry> {
    entries.iter().filter(|e| e.year == year).cloned().collect()
}

/// Entries with `start <= year <= end`.
pub fn filter_by_year_range(entries: &[YearEntry], start: i32, end: i32) -> Vec<YearEntry> {
    entries
        .iter()
        .filter(|e| e.year >= start && e.year <= end)
        .cloned()
        .collect()
}

pub fn filter_by_band(entries: &[YearEntry], band: &str) -> Vec<YearEntry> {
    entries.iter().filter(|e| e.band == band).cloned().collect()
}

/// Entries with a member playing `instrument`, matched by code (`Tb`) or by
/// full name (`Trombone`).
pub fn filter_by_instrument(entries: &[YearEntry], instrument: &str) -> Vec<YearEntry> {
    entries
        .iter()
        .filter(|e| e.has_instrument(instrument))
        .cloned()
        .collect()
}

/// Optional filters, all of which must match.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct EntryFilter {
    pub year: Option<i32>,
    pub from: Option<i32>,
    pub to: Option<i32>,
    pub band: Option<String>,
    pub instrument: Option<String>,
}

impl EntryFilter {
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.band.is_none()
            && self.instrument.is_none()
    }

    pub fn apply(&self, entries: Vec<YearEntry>) -> Vec<YearEntry> {
        let mut entries = entries;
        if let Some(year) = self.year {
            entries = filter_by_year(&entries, year);
        }
        if self.from.is_some() || self.to.is_some() {
            let start = self.from.unwrap_or(i32::MIN);
            let end = self.to.unwrap_or(i32::MAX);
            entries = filter_by_year_range(&entries, start, end);
        }
        if let Some(ref band) = self.band {
            entries = filter_by_band(&entries, band);
        }
        if let Some(ref instrument) = self.instrument {
            entries = filter_by_instrument(&entries, instrument);
        }
        entries
    }
}
