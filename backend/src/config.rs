//! Application configuration.
//!
//! Read from the environment (a `.env` file is loaded first if present).
//! CLI flags override these values.
//!
//! | Variable                   | Default                   |
//! |----------------------------|---------------------------|
//! | `ARCHIVE_DATA_DIR`         | `.jazz-archive/entries`   |
//! | `ARCHIVE_ENCODING`         | `shift_jis`               |
//! | `ARCHIVE_SKIP_MALFORMED`   | `false`                   |
//! | `ARCHIVE_EXPORT_MAX_ITEMS` | `5`                       |
//! | `ARCHIVE_IMAGE_DIR`        | unset (images not served) |
//! | `PORT`                     | `3000`                    |

use std::env;
use std::path::PathBuf;

use crate::error::DecodeError;
use crate::export::DEFAULT_MAX_ITEMS;
use crate::parser::{DecodeOptions, ParseOptions};
use crate::store::DEFAULT_STORE_DIR;
use crate::transform::pipeline::{MigrateMode, MigrationOptions};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default preferred encoding label.
pub const DEFAULT_ENCODING: &str = "shift_jis";

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Entry store directory
    pub data_dir: PathBuf,
    /// Preferred CSV encoding label
    pub encoding: String,
    /// Skip lines with unbalanced quotes
    pub skip_malformed: bool,
    /// Piece/member columns in the CSV export
    pub export_max_items: usize,
    /// Directory served under `/images`
    pub image_dir: Option<PathBuf>,
    pub port: u16,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_STORE_DIR),
            encoding: DEFAULT_ENCODING.to_string(),
            skip_malformed: false,
            export_max_items: DEFAULT_MAX_ITEMS,
            image_dir: None,
            port: DEFAULT_PORT,
        }
    }
}

impl ArchiveConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            data_dir: lookup("ARCHIVE_DATA_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            encoding: lookup("ARCHIVE_ENCODING")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.encoding),
            skip_malformed: lookup("ARCHIVE_SKIP_MALFORMED")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.skip_malformed),
            export_max_items: lookup("ARCHIVE_EXPORT_MAX_ITEMS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.export_max_items),
            image_dir: lookup("ARCHIVE_IMAGE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// Pipeline options for this configuration.
    pub fn migration_options(&self, mode: MigrateMode) -> Result<MigrationOptions, DecodeError> {
        Ok(MigrationOptions {
            decode: DecodeOptions::with_preferred_label(&self.encoding)?,
            parse: ParseOptions {
                skip_malformed: self.skip_malformed,
                ..ParseOptions::default()
            },
            mode,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::from_lookup(|_| None);
        assert_eq!(config.port, 3000);
        assert_eq!(config.encoding, "shift_jis");
        assert_eq!(config.export_max_items, 5);
        assert!(!config.skip_malformed);
        assert!(config.image_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[
            ("ARCHIVE_DATA_DIR", "/tmp/archive"),
            ("ARCHIVE_ENCODING", "euc-jp"),
            ("ARCHIVE_SKIP_MALFORMED", "yes"),
            ("ARCHIVE_EXPORT_MAX_ITEMS", "8"),
            ("PORT", "8080"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/archive"));
        assert!(config.skip_malformed);
        assert_eq!(config.export_max_items, 8);
        assert_eq!(config.port, 8080);

        let options = config.migration_options(MigrateMode::Upsert).unwrap();
        assert_eq!(options.decode.preferred, encoding_rs::EUC_JP);
        assert!(options.parse.skip_malformed);
        assert_eq!(options.mode, MigrateMode::Upsert);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ArchiveConfig::from_lookup(lookup_from(&[
            ("PORT", "http"),
            ("ARCHIVE_EXPORT_MAX_ITEMS", "-1"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.export_max_items, 5);
    }

    #[test]
    fn test_unknown_encoding_is_an_error() {
        let config = ArchiveConfig {
            encoding: "klingon".into(),
            ..ArchiveConfig::default()
        };
        assert!(config.migration_options(MigrateMode::Replace).is_err());
    }
}
