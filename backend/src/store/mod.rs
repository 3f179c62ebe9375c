//! Entry Store - Persist year entries on disk
//!
//! Each entry is one JSON file named after its id. Everything is loaded into
//! memory when the store is opened; every write goes straight to disk.
//!
//! Ids (v4 UUID) and timestamps are assigned here, never by the pipeline.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::logs::log_warning;
use crate::error::{StoreError, StoreResult};
use crate::models::{StoredEntry, YearEntry};

/// Directory where entries are stored (relative to current dir)
pub const DEFAULT_STORE_DIR: &str = ".jazz-archive/entries";

/// File-backed store of year entries
pub struct EntryStore {
    /// Directory where entries are stored
    store_dir: PathBuf,
    /// Loaded entries (id -> entry)
    entries: HashMap<String, StoredEntry>,
}

impl EntryStore {
    /// Open the default store
    pub fn new() -> StoreResult<Self> {
        Self::open(DEFAULT_STORE_DIR)
    }

    /// Open a store in a custom directory, loading existing entries
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let store_dir = PathBuf::from(dir.as_ref());
        fs::create_dir_all(&store_dir)?;

        let mut store = Self {
            store_dir,
            entries: HashMap::new(),
        };
        store.load_all()?;
        Ok(store)
    }

    /// Load all entries from the store directory.
    ///
    /// Unreadable files are skipped with a warning and left on disk.
    fn load_all(&mut self) -> StoreResult<()> {
        for dir_entry in fs::read_dir(&self.store_dir)?.flatten() {
            let path = dir_entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match read_entry(&path) {
                Ok(stored) => {
                    self.entries.insert(stored.id.clone(), stored);
                }
                Err(e) => log_warning(format!("Skipping {}: {}", path.display(), e)),
            }
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, newest year first; same-year entries by creation time
    pub fn list(&self) -> Vec<&StoredEntry> {
        let mut list: Vec<&StoredEntry> = self.entries.values().collect();
        list.sort_by(|a, b| {
            b.entry
                .year
                .cmp(&a.entry.year)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    /// Plain entries in list order
    pub fn year_entries(&self) -> Vec<YearEntry> {
        self.list().into_iter().map(|s| s.entry.clone()).collect()
    }

    /// Get an entry by ID
    pub fn get(&self, id: &str) -> StoreResult<&StoredEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// First entry matching both year and band
    pub fn find_by_year_and_band(&self, year: i32, band: &str) -> Option<&StoredEntry> {
        self.list()
            .into_iter()
            .find(|s| s.entry.year == year && s.entry.band == band)
    }

    /// Create a new entry and return it with its assigned id
    pub fn create(&mut self, entry: YearEntry) -> StoreResult<StoredEntry> {
        let entry = validate(entry)?;
        let now = chrono::Utc::now().to_rfc3339();
        let stored = StoredEntry {
            id: uuid::Uuid::new_v4().to_string(),
            entry,
            created_at: now.clone(),
            updated_at: now,
        };

        self.write(&stored)?;
        self.entries.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    /// Replace the content of an existing entry, keeping id and creation time
    pub fn update(&mut self, id: &str, entry: YearEntry) -> StoreResult<StoredEntry> {
        let entry = validate(entry)?;
        let existing = self.get(id)?;
        let stored = StoredEntry {
            id: existing.id.clone(),
            entry,
            created_at: existing.created_at.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };

        self.write(&stored)?;
        self.entries.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    /// Delete an entry
    pub fn delete(&mut self, id: &str) -> StoreResult<()> {
        if self.entries.remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let path = self.entry_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Delete everything, then insert `entries`. Returns the number inserted.
    pub fn replace_all(&mut self, entries: Vec<YearEntry>) -> StoreResult<usize> {
        let ids: Vec<String> = self.entries.keys().cloned().collect();
        for id in ids {
            self.delete(&id)?;
        }

        let mut inserted = 0;
        for entry in entries {
            self.create(entry)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Update entries matching on year + band, insert the rest.
    /// Returns `(created, updated)`.
    pub fn upsert_all(&mut self, entries: Vec<YearEntry>) -> StoreResult<(usize, usize)> {
        let mut created = 0;
        let mut updated = 0;

        for entry in entries {
            let existing_id = self
                .find_by_year_and_band(entry.year, &entry.band)
                .map(|s| s.id.clone());
            match existing_id {
                Some(id) => {
                    self.update(&id, entry)?;
                    updated += 1;
                }
                None => {
                    self.create(entry)?;
                    created += 1;
                }
            }
        }
        Ok((created, updated))
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", id))
    }

    fn write(&self, stored: &StoredEntry) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(stored)?;
        fs::write(self.entry_path(&stored.id), content)?;
        Ok(())
    }
}

fn read_entry(path: &Path) -> StoreResult<StoredEntry> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Tidy a payload and reject the ones the archive cannot display.
fn validate(entry: YearEntry) -> StoreResult<YearEntry> {
    let entry = entry.tidy();
    if entry.band.is_empty() {
        return Err(StoreError::InvalidEntry("band is empty".to_string()));
    }
    Ok(entry)
}
