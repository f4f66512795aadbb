//! The record store.
//!
//! [`Store`] owns the in-memory mapping of id to [`Record`] and keeps it in
//! step with its [`BackingFile`]. Every mutation is applied in memory,
//! persisted, and undone if the save fails, so memory and disk agree after
//! each call returns. Mutations and loads report an [`Outcome`]; queries hand
//! back copies.
//!
//! Nothing is written until a load has produced a mapping the file agrees
//! with, so a file that was never read cannot be overwritten.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::export::{self, ExportOptions};
use crate::outcome::Outcome;
use crate::record::{Record, RecordPatch};
use crate::storage::{BackingFile, LoadSource, Loaded};

/// An inventory kept consistent with one backing file.
///
/// Not safe for concurrent use; wrap it in a `Mutex` to share it between threads.
#[derive(Debug)]
pub struct Store {
    records: BTreeMap<String, Record>,
    file: BackingFile,
    last_load: Option<Outcome>,
    /// True once the mapping reflects the backing file.
    loaded: bool,
}

impl Store {
    /// Create an empty, unloaded store backed by `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_backing_file(BackingFile::new(path))
    }

    /// Create an empty, unloaded store over an existing backing file handle.
    #[must_use]
    pub fn with_backing_file(file: BackingFile) -> Self {
        Self {
            records: BTreeMap::new(),
            file,
            last_load: None,
            loaded: false,
        }
    }

    /// Create an empty, unloaded store as described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_backing_file(
            BackingFile::new(config.data_file()).with_pretty(config.storage.pretty),
        )
    }

    /// Create a store backed by `path` and load it.
    ///
    /// The load outcome is available from [`Store::load_message`].
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    /// Get the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The outcome of the most recent [`Store::load`], if any.
    #[must_use]
    pub fn load_message(&self) -> Option<&Outcome> {
        self.last_load.as_ref()
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Populate the store from its backing file.
    ///
    /// A missing file is created. A corrupt file is backed up and replaced,
    /// and the store ends up empty. A file that cannot be read leaves the
    /// mapping as it was, and writes are refused until a later load succeeds.
    pub fn load(&mut self) -> Outcome {
        let outcome = match self.file.load() {
            Ok(loaded) => {
                self.loaded = true;
                self.accept(loaded)
            }
            Err(err) => {
                // After recovery the original bytes live in the backup.
                self.loaded = err.kind() == ErrorKind::CorruptData;
                if self.loaded {
                    self.records.clear();
                }
                warn!("Load of {} failed: {}", self.path().display(), err);
                Outcome::failure(&err)
            }
        };
        self.last_load = Some(outcome.clone());
        outcome
    }

    fn accept(&mut self, loaded: Loaded) -> Outcome {
        self.records = loaded.records;
        let path = self.file.path().display();
        match loaded.source {
            LoadSource::Created => Outcome::success(format!(
                "no data file at '{path}'; created a new empty one"
            )),
            LoadSource::Existing if loaded.skipped > 0 => Outcome::success(format!(
                "loaded {} records from '{path}' ({} unusable entries skipped)",
                self.records.len(),
                loaded.skipped
            )),
            LoadSource::Existing => Outcome::success(format!(
                "loaded {} records from '{path}'",
                self.records.len()
            )),
        }
    }

    /// Write the current mapping to the backing file.
    ///
    /// Mutations save on their own; this is for retrying durability.
    pub fn save(&self) -> Outcome {
        if let Err(err) = self.ensure_loaded() {
            return Outcome::failure(&err);
        }
        match self.persist() {
            Ok(()) => Outcome::success(format!(
                "saved {} records to '{}'",
                self.records.len(),
                self.path().display()
            )),
            Err(err) => Outcome::failure(&err),
        }
    }

    fn persist(&self) -> Result<()> {
        self.file.save(self.records.values())
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        Err(Error::NotLoaded {
            path: self.path().to_path_buf(),
            last_failure: self.last_load.as_ref().and_then(|outcome| outcome.kind),
        })
    }

    /// Add a new record.
    ///
    /// Fails with `DuplicateId` if the id is taken and `InvalidValue` if a
    /// field is blank or negative. If the save fails the record is taken
    /// back out.
    pub fn add(&mut self, record: Record) -> Outcome {
        if let Err(err) = self.ensure_loaded() {
            return Outcome::failure(&err);
        }
        let id = record.id.trim();
        if !id.is_empty() && self.records.contains_key(id) {
            return Outcome::failure(&Error::duplicate_id(id));
        }
        let record = match record.normalized() {
            Ok(record) => record,
            Err(err) => return Outcome::failure(&err),
        };

        let id = record.id.clone();
        let name = record.name.clone();
        self.records.insert(id.clone(), record);

        if let Err(err) = self.persist() {
            self.records.remove(&id);
            warn!("Rolled back add of '{}': {}", id, err);
            let context = format!("record '{id}' was not added");
            return Outcome::failure_with_context(&context, &err);
        }
        info!("Added record '{}'", id);
        Outcome::success(format!("record '{id}' ({name}) added and saved"))
    }

    /// Change some fields of an existing record.
    ///
    /// The patch is validated in full before anything changes. If the save
    /// fails the previous record is put back.
    pub fn update(&mut self, id: &str, patch: &RecordPatch) -> Outcome {
        if let Err(err) = self.ensure_loaded() {
            return Outcome::failure(&err);
        }
        let id = id.trim();
        let Some(current) = self.records.get(id) else {
            return Outcome::failure(&Error::not_found(id));
        };
        if patch.is_empty() {
            return Outcome::success(format!("no changes supplied for record '{id}'"));
        }
        let updated = match patch.apply_to(current) {
            Ok(updated) => updated,
            Err(err) => return Outcome::failure(&err),
        };

        let previous = self.records.insert(id.to_string(), updated);

        if let Err(err) = self.persist() {
            if let Some(previous) = previous {
                self.records.insert(id.to_string(), previous);
            }
            warn!("Rolled back update of '{}': {}", id, err);
            let context = format!("record '{id}' was not updated");
            return Outcome::failure_with_context(&context, &err);
        }
        info!("Updated record '{}'", id);
        Outcome::success(format!("record '{id}' updated and saved"))
    }

    /// Delete a record. If the save fails the record is restored.
    pub fn remove(&mut self, id: &str) -> Outcome {
        if let Err(err) = self.ensure_loaded() {
            return Outcome::failure(&err);
        }
        let id = id.trim();
        let Some(removed) = self.records.remove(id) else {
            return Outcome::failure(&Error::not_found(id));
        };

        if let Err(err) = self.persist() {
            warn!("Rolled back removal of '{}': {}", id, err);
            self.records.insert(id.to_string(), removed);
            let context = format!("record '{id}' was not removed");
            return Outcome::failure_with_context(&context, &err);
        }
        info!("Removed record '{}'", id);
        Outcome::success(format!("record '{id}' ({}) removed and saved", removed.name))
    }

    /// Look up a record by id.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Record> {
        self.records.get(id.trim()).cloned()
    }

    /// Records whose name contains `query`, ignoring case. An empty query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Record> {
        let needle = query.trim().to_lowercase();
        let found: Vec<Record> = self
            .records
            .values()
            .filter(|record| record.name_contains(&needle))
            .cloned()
            .collect();
        debug!("Search for '{}' matched {} records", needle, found.len());
        found
    }

    /// All records, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<Record> {
        self.records.values().cloned().collect()
    }

    /// Borrow the records in id order without copying.
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.values()
    }

    /// Write every record to a CSV file at `path`.
    pub fn export_csv(&self, path: impl AsRef<Path>, options: &ExportOptions) -> Outcome {
        let path = path.as_ref();
        match export::write_csv(self.records.values(), path, options) {
            Ok(count) => Outcome::success(format!(
                "exported {count} records to '{}'",
                path.display()
            )),
            Err(err) => Outcome::failure_with_context("export failed", &err),
        }
    }
}
