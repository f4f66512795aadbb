//! Storage layer for stockpile.
//!
//! This module keeps the record mapping durable in a single JSON backing
//! file. Saves are atomic: the new content is written to a sibling temp
//! file, synced, and renamed over the backing file, so a reader only ever
//! sees a complete previous or complete next version. Loads recover from a
//! missing file by creating it and from a corrupt one by moving it aside.

pub mod format;
pub mod recovery;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, FileAction, Result};
use crate::record::Record;

/// How the backing file looked when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// No file existed; an empty one was created.
    Created,
    /// An existing, well-formed file was read.
    Existing,
}

/// The result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    /// The records, keyed by id.
    pub records: BTreeMap<String, Record>,
    /// Whether the file was created or read.
    pub source: LoadSource,
    /// Entries present in the file that were not admitted.
    pub skipped: usize,
}

impl Loaded {
    fn created() -> Self {
        Self {
            records: BTreeMap::new(),
            source: LoadSource::Created,
            skipped: 0,
        }
    }
}

/// The persistence engine for one backing file.
#[derive(Debug, Clone)]
pub struct BackingFile {
    /// Path to the backing file.
    path: PathBuf,
    /// Indent the JSON when writing.
    pretty: bool,
}

impl BackingFile {
    /// Create a handle for the backing file at `path`. Nothing is touched on disk.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pretty: true,
        }
    }

    /// Choose between indented and compact JSON.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Get the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the backing file with `records`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` or `SystemIo`. The backing file keeps its
    /// previous complete content on failure.
    pub fn save<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Result<()> {
        self.write(records, FileAction::Write)
    }

    /// Read the backing file, creating or recovering it as needed.
    ///
    /// | file | result |
    /// |---|---|
    /// | absent (or vanished before the read) | created empty, `Ok` |
    /// | well formed | `Ok` with the admitted records |
    /// | unreadable | `PermissionDenied` / `SystemIo`, nothing changed |
    /// | corrupt | moved to a backup, reset to empty, `CorruptData` |
    ///
    /// # Errors
    ///
    /// See the table above. A `CorruptData` error means recovery already ran
    /// and the backing file is now an empty list (unless the error is
    /// [`Error::CorruptUnrecovered`]).
    pub fn load(&self) -> Result<Loaded> {
        if !self.path.exists() {
            debug!("No data file at {}", self.path.display());
            return self.create_empty();
        }

        match fs::read(&self.path) {
            Ok(bytes) => self.decode_or_recover(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "Data file {} vanished before it could be read",
                    self.path.display()
                );
                self.create_empty()
            }
            Err(e) => Err(Error::io(&self.path, FileAction::Read, e)),
        }
    }

    fn decode_or_recover(&self, bytes: &[u8]) -> Result<Loaded> {
        match format::decode(bytes) {
            Ok(decoded) => {
                let skipped = decoded.blank_ids + decoded.out_of_range;
                info!(
                    "Loaded {} records from {}",
                    decoded.records.len(),
                    self.path.display()
                );
                if skipped > 0 {
                    debug!("Skipped {} entries without a usable id or values", skipped);
                }
                Ok(Loaded {
                    records: decoded.records,
                    source: LoadSource::Existing,
                    skipped,
                })
            }
            Err(reason) => {
                warn!("Data file {} is corrupt: {}", self.path.display(), reason);
                let backup = recovery::preserve(&self.path);
                let reason = reason.to_string();
                match self.write(std::iter::empty(), FileAction::Create) {
                    Ok(()) => Err(Error::CorruptData {
                        path: self.path.clone(),
                        backup,
                        reason,
                    }),
                    Err(source) => Err(Error::CorruptUnrecovered {
                        path: self.path.clone(),
                        backup,
                        reason,
                        source: Box::new(source),
                    }),
                }
            }
        }
    }

    fn create_empty(&self) -> Result<Loaded> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        self.write(std::iter::empty(), FileAction::Create)?;
        info!("Created empty data file at {}", self.path.display());
        Ok(Loaded::created())
    }

    fn write<'a>(
        &self,
        records: impl IntoIterator<Item = &'a Record>,
        action: FileAction,
    ) -> Result<()> {
        let bytes = format::encode(records, self.pretty)
            .map_err(|e| Error::io(&self.path, action, e.into()))?;
        atomic_write(&self.path, &bytes, action)
    }
}

/// Replace `path` with `bytes` via a synced sibling temp file and a rename.
///
/// # Errors
///
/// Returns `PermissionDenied` or `SystemIo` tagged with `action`. The temp
/// file is removed on failure and `path` is left as it was.
pub fn atomic_write(path: &Path, bytes: &[u8], action: FileAction) -> Result<()> {
    let tmp = temp_path(path);
    let result = write_synced(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, action, e));
    }
    sync_parent(path);
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// `<file-name>.tmp` in the same directory as `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

/// Flush the directory entry of a rename. Best effort.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        debug!("Could not sync directory {}: {}", parent.display(), e);
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
