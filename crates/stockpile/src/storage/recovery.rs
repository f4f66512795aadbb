//! Preservation of corrupt backing files.
//!
//! A corrupt file is moved aside to `<stem>.corrupt-<YYYYMMDD-HHMMSS><ext>` in
//! its own directory before the store resets to an empty file. If the move
//! fails the bytes are copied instead.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::error::BackupLocation;

/// Timestamp layout used in backup names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Extension given to backups of files that have none.
const DEFAULT_EXTENSION: &str = "json";

/// Build the backup path for `path` at time `at`.
///
/// `counter` disambiguates backups taken within the same second; zero means
/// no suffix.
#[must_use]
pub fn backup_path(path: &Path, at: NaiveDateTime, counter: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| OsString::from("inventory"), OsString::from);
    let extension = path
        .extension()
        .map_or_else(|| OsString::from(DEFAULT_EXTENSION), OsString::from);

    let mut name = stem;
    name.push(".corrupt-");
    name.push(at.format(BACKUP_TIMESTAMP_FORMAT).to_string());
    if counter > 0 {
        name.push(format!("-{counter}"));
    }
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

/// The first backup path for `path` at `at` that does not exist yet.
#[must_use]
pub fn unused_backup_path(path: &Path, at: NaiveDateTime) -> PathBuf {
    let mut counter = 0;
    loop {
        let candidate = backup_path(path, at, counter);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Move the corrupt file at `path` aside, falling back to a copy.
///
/// Never fails; a backup that could be neither moved nor copied is reported
/// as [`BackupLocation::Unavailable`].
pub fn preserve(path: &Path) -> BackupLocation {
    let target = unused_backup_path(path, Local::now().naive_local());

    match fs::rename(path, &target) {
        Ok(()) => {
            info!(
                "Moved corrupt data file {} to {}",
                path.display(),
                target.display()
            );
            BackupLocation::Saved(target)
        }
        Err(rename_err) => {
            warn!(
                "Could not move corrupt data file {} ({}), copying instead",
                path.display(),
                rename_err
            );
            match fs::copy(path, &target) {
                Ok(_) => {
                    info!(
                        "Copied corrupt data file {} to {}",
                        path.display(),
                        target.display()
                    );
                    BackupLocation::Saved(target)
                }
                Err(copy_err) => {
                    error!(
                        "Could not back up corrupt data file {}: {}",
                        path.display(),
                        copy_err
                    );
                    BackupLocation::Unavailable
                }
            }
        }
    }
}
