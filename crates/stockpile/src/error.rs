//! Error types for stockpile.
//!
//! Every failure the store can report is one variant of [`Error`]. Each
//! variant maps onto an [`ErrorKind`] tag so callers can branch on the kind
//! of failure without matching on message text.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// The category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A supplied value is negative, non-finite, or a required text field is blank.
    InvalidValue,
    /// An add referenced an id that is already present.
    DuplicateId,
    /// An update, remove or lookup referenced an absent id.
    NotFound,
    /// The process lacks rights to read or write a file.
    PermissionDenied,
    /// The backing file does not parse as a sequence of records.
    CorruptData,
    /// Any other I/O failure.
    SystemIo,
    /// Configuration could not be loaded or is invalid.
    Configuration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue => write!(f, "invalid_value"),
            Self::DuplicateId => write!(f, "duplicate_id"),
            Self::NotFound => write!(f, "not_found"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::CorruptData => write!(f, "corrupt_data"),
            Self::SystemIo => write!(f, "system_io"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// What the process was doing with a file when an I/O error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Reading an existing file.
    Read,
    /// Writing a file in place of an existing one.
    Write,
    /// Creating a file that did not exist.
    Create,
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "reading"),
            Self::Write => write!(f, "writing"),
            Self::Create => write!(f, "creating"),
        }
    }
}

/// The main error type for stockpile operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A field value was rejected before any mutation.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Description of what is wrong with it.
        message: String,
    },

    /// A record with this id already exists.
    #[error("a record with id '{id}' already exists")]
    DuplicateId {
        /// The conflicting id.
        id: String,
    },

    /// No record with this id exists.
    #[error("no record with id '{id}'")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    // === File Errors ===
    /// The process lacks permission for a file operation.
    #[error(
        "permission denied {action} '{path}'; check the file permissions and that no other program holds it locked"
    )]
    PermissionDenied {
        /// The file involved.
        path: PathBuf,
        /// What was being attempted.
        action: FileAction,
    },

    /// Any other file system failure.
    #[error("system error {action} '{path}': {source}")]
    SystemIo {
        /// The file involved.
        path: PathBuf,
        /// What was being attempted.
        action: FileAction,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the directory that holds a file.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Corruption ===
    /// The backing file was corrupt; it was moved aside and replaced with an empty one.
    #[error("data file '{path}' was corrupt ({reason}); backup at {backup}; reset to empty")]
    CorruptData {
        /// The backing file.
        path: PathBuf,
        /// Where the corrupt bytes were preserved.
        backup: BackupLocation,
        /// Why the content was rejected.
        reason: String,
    },

    /// The backing file was corrupt and the empty replacement could not be written.
    #[error("data file '{path}' was corrupt ({reason}); backup at {backup}; could not reset it: {source}")]
    CorruptUnrecovered {
        /// The backing file.
        path: PathBuf,
        /// Where the corrupt bytes were preserved.
        backup: BackupLocation,
        /// Why the content was rejected.
        reason: String,
        /// The failure writing the replacement.
        #[source]
        source: Box<Error>,
    },

    /// The backing file has not been read, so writing it could discard records.
    #[error("refusing to write '{path}' before it has been loaded successfully")]
    NotLoaded {
        /// The backing file.
        path: PathBuf,
        /// Kind of the failed load, if one was attempted.
        last_failure: Option<ErrorKind>,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Where a corrupt backing file was preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupLocation {
    /// The corrupt file now lives at this path.
    Saved(PathBuf),
    /// Neither moving nor copying the corrupt file succeeded.
    Unavailable,
}

impl std::fmt::Display for BackupLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saved(path) => write!(f, "'{}'", path.display()),
            Self::Unavailable => write!(f, "(backup could not be created)"),
        }
    }
}

/// A specialized Result type for stockpile operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid value error for the named field.
    #[must_use]
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }

    /// Create a duplicate id error.
    #[must_use]
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Classify an I/O error on `path` into `PermissionDenied` or `SystemIo`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, action: FileAction, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, action }
        } else {
            Self::SystemIo {
                path,
                action,
                source,
            }
        }
    }

    /// The taxonomy tag for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::DuplicateId { .. } => ErrorKind::DuplicateId,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::SystemIo { .. } => ErrorKind::SystemIo,
            Self::DirectoryCreate { source, .. } => {
                if source.kind() == std::io::ErrorKind::PermissionDenied {
                    ErrorKind::PermissionDenied
                } else {
                    ErrorKind::SystemIo
                }
            }
            Self::CorruptData { .. } | Self::CorruptUnrecovered { .. } => ErrorKind::CorruptData,
            // A store that was never loaded is treated as an I/O precondition failure.
            Self::NotLoaded { last_failure, .. } => last_failure.unwrap_or(ErrorKind::SystemIo),
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Configuration,
        }
    }
}
