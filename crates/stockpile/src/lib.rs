//! `stockpile` - A durable, file-backed inventory record store
//!
//! This library keeps a keyed collection of inventory records in memory and
//! mirrors every change to a JSON backing file with atomic replacement. A
//! corrupt backing file is preserved under a timestamped name and reset, so
//! the store always starts from a usable state.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod outcome;
pub mod record;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use export::ExportOptions;
pub use logging::init_logging;
pub use outcome::Outcome;
pub use record::{Record, RecordPatch};
pub use storage::BackingFile;
pub use store::Store;
