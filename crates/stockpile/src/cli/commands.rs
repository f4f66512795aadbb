//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::{Record, RecordPatch};

/// Output format for commands that print records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per record
    #[default]
    Plain,
    /// Aligned columns with a header
    Table,
    /// JSON array
    Json,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Id of the record to show
    pub id: String,

    /// Output format
    #[arg(long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Unique id of the new record
    pub id: String,

    /// Display name
    pub name: String,

    /// Units in stock
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,

    /// Unit price
    #[arg(allow_negative_numbers = true)]
    pub price: f64,
}

impl AddCommand {
    /// The record described by these arguments, before validation.
    #[must_use]
    pub fn to_record(&self) -> Record {
        Record::new(self.id.as_str(), self.name.as_str(), self.quantity, self.price)
    }
}

/// Update command arguments. Omitted fields keep their current value.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Id of the record to change
    pub id: String,

    /// New display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New quantity
    #[arg(long, allow_negative_numbers = true)]
    pub quantity: Option<i64>,

    /// New unit price
    #[arg(short, long, allow_negative_numbers = true)]
    pub price: Option<f64>,
}

impl UpdateCommand {
    /// The patch described by these arguments.
    #[must_use]
    pub fn to_patch(&self) -> RecordPatch {
        RecordPatch {
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// Remove command arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Id of the record to delete
    pub id: String,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in record names (case-insensitive)
    pub query: String,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination CSV file (defaults to `export.csv_path` from the configuration)
    pub path: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_add_to_record() {
        let cmd = AddCommand {
            id: "A1".to_string(),
            name: "Pen".to_string(),
            quantity: 10,
            price: 1.5,
        };
        assert_eq!(cmd.to_record(), Record::new("A1", "Pen", 10, 1.5));
    }

    #[test]
    fn test_update_to_patch() {
        let cmd = UpdateCommand {
            id: "A1".to_string(),
            name: None,
            quantity: Some(4),
            price: None,
        };
        let patch = cmd.to_patch();
        assert_eq!(patch, RecordPatch::new().quantity(4));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_update_without_fields_is_empty_patch() {
        let cmd = UpdateCommand {
            id: "A1".to_string(),
            name: None,
            quantity: None,
            price: None,
        };
        assert!(cmd.to_patch().is_empty());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
