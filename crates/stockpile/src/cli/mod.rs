//! Command-line interface for stockpile.
//!
//! This module provides the CLI structure and output rendering for the
//! `stockpile` binary.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, ExportCommand, ListCommand, OutputFormat, RemoveCommand,
    SearchCommand, ShowCommand, StatusCommand, UpdateCommand,
};

use crate::logging::Verbosity;

/// stockpile - Keep a small inventory in a durable file
///
/// Records are identified by id and carry a name, quantity and unit price.
/// Every change is saved before the command returns.
#[derive(Debug, Parser)]
#[command(name = "stockpile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backing data file (overrides the configuration)
    #[arg(short = 'f', long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all records
    List(ListCommand),

    /// Show one record
    Show(ShowCommand),

    /// Add a new record
    Add(AddCommand),

    /// Change fields of an existing record
    Update(UpdateCommand),

    /// Delete a record
    Remove(RemoveCommand),

    /// Find records by name
    Search(SearchCommand),

    /// Write all records to a CSV file
    Export(ExportCommand),

    /// Show the data file and load status
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
