//! Text rendering for command output.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use super::commands::OutputFormat;
use crate::outcome::Outcome;
use crate::record::Record;

const TABLE_HEADERS: [&str; 4] = ["ID", "NAME", "QUANTITY", "PRICE"];

/// Render a list of records.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn records(records: &[Record], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(records),
        _ if records.is_empty() => Ok("no records".to_string()),
        OutputFormat::Plain => Ok(records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Table => Ok(table(records)),
    }
}

/// Render a single record.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn record(record: &Record, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(record),
        OutputFormat::Plain => Ok(record.to_string()),
        OutputFormat::Table => Ok(table(std::slice::from_ref(record))),
    }
}

fn table(records: &[Record]) -> String {
    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                r.id.clone(),
                r.name.clone(),
                r.quantity.to_string(),
                format!("{:.2}", r.price),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = TABLE_HEADERS.map(String::from);
    for row in std::iter::once(&header).chain(&rows) {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {:>w2$}  {:>w3$}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// What `status` reports.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// The backing file in use.
    pub data_file: PathBuf,
    /// Number of records loaded.
    pub records: usize,
    /// How loading went.
    pub load: Outcome,
}

/// Render a status report.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn status(report: &StatusReport, json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string_pretty(report);
    }
    let state = if report.load.ok { "ok" } else { "failed" };
    Ok(format!(
        "stockpile status\n\
         ----------------\n\
         Data file:  {}\n\
         Records:    {}\n\
         Load:       {state}\n\
         Message:    {}",
        report.data_file.display(),
        report.records,
        report.load.message
    ))
}
