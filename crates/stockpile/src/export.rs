//! CSV export of the inventory.
//!
//! Output follows RFC 4180: CRLF line endings, and a field is quoted when it
//! contains the delimiter, a double quote, or a line break.

use std::borrow::Cow;
use std::path::Path;

use tracing::debug;

use crate::error::{FileAction, Result};
use crate::record::Record;
use crate::storage::atomic_write;

const HEADER: [&str; 4] = ["id", "name", "quantity", "price"];
const LINE_END: &str = "\r\n";

/// Formatting choices for an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field separator.
    pub delimiter: char,
    /// Digits after the decimal point in the price column.
    pub price_decimals: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            price_decimals: 2,
        }
    }
}

/// Render records as CSV text, header first.
#[must_use]
pub fn render_csv<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    options: &ExportOptions,
) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        HEADER.iter().map(|h| Cow::Borrowed(*h)),
        options.delimiter,
    );
    for record in records {
        let row = [
            Cow::Borrowed(record.id.as_str()),
            Cow::Borrowed(record.name.as_str()),
            Cow::Owned(record.quantity.to_string()),
            Cow::Owned(format!("{:.*}", options.price_decimals, record.price)),
        ];
        push_row(&mut out, row.into_iter(), options.delimiter);
    }
    out
}

/// Write records as CSV to `path`, replacing any existing file atomically.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns `PermissionDenied` or `SystemIo` if the file cannot be written.
pub fn write_csv<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    path: &Path,
    options: &ExportOptions,
) -> Result<usize> {
    let mut count = 0;
    let text = render_csv(records.into_iter().inspect(|_| count += 1), options);
    let action = if path.exists() {
        FileAction::Write
    } else {
        FileAction::Create
    };
    atomic_write(path, text.as_bytes(), action)?;
    debug!("Exported {} records to {}", count, path.display());
    Ok(count)
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = Cow<'a, str>>, delimiter: char) {
    for (i, value) in fields.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&quote(&value, delimiter));
    }
    out.push_str(LINE_END);
}

fn quote(value: &str, delimiter: char) -> Cow<'_, str> {
    let needs_quotes = value
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\r' || c == '\n');
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
