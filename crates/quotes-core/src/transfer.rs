//! Import and export of quote files
//!
//! The interchange format is a JSON array of `{text, category}` objects.
//! Import is lenient per entry (invalid entries are dropped) but strict
//! about the whole file: it must be an array with at least one valid quote.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::models::{Quote, ValidationError};

/// Serialize quotes for a file download
///
/// Pretty output uses two-space indentation.
pub fn export_json(quotes: &[Quote], pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(quotes)
    } else {
        serde_json::to_string(quotes)
    };
    // Quote holds only strings, encoding cannot fail
    result.unwrap_or_else(|_| "[]".to_string())
}

/// Suggested file name for an export made on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("quotes-export-{}.json", date.format("%Y-%m-%d"))
}

/// Parse an uploaded quote file
///
/// Keeps entries whose `text` and `category` are non-blank strings.
pub fn parse_import(content: &str) -> Result<Vec<Quote>, ValidationError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(ValidationError::NotAnArray);
    };

    let total = entries.len();
    let quotes: Vec<Quote> = entries.iter().filter_map(Quote::from_value).collect();
    debug!(total, valid = quotes.len(), "parsed import file");

    if quotes.is_empty() {
        return Err(ValidationError::NoValidQuotes);
    }
    Ok(quotes)
}

/// Outcome of importing a file into the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Valid entries found in the file
    pub valid: usize,
    /// Entries appended to the collection
    pub added: usize,
    /// Entries skipped as exact duplicates
    pub skipped: usize,
}
