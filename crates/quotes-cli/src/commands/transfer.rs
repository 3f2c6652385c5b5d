//! Export and import command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use quotes_core::transfer::export_file_name;
use quotes_core::Library;

use crate::output::Output;

/// Export every quote to a JSON file
///
/// Writes to `quotes-export-<date>.json` in the current directory unless a
/// path is given; `-` writes to stdout.
pub fn export(
    library: &Library,
    path: Option<PathBuf>,
    compact: bool,
    output: &Output,
) -> Result<()> {
    let json = library.export(!compact);

    if path.as_deref().is_some_and(|p| p.as_os_str() == "-") {
        println!("{}", json);
        return Ok(());
    }

    let path = path.unwrap_or_else(|| {
        PathBuf::from(export_file_name(chrono::Local::now().date_naive()))
    });
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write export file: {:?}", path))?;

    output.report(
        &serde_json::json!({
            "path": path,
            "count": library.quotes().len(),
        }),
        &format!(
            "Exported {} quotes to {}",
            library.quotes().len(),
            path.display()
        ),
    );
    Ok(())
}

/// Import quotes from a JSON file
pub fn import(library: &mut Library, path: PathBuf, output: &Output) -> Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read import file: {:?}", path))?;

    let report = library
        .import(&content)
        .with_context(|| format!("Could not import {}", path.display()))?;

    let mut message = format!("Imported {} quotes", report.added);
    if report.skipped > 0 {
        message.push_str(&format!(" ({} duplicates skipped)", report.skipped));
    }
    output.report(
        &serde_json::json!({
            "valid": report.valid,
            "added": report.added,
            "skipped": report.skipped,
        }),
        &message,
    );
    Ok(())
}
