//! Command handlers

pub mod config;
pub mod quote;
pub mod shell;
pub mod status;
pub mod sync;
pub mod transfer;

use quotes_core::Library;

use crate::output::Output;

/// Warn about a save that failed during the last command
///
/// The in-memory change stands; only persistence failed.
pub fn report_storage_error(library: &mut Library, output: &Output) {
    let Some(error) = library.take_storage_error() else {
        return;
    };
    output.warn(&format!("Changes were not saved: {}", error));
    if let Some(suggestion) = error.recovery_suggestion() {
        output.warn(suggestion);
    }
}
