//! Sync command handlers

use anyhow::{Context, Result};

use quotes_core::sync::{HttpRemote, RemoteSource};
use quotes_core::{Library, SyncEngine, SyncOutcome, SyncReport};

use crate::output::Output;

/// Sync with the remote server
pub async fn sync(library: &mut Library, output: &Output) -> Result<()> {
    let engine = engine_for(library)?;
    output.message(&format!("Syncing with {}...", engine.remote().url()));
    run(&engine, library, output).await
}

/// Build an HTTP sync engine from the library's configuration
pub fn engine_for(library: &Library) -> Result<SyncEngine<HttpRemote>> {
    SyncEngine::from_config(library.config()).context("Failed to set up sync")
}

/// Run one sync with an existing engine and report the outcome
pub async fn run<R: RemoteSource>(
    engine: &SyncEngine<R>,
    library: &mut Library,
    output: &Output,
) -> Result<()> {
    match engine.sync(library).await? {
        SyncOutcome::Completed(report) => {
            output.report(&report, &summary(&report));
            if report.conflicts > 0 {
                output.message("Run `quotes conflicts` to review them.");
            }
        }
        SyncOutcome::AlreadyRunning => output.message("Sync already in progress."),
    }
    Ok(())
}

/// One-line description of a completed sync
pub fn summary(report: &SyncReport) -> String {
    let mut text = format!("Synced: {} new quote(s)", report.added);
    if report.conflicts > 0 {
        text.push_str(&format!(", {} conflict(s) pending", report.conflicts));
    }
    if report.pushed > 0 {
        text.push_str(&format!(", {} sent", report.pushed));
    }
    text
}

/// Show pending conflicts
pub fn conflicts(library: &Library, output: &Output) -> Result<()> {
    output.print_conflicts(library.pending_conflicts());
    Ok(())
}

/// Accept the server version of every pending conflict
pub fn resolve(library: &mut Library, output: &Output) -> Result<()> {
    let report = library.resolve_conflicts();

    if report.resolved == 0 && report.remaining == 0 {
        output.message("No conflicts to resolve.");
        return Ok(());
    }

    let mut message = format!("Resolved {} conflict(s) using server data", report.resolved);
    if report.remaining > 0 {
        message.push_str(&format!(
            "; {} left because the local quote changed",
            report.remaining
        ));
    }
    output.report(&report, &message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let report = SyncReport {
            fetched: 10,
            pushed: 0,
            added: 3,
            conflicts: 0,
        };
        assert_eq!(summary(&report), "Synced: 3 new quote(s)");

        let report = SyncReport {
            fetched: 10,
            pushed: 5,
            added: 0,
            conflicts: 2,
        };
        assert_eq!(
            summary(&report),
            "Synced: 0 new quote(s), 2 conflict(s) pending, 5 sent"
        );
    }
}
