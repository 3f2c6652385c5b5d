//! Status command handler

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};

use quotes_core::{Library, SyncStatus};

use crate::output::{Output, OutputFormat};

/// Show status information
///
/// `auto_sync` is the interval of a running auto-sync timer, if any.
/// `connection` is the sync engine's status when one is alive, as in the
/// shell; one-shot commands have no connection to report.
pub fn show(
    library: &Library,
    auto_sync: Option<Duration>,
    connection: Option<SyncStatus>,
    output: &Output,
) -> Result<()> {
    let config = library.config();
    let quotes = library.quotes();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "quotes": quotes.len(),
                    "categories": library.categories(),
                    "filter": library.selected_filter().to_string(),
                    "last_updated": library.last_updated(),
                    "last_sync": library.last_sync(),
                    "pending_conflicts": library.pending_conflicts().len(),
                    "sync": {
                        "url": config.sync_url,
                        "interval_secs": config.sync_interval_secs,
                        "push_enabled": config.push_enabled,
                        "auto_sync": auto_sync.map(|d| d.as_secs()),
                        "connection": connection,
                    },
                    "storage": config.storage_dir(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", quotes.len());
        }
        OutputFormat::Human => {
            println!("Quotes Status");
            println!("=============");
            println!();
            println!("Collection:");
            println!("  Quotes:     {}", quotes.len());
            println!("  Categories: {}", library.categories().len());
            println!("  Filter:     {}", library.selected_filter());
            println!("  Updated:    {}", format_time(library.last_updated()));
            println!();
            println!("Sync:");
            println!("  Server:     {}", config.sync_url);
            println!("  Connection: {}", connection_label(connection));
            println!("  Last sync:  {}", format_time(library.last_sync()));
            println!("  Conflicts:  {}", library.pending_conflicts().len());
            match auto_sync {
                Some(interval) => println!("  Auto sync:  every {}s", interval.as_secs()),
                None => println!("  Auto sync:  off"),
            }
            println!();
            println!("Storage:");
            println!("  Location:   {}", config.storage_dir().display());
        }
    }

    Ok(())
}

fn connection_label(connection: Option<SyncStatus>) -> String {
    connection
        .map(|status| status.to_string())
        .unwrap_or_else(|| "not checked".to_string())
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotes_core::Config;
    use tempfile::TempDir;

    use crate::commands::sync;
    use crate::output::OutputFormat;

    #[test]
    fn test_connection_label() {
        assert_eq!(connection_label(None), "not checked");
        assert_eq!(connection_label(Some(SyncStatus::Online)), "online");
        assert_eq!(connection_label(Some(SyncStatus::Offline)), "offline");
    }

    #[tokio::test]
    async fn test_failed_sync_shows_offline() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            // Nothing listens on the discard port
            sync_url: "http://127.0.0.1:9/posts".to_string(),
            sync_timeout_secs: 1,
            ..Config::default()
        };
        let mut library = Library::open_with_config(config).unwrap();
        let engine = sync::engine_for(&library).unwrap();
        let output = Output::new(OutputFormat::Quiet);

        assert_eq!(connection_label(Some(engine.status())), "online");
        assert!(sync::run(&engine, &mut library, &output).await.is_err());
        assert_eq!(connection_label(Some(engine.status())), "offline");

        show(&library, None, Some(engine.status()), &output).unwrap();
    }
}
