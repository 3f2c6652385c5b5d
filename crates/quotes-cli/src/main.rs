//! Quotes CLI
//!
//! Command-line interface for quotes - a categorized quote collection with
//! filtering, import/export and server sync.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotes_core::{Config, Library};

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

/// Environment variable holding the log level
const LOG_ENV: &str = "QUOTES_LOG";

#[derive(Parser)]
#[command(name = "quotes")]
#[command(about = "Quotes - a categorized quote collection with server sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a random quote (default)
    Random {
        /// Pick from this category instead of the saved filter
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a quote
    Add {
        /// Quote text
        text: String,
        /// Category to file it under
        #[arg(short, long)]
        category: String,
    },
    /// List quotes
    #[command(alias = "ls")]
    List {
        /// Filter by category (saved as the current filter)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a quote by its list position
    #[command(alias = "rm")]
    Delete {
        /// Position as shown by `list` (1-based)
        position: usize,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List categories with quote counts
    Categories,
    /// Show, set or clear the category filter
    Filter {
        /// Category to filter by ("all" for every quote)
        category: Option<String>,
        /// Forget the saved filter
        #[arg(long, conflicts_with = "category")]
        clear: bool,
    },
    /// Export quotes to a JSON file
    Export {
        /// Output path ("-" for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },
    /// Import quotes from a JSON file
    Import {
        /// File containing a JSON array of quotes
        path: PathBuf,
    },
    /// Delete every quote
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace every quote with the defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Sync with the remote server
    Sync,
    /// Show pending sync conflicts
    Conflicts,
    /// Resolve pending conflicts using server data
    Resolve,
    /// Show status (counts, last sync, storage)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Start an interactive session
    Shell {
        /// Sync with the server on a timer
        #[arg(long)]
        auto_sync: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (sync_url, sync_interval_secs, push_enabled, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output).await {
        output.error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    // Config commands work on the file without opening the library
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config);

    let mut library = Library::open_with_config(config)?;

    let command = cli.command.unwrap_or(Commands::Random { category: None });
    let result = run_command(command, &mut library, output).await;

    commands::report_storage_error(&mut library, output);
    result
}

async fn run_command(command: Commands, library: &mut Library, output: &Output) -> Result<()> {
    match command {
        Commands::Random { category } => commands::quote::random(library, category, output),
        Commands::Add { text, category } => commands::quote::add(library, text, category, output),
        Commands::List { category } => commands::quote::list(library, category, output),
        Commands::Delete { position, yes } => {
            commands::quote::delete(library, position, yes, output)
        }
        Commands::Categories => commands::quote::categories(library, output),
        Commands::Filter { category, clear } => {
            commands::quote::filter(library, category, clear, output)
        }
        Commands::Export {
            output: path,
            compact,
        } => commands::transfer::export(library, path, compact, output),
        Commands::Import { path } => commands::transfer::import(library, path, output),
        Commands::Clear { yes } => commands::quote::clear(library, yes, output),
        Commands::Reset { yes } => commands::quote::reset(library, yes, output),
        Commands::Sync => commands::sync::sync(library, output).await,
        Commands::Conflicts => commands::sync::conflicts(library, output),
        Commands::Resolve => commands::sync::resolve(library, output),
        Commands::Status => commands::status::show(library, None, None, output),
        Commands::Config { .. } => unreachable!(), // Handled in main
        Commands::Shell { auto_sync } => commands::shell::run(library, auto_sync, output).await,
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Level comes from QUOTES_LOG (default "warn"). Logs go to stderr, or
/// are appended to `log_file` when one is configured.
fn init_logging(config: &Config) {
    let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!(
        "quotes_core={},quotes_cli={}",
        log_level, log_level
    ));

    let Some(log_path) = &config.log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();

    info!("logging to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["quotes", "add", "Less is more.", "-c", "Design"]).unwrap();
        match cli.command {
            Some(Commands::Add { text, category }) => {
                assert_eq!(text, "Less is more.");
                assert_eq!(category, "Design");
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_filter_clear_conflicts_with_category() {
        assert!(Cli::try_parse_from(["quotes", "filter", "Life", "--clear"]).is_err());
        assert!(Cli::try_parse_from(["quotes", "filter", "--clear"]).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quotes", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::List { category: None })));
    }
}
