//! Interactive shell
//!
//! Reads commands line by line from stdin while the auto-sync timer runs
//! in the background. The shell owns the session: the session store lives
//! as long as the shell, so `reload` shows what a fresh visit would see.

use std::io::Write;

use anyhow::Result;
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};

use quotes_core::sync::RemoteSource;
use quotes_core::{AutoSync, Library, SyncEngine, SyncOutcome};

use super::{quote, report_storage_error, status, sync};
use crate::output::Output;

const HELP: &str = "\
Commands:
  random [category]         show a random quote
  add <category> | <text>   add a quote
  list                      list quotes in the current filter
  filter [category|all]     show or change the filter
  categories                list categories
  delete <position>         delete a quote by its list position
  sync                      sync with the server now
  auto on|off               start or stop automatic sync
  conflicts                 show pending sync conflicts
  resolve                   accept server versions of conflicts
  status                    show status
  reload                    start a new visit in this session
  help                      show this help
  quit                      leave the shell";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Random(Option<String>),
    Add { category: String, text: String },
    List,
    Filter(Option<String>),
    Categories,
    Delete(usize),
    Sync,
    Auto(bool),
    Conflicts,
    Resolve,
    Status,
    Reload,
    Help,
    Quit,
}

/// Parse one input line; blank lines parse to `None`
pub fn parse(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let command = match word.to_lowercase().as_str() {
        "random" | "r" => ShellCommand::Random(arg),
        "add" => {
            let Some((category, text)) = rest.split_once('|') else {
                return Err("usage: add <category> | <text>".to_string());
            };
            ShellCommand::Add {
                category: category.trim().to_string(),
                text: text.trim().to_string(),
            }
        }
        "list" | "ls" => ShellCommand::List,
        "filter" => ShellCommand::Filter(arg),
        "categories" => ShellCommand::Categories,
        "delete" | "rm" => match rest.parse() {
            Ok(position) => ShellCommand::Delete(position),
            Err(_) => return Err("usage: delete <position>".to_string()),
        },
        "sync" => ShellCommand::Sync,
        "auto" => match rest {
            "on" => ShellCommand::Auto(true),
            "off" => ShellCommand::Auto(false),
            _ => return Err("usage: auto on|off".to_string()),
        },
        "conflicts" => ShellCommand::Conflicts,
        "resolve" => ShellCommand::Resolve,
        "status" => ShellCommand::Status,
        "reload" => ShellCommand::Reload,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("Unknown command: {} (try `help`)", other)),
    };
    Ok(Some(command))
}

/// Run the shell until `quit` or end of input
pub async fn run(library: &mut Library, auto_sync: bool, output: &Output) -> Result<()> {
    let engine = sync::engine_for(library)?;
    let (mut auto, mut ticks) = AutoSync::new();
    if auto_sync {
        auto.start(library.config().sync_interval());
    }

    greet(library, output);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        show_prompt(output)?;
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(Some(ShellCommand::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Err(e) = execute(command, library, &engine, &mut auto, output).await {
                            output.error(&e);
                        }
                        report_storage_error(library, output);
                    }
                    Ok(None) => {}
                    Err(usage) => eprintln!("{}", usage),
                }
            }
            Some(tick) = ticks.recv() => {
                if auto.is_current(&tick) {
                    background_sync(&engine, library, output).await;
                }
            }
        }
    }

    auto.stop();
    Ok(())
}

async fn execute<R: RemoteSource>(
    command: ShellCommand,
    library: &mut Library,
    engine: &SyncEngine<R>,
    auto: &mut AutoSync,
    output: &Output,
) -> Result<()> {
    match command {
        ShellCommand::Random(category) => quote::random(library, category, output),
        ShellCommand::Add { category, text } => quote::add(library, text, category, output),
        ShellCommand::List => quote::list(library, None, output),
        ShellCommand::Filter(Some(category)) => {
            quote::filter(library, Some(category), false, output)
        }
        ShellCommand::Filter(None) => {
            output.message(&format!(
                "Current filter: {} (options: {})",
                library.selected_filter(),
                library.category_index().options().join(", ")
            ));
            Ok(())
        }
        ShellCommand::Categories => quote::categories(library, output),
        // Stdin is the command stream, so no confirmation prompt
        ShellCommand::Delete(position) => quote::delete(library, position, true, output),
        ShellCommand::Sync => sync::run(engine, library, output).await,
        ShellCommand::Auto(true) => {
            let interval = library.config().sync_interval();
            auto.start(interval);
            output.success(&format!("Auto sync every {}s", interval.as_secs()));
            Ok(())
        }
        ShellCommand::Auto(false) => {
            if auto.stop() {
                output.success("Auto sync stopped");
            } else {
                output.message("Auto sync is not running.");
            }
            Ok(())
        }
        ShellCommand::Conflicts => sync::conflicts(library, output),
        ShellCommand::Resolve => sync::resolve(library, output),
        ShellCommand::Status => {
            status::show(library, auto.interval(), Some(engine.status()), output)
        }
        ShellCommand::Reload => {
            greet(library, output);
            Ok(())
        }
        ShellCommand::Help => {
            output.message(HELP);
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}

/// Sync on a timer tick, only speaking up when something changed
async fn background_sync<R: RemoteSource>(
    engine: &SyncEngine<R>,
    library: &mut Library,
    output: &Output,
) {
    match engine.sync(library).await {
        Ok(SyncOutcome::Completed(report)) => {
            if report.added > 0 || report.conflicts > 0 {
                output.message(&format!("\n{}", sync::summary(&report)));
            }
        }
        Ok(SyncOutcome::AlreadyRunning) => {}
        Err(e) => output.warn(&format!("Auto sync failed: {}", e)),
    }
    report_storage_error(library, output);
}

/// Start a visit: restore the session filter and say hello
fn greet(library: &mut Library, output: &Output) {
    for line in greeting(library) {
        output.message(&line);
    }
}

fn greeting(library: &mut Library) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(filter) = library.restore_session_filter() {
        lines.push(format!("Restored filter: {}", filter));
    }

    match library.touch_visit() {
        Some(previous) => {
            lines.push(format!(
                "Welcome back! Last visit: {}",
                previous.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ));
            if let Some(quote) = library.last_viewed() {
                lines.push(format!("Last viewed: {}", quote));
            }
        }
        None => lines.push("Welcome! Type `help` for commands.".to_string()),
    }
    lines
}

fn show_prompt(output: &Output) -> Result<()> {
    if output.should_prompt() {
        print!("> ");
        std::io::stdout().flush()?;
    }
    Ok(())
}
