//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use quotes_core::categories::ALL;
use quotes_core::{CategoryFilter, Conflict, QuoteView};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single quote
    pub fn print_quote(&self, view: &QuoteView) {
        match self.format {
            OutputFormat::Human => {
                println!("\"{}\"", view.text);
                println!("  - {}", view.category);
            }
            OutputFormat::Json => print_json(&view.with_position()),
            OutputFormat::Quiet => println!("{}", view.text),
        }
    }

    /// Print a list of quotes with their 1-based positions
    ///
    /// `empty` is shown instead of the list when there is nothing to print.
    pub fn print_quotes(&self, views: &[QuoteView], empty: &str) {
        match self.format {
            OutputFormat::Human => {
                if views.is_empty() {
                    println!("{}", empty);
                    return;
                }
                for view in views {
                    println!(
                        "{:>3}. \"{}\" ({})",
                        view.index + 1,
                        truncate(&view.text, 70),
                        view.category
                    );
                }
                println!("\n{} quote(s)", views.len());
            }
            OutputFormat::Json => {
                let listed: Vec<_> = views.iter().map(QuoteView::with_position).collect();
                print_json(&listed);
            }
            OutputFormat::Quiet => {
                for view in views {
                    println!("{}", view.text);
                }
            }
        }
    }

    /// Print the category options with quote counts
    ///
    /// `all` is always listed first; the selected option is marked.
    pub fn print_categories(
        &self,
        counts: &[(String, usize)],
        total: usize,
        selected: &CategoryFilter,
    ) {
        match self.format {
            OutputFormat::Human => {
                let marker = |filter: &CategoryFilter| if filter == selected { "*" } else { " " };
                println!("{} {} ({})", marker(&CategoryFilter::All), ALL, total);
                for (name, count) in counts {
                    let filter = CategoryFilter::parse(name);
                    println!("{} {} ({})", marker(&filter), name, count);
                }
                println!("\n{} categor{}", counts.len(), plural_y(counts.len()));
            }
            OutputFormat::Json => {
                let categories: Vec<_> = counts
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&serde_json::json!({
                    "selected": selected.to_string(),
                    "total": total,
                    "categories": categories,
                }));
            }
            OutputFormat::Quiet => {
                for (name, _) in counts {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print pending sync conflicts
    pub fn print_conflicts(&self, conflicts: &[Conflict]) {
        match self.format {
            OutputFormat::Human => {
                if conflicts.is_empty() {
                    println!("No pending conflicts.");
                    return;
                }
                for (i, conflict) in conflicts.iter().enumerate() {
                    println!(
                        "{:>3}. \"{}\"",
                        i + 1,
                        truncate(&conflict.local.text, 60)
                    );
                    println!(
                        "     local: {}  server: {}  ({})",
                        conflict.local.category,
                        conflict.server.category,
                        conflict.timestamp.format("%Y-%m-%d %H:%M")
                    );
                }
                println!(
                    "\n{} conflict(s). Run `quotes resolve` to accept the server versions.",
                    conflicts.len()
                );
            }
            OutputFormat::Json => print_json(&conflicts),
            OutputFormat::Quiet => println!("{}", conflicts.len()),
        }
    }

    /// Print a serializable value as JSON, or a message for humans
    pub fn report<T: Serialize>(&self, value: &T, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => print_json(value),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an error notice
    ///
    /// Human and quiet modes write to stderr; JSON mode writes an error
    /// object to stdout.
    pub fn error(&self, error: &anyhow::Error) {
        match self.format {
            OutputFormat::Human => eprintln!("✗ {:#}", error),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "error", "message": format!("{:#}", error)})
                );
            }
            OutputFormat::Quiet => eprintln!("{:#}", error),
        }
    }

    /// Print a warning to stderr
    ///
    /// Shown in every mode except quiet so JSON on stdout stays parseable.
    pub fn warn(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// JSON form of a listed quote, with its 1-based position
#[derive(Serialize)]
struct ListedQuote<'a> {
    position: usize,
    text: &'a str,
    category: &'a str,
}

trait WithPosition {
    fn with_position(&self) -> ListedQuote<'_>;
}

impl WithPosition for QuoteView {
    fn with_position(&self) -> ListedQuote<'_> {
        ListedQuote {
            position: self.index + 1,
            text: &self.text,
            category: &self.category,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}

/// Truncate a string to `max_chars` characters, adding "..." if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_listed_quote_uses_one_based_position() {
        let view = QuoteView {
            index: 0,
            text: "A".to_string(),
            category: "X".to_string(),
        };
        let json = serde_json::to_value(view.with_position()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"position": 1, "text": "A", "category": "X"})
        );
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural_y(1), "y");
        assert_eq!(plural_y(3), "ies");
    }
}
