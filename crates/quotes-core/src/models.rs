//! Data models for quotes
//!
//! Defines the core data structures: Quote and Conflict.
//! A quote has no identifier; two quotes are the same quote when both
//! `text` and `category` are equal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when user or file input does not describe valid quotes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required quote field is missing or blank
    #[error("Please enter both quote text and category (missing {0}).")]
    MissingField(&'static str),

    /// Position does not refer to a stored quote
    #[error("No quote at position {index} (collection has {len} quotes).")]
    IndexOutOfRange { index: usize, len: usize },

    /// Import payload is not JSON at all
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Import payload parsed but is not an array
    #[error("Invalid JSON format. Expected an array of quotes.")]
    NotAnArray,

    /// Import payload is an array without a single usable quote
    #[error("No valid quotes found in the file.")]
    NoValidQuotes,
}

/// A quote and the category it is filed under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawQuote")]
pub struct Quote {
    /// The quote itself
    pub text: String,
    /// Free-text grouping label
    pub category: String,
}

impl Quote {
    /// Create a quote, trimming both fields
    ///
    /// Fails if either field is empty after trimming.
    pub fn new(
        text: impl AsRef<str>,
        category: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();

        if text.is_empty() {
            return Err(ValidationError::MissingField("text"));
        }
        if category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    /// Build a quote from an arbitrary JSON value
    ///
    /// Returns `None` unless the value is an object whose `text` and
    /// `category` are non-blank strings. Other fields are ignored and both
    /// strings are trimmed.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let text = value.get("text")?.as_str()?;
        let category = value.get("category")?.as_str()?;
        Self::new(text, category).ok()
    }

    /// Same text, different category
    pub fn conflicts_with(&self, other: &Quote) -> bool {
        self.text == other.text && self.category != other.category
    }
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" ({})", self.text, self.category)
    }
}

/// Unvalidated wire shape of a quote
#[derive(Deserialize)]
struct RawQuote {
    text: String,
    category: String,
}

impl TryFrom<RawQuote> for Quote {
    type Error = ValidationError;

    fn try_from(raw: RawQuote) -> Result<Self, Self::Error> {
        Self::new(raw.text, raw.category)
    }
}

/// A local quote and a remote quote that share text but not category
///
/// Conflicts are queued by sync and only applied when the user resolves them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conflict {
    /// The local version at detection time
    pub local: Quote,
    /// The remote version
    pub server: Quote,
    /// When the conflict was detected
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Conflict {
    /// Record a conflict detected now
    pub fn new(local: Quote, server: Quote) -> Self {
        Self {
            local,
            server,
            timestamp: Utc::now(),
        }
    }

    /// Whether two conflicts pair the same local and server versions
    pub fn same_pair(&self, other: &Conflict) -> bool {
        self.local == other.local && self.server == other.server
    }
}

/// Quotes the collection starts with when nothing has been saved yet
pub fn default_quotes() -> Vec<Quote> {
    [
        (
            "The only way to do great work is to love what you do.",
            "Motivation",
        ),
        (
            "Life is what happens to you while you're busy making other plans.",
            "Life",
        ),
        (
            "The future belongs to those who believe in the beauty of their dreams.",
            "Dreams",
        ),
        (
            "It is during our darkest moments that we must focus to see the light.",
            "Inspiration",
        ),
        ("Whoever is happy will make others happy too.", "Happiness"),
        ("You must be the change you wish to see in the world.", "Change"),
    ]
    .into_iter()
    .map(|(text, category)| Quote {
        text: text.to_string(),
        category: category.to_string(),
    })
    .collect()
}
