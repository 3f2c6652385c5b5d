//! In-memory quote store
//!
//! `QuoteStore` is the ordered list every other component reads. It does no
//! I/O; the `Library` persists and re-indexes after each mutation.
//!
//! Positions always refer to the unfiltered list.

use rand::Rng;

use crate::categories::CategoryFilter;
use crate::models::{Quote, ValidationError};

/// Ordered list of quotes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteStore {
    quotes: Vec<Quote>,
}

impl QuoteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given quotes
    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }

    /// Append a new quote
    ///
    /// Text and category are trimmed and must not be empty. Duplicates are
    /// allowed here; only import and sync skip exact duplicates.
    pub fn add(&mut self, text: &str, category: &str) -> Result<&Quote, ValidationError> {
        let quote = Quote::new(text, category)?;
        self.quotes.push(quote);
        Ok(&self.quotes[self.quotes.len() - 1])
    }

    /// Remove the quote at `index`
    pub fn delete(&mut self, index: usize) -> Result<Quote, ValidationError> {
        if index >= self.quotes.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.quotes.len(),
            });
        }
        Ok(self.quotes.remove(index))
    }

    /// Replace the whole list
    pub fn replace(&mut self, quotes: Vec<Quote>) {
        self.quotes = quotes;
    }

    /// Replace the quote at `index`
    pub fn set(&mut self, index: usize, quote: Quote) -> Result<Quote, ValidationError> {
        let len = self.quotes.len();
        let slot = self
            .quotes
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, quote))
    }

    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn get(&self, index: usize) -> Option<&Quote> {
        self.quotes.get(index)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Whether an identical quote is stored
    pub fn contains(&self, quote: &Quote) -> bool {
        self.quotes.contains(quote)
    }

    /// Position of the first identical quote
    pub fn position_of(&self, quote: &Quote) -> Option<usize> {
        self.quotes.iter().position(|q| q == quote)
    }

    /// First stored quote with the same text but another category
    pub fn find_text_conflict(&self, quote: &Quote) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.conflicts_with(quote))
    }

    /// Quotes passing `filter`, paired with their unfiltered positions
    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<(usize, &Quote)> {
        self.quotes
            .iter()
            .enumerate()
            .filter(|(_, q)| filter.matches(q))
            .collect()
    }

    /// Uniformly random quote among those passing `filter`
    pub fn random<R: Rng + ?Sized>(
        &self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> Option<(usize, &Quote)> {
        let candidates = self.filtered(filter);
        if candidates.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..candidates.len());
        Some(candidates[pick])
    }

    /// Append quotes not already stored
    ///
    /// Exact duplicates (same text and category) are skipped, including
    /// duplicates within `quotes` itself. Returns how many were added.
    pub fn merge(&mut self, quotes: impl IntoIterator<Item = Quote>) -> usize {
        let mut added = 0;
        for quote in quotes {
            if !self.contains(&quote) {
                self.quotes.push(quote);
                added += 1;
            }
        }
        added
    }
}
