//! Category index
//!
//! Categories are never stored on their own: they are derived from the
//! current quote list every time it changes.

use std::collections::HashSet;
use std::fmt;

use crate::models::Quote;

/// Value of the "show everything" filter option
pub const ALL: &str = "all";

/// Which quotes a view should include
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every quote
    #[default]
    All,
    /// Only quotes filed under this category
    Category(String),
}

impl CategoryFilter {
    /// Parse a filter from its stored/displayed form
    ///
    /// `"all"` and the empty string select everything.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(value.to_string())
        }
    }

    /// Whether a quote passes this filter
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => quote.category == *category,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "{}", ALL),
            CategoryFilter::Category(category) => write!(f, "{}", category),
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Distinct categories in order of first appearance
pub fn categories(quotes: &[Quote]) -> Vec<String> {
    let mut seen = HashSet::new();
    quotes
        .iter()
        .filter(|q| seen.insert(q.category.as_str()))
        .map(|q| q.category.clone())
        .collect()
}

/// Category counts in order of first appearance
pub fn category_counts(quotes: &[Quote]) -> Vec<(String, usize)> {
    categories(quotes)
        .into_iter()
        .map(|category| {
            let count = quotes.iter().filter(|q| q.category == category).count();
            (category, count)
        })
        .collect()
}

/// The derived category list plus the current selection
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    categories: Vec<String>,
    selected: CategoryFilter,
}

impl CategoryIndex {
    /// Build an index over a quote list with "all" selected
    pub fn new(quotes: &[Quote]) -> Self {
        Self {
            categories: categories(quotes),
            selected: CategoryFilter::All,
        }
    }

    /// Recompute the categories from scratch
    ///
    /// A selection that names a category which no longer exists
    /// falls back to `All`.
    pub fn rebuild(&mut self, quotes: &[Quote]) {
        self.categories = categories(quotes);
        if !self.contains(&self.selected) {
            self.selected = CategoryFilter::All;
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Selectable options: "all" first, then each category
    pub fn options(&self) -> Vec<String> {
        std::iter::once(ALL.to_string())
            .chain(self.categories.iter().cloned())
            .collect()
    }

    pub fn selected(&self) -> &CategoryFilter {
        &self.selected
    }

    /// Select a filter
    ///
    /// Returns false (and leaves the selection as is) when the filter names
    /// a category that does not exist.
    pub fn select(&mut self, filter: CategoryFilter) -> bool {
        if self.contains(&filter) {
            self.selected = filter;
            true
        } else {
            false
        }
    }

    /// Whether the filter is one of the current options
    pub fn contains(&self, filter: &CategoryFilter) -> bool {
        match filter {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => self.categories.contains(category),
        }
    }
}
