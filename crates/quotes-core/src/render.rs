//! Views over the quote store
//!
//! Everything here is a pure function of the store's current contents.
//! Each view carries the quote's position in the unfiltered list, which is
//! what delete expects, whatever filter produced the view.

use rand::Rng;
use serde::Serialize;

use crate::categories::CategoryFilter;
use crate::models::Quote;
use crate::store::QuoteStore;

/// Placeholder shown when there is nothing to display
pub const EMPTY_MESSAGE: &str = "No quotes available. Add some quotes!";

/// A quote prepared for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteView {
    /// Position in the unfiltered list
    pub index: usize,
    pub text: String,
    pub category: String,
}

impl QuoteView {
    fn new(index: usize, quote: &Quote) -> Self {
        Self {
            index,
            text: quote.text.clone(),
            category: quote.category.clone(),
        }
    }

    pub fn quote(&self) -> Quote {
        Quote {
            text: self.text.clone(),
            category: self.category.clone(),
        }
    }
}

/// Pick a random quote among those passing `filter`
pub fn render_random<R: Rng + ?Sized>(
    store: &QuoteStore,
    filter: &CategoryFilter,
    rng: &mut R,
) -> Option<QuoteView> {
    store
        .random(filter, rng)
        .map(|(index, quote)| QuoteView::new(index, quote))
}

/// Every quote passing `filter`, in storage order
pub fn render_list(store: &QuoteStore, filter: &CategoryFilter) -> Vec<QuoteView> {
    store
        .filtered(filter)
        .into_iter()
        .map(|(index, quote)| QuoteView::new(index, quote))
        .collect()
}

/// Message shown when a filtered list comes back empty
pub fn empty_list_message(filter: &CategoryFilter) -> String {
    match filter {
        CategoryFilter::All => "No quotes yet. Add some quotes!".to_string(),
        CategoryFilter::Category(category) => {
            format!("No quotes found in category \"{}\"", category)
        }
    }
}
