//! Quote library
//!
//! The `Library` owns all application state and coordinates between:
//! - `QuoteStore` (the in-memory list)
//! - pending sync conflicts
//! - `CategoryIndex` (derived categories and current selection)
//! - `Persistence` (durable and session stores)
//!
//! Every mutation goes through a `Library` method, which rebuilds the
//! category index and saves before returning. A failed save never rolls
//! back the in-memory change: it is kept in `take_storage_error` for the
//! caller to report.
//!
//! ## Usage
//!
//! ```ignore
//! let mut library = Library::open()?;
//!
//! library.add("Stay hungry, stay foolish.", "Life")?;
//! let view = library.random(None, &mut rand::thread_rng());
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::categories::{CategoryFilter, CategoryIndex};
use crate::config::Config;
use crate::models::{default_quotes, Conflict, Quote, ValidationError};
use crate::render::{self, QuoteView};
use crate::storage::{FileStore, MemoryStore, Persistence, StorageError};
use crate::store::QuoteStore;
use crate::sync::merge::{self, MergeReport, ResolveReport};
use crate::transfer::{self, ImportReport};

/// Application state for one collection of quotes
pub struct Library {
    quotes: QuoteStore,
    conflicts: Vec<Conflict>,
    index: CategoryIndex,
    persistence: Persistence,
    config: Config,
    last_sync: Option<DateTime<Utc>>,
    storage_error: Option<StorageError>,
}

impl Library {
    /// Open the library using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the library with a specific configuration
    ///
    /// The durable store lives under the configured data directory; the
    /// session store starts empty.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let durable = FileStore::open(config.storage_dir())
            .context("Failed to open quote storage")?
            .with_quota(config.storage_quota_bytes);
        let persistence = Persistence::new(durable, MemoryStore::new());
        Ok(Self::with_persistence(config, persistence))
    }

    /// Build a library over existing persistence
    ///
    /// Saved quotes replace the defaults only if they load cleanly.
    pub fn with_persistence(config: Config, persistence: Persistence) -> Self {
        let quotes = match persistence.load_quotes() {
            Some(quotes) => {
                info!(count = quotes.len(), "loaded quotes from storage");
                quotes
            }
            None => {
                debug!("no saved quotes, using defaults");
                default_quotes()
            }
        };
        let quotes = QuoteStore::with_quotes(quotes);

        let mut index = CategoryIndex::new(quotes.all());
        if let Some(filter) = persistence.load_last_filter() {
            index.select(filter);
        }

        let conflicts = persistence.load_conflicts();
        let last_sync = persistence.load_last_sync();

        Self {
            quotes,
            conflicts,
            index,
            persistence,
            config,
            last_sync,
            storage_error: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Reading ====================

    pub fn quotes(&self) -> &QuoteStore {
        &self.quotes
    }

    pub fn categories(&self) -> &[String] {
        self.index.categories()
    }

    pub fn category_index(&self) -> &CategoryIndex {
        &self.index
    }

    /// The filter currently applied
    pub fn selected_filter(&self) -> &CategoryFilter {
        self.index.selected()
    }

    pub fn pending_conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.persistence.last_updated()
    }

    /// Show a random quote
    ///
    /// Uses `filter` when given, otherwise the selected filter. The shown
    /// quote is remembered as the session's last viewed quote.
    pub fn random<R: Rng + ?Sized>(
        &mut self,
        filter: Option<&CategoryFilter>,
        rng: &mut R,
    ) -> Option<QuoteView> {
        let filter = filter.unwrap_or(self.index.selected()).clone();
        let view = render::render_random(&self.quotes, &filter, rng)?;
        if let Err(e) = self.persistence.save_last_viewed(&view.quote()) {
            self.record_storage_error(e);
        }
        Some(view)
    }

    /// List quotes passing `filter`, or the selected filter
    pub fn list(&self, filter: Option<&CategoryFilter>) -> Vec<QuoteView> {
        render::render_list(&self.quotes, filter.unwrap_or(self.index.selected()))
    }

    /// Quote shown last in this session
    pub fn last_viewed(&self) -> Option<Quote> {
        self.persistence.load_last_viewed()
    }

    // ==================== Filtering ====================

    /// Apply a filter and list the matching quotes
    ///
    /// Known filters become the selection and are saved both durably and
    /// for the session. An unknown category lists nothing and leaves the
    /// selection unchanged.
    pub fn apply_filter(&mut self, filter: CategoryFilter) -> Vec<QuoteView> {
        let views = render::render_list(&self.quotes, &filter);
        if self.index.select(filter.clone()) {
            let saved = self
                .persistence
                .save_last_filter(&filter)
                .and_then(|()| self.persistence.save_preferred_filter(&filter));
            if let Err(e) = saved {
                self.record_storage_error(e);
            }
        } else {
            debug!(%filter, "filter names an unknown category");
        }
        views
    }

    /// Go back to showing every quote and forget the saved filter
    pub fn clear_filter(&mut self) {
        self.index.select(CategoryFilter::All);
        if let Err(e) = self.persistence.clear_last_filter() {
            self.record_storage_error(e);
        }
    }

    /// Restore the filter preferred earlier in this session, if still valid
    pub fn restore_session_filter(&mut self) -> Option<CategoryFilter> {
        let filter = self.persistence.load_preferred_filter()?;
        self.index.select(filter.clone()).then_some(filter)
    }

    /// Record a visit in the session and return the previous one
    pub fn touch_visit(&mut self) -> Option<DateTime<Utc>> {
        match self.persistence.touch_last_visit() {
            Ok(previous) => previous,
            Err(e) => {
                self.record_storage_error(e);
                None
            }
        }
    }

    // ==================== Mutations ====================

    /// Add a quote
    pub fn add(&mut self, text: &str, category: &str) -> Result<Quote, ValidationError> {
        let quote = self.quotes.add(text, category)?.clone();
        info!(category = %quote.category, "added quote");
        self.commit();
        Ok(quote)
    }

    /// Delete the quote at `index` in the unfiltered list
    pub fn delete(&mut self, index: usize) -> Result<Quote, ValidationError> {
        let quote = self.quotes.delete(index)?;
        info!(index, "deleted quote");
        self.commit();
        Ok(quote)
    }

    /// Replace every quote
    pub fn replace(&mut self, quotes: Vec<Quote>) {
        self.quotes.replace(quotes);
        self.commit();
    }

    /// Remove every quote
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Go back to the built-in quotes
    pub fn reset_to_default(&mut self) {
        self.replace(default_quotes());
    }

    /// Import quotes from file content
    ///
    /// Exact duplicates of stored quotes are skipped. On any validation
    /// error nothing is changed.
    pub fn import(&mut self, content: &str) -> Result<ImportReport, ValidationError> {
        let imported = transfer::parse_import(content)?;
        let valid = imported.len();
        let added = self.quotes.merge(imported);
        info!(valid, added, "imported quotes");
        self.commit();
        Ok(ImportReport {
            valid,
            added,
            skipped: valid - added,
        })
    }

    /// Export every quote as JSON
    pub fn export(&self, pretty: bool) -> String {
        transfer::export_json(self.quotes.all(), pretty)
    }

    // ==================== Sync ====================

    /// Merge remote quotes and record the sync time
    pub fn apply_remote(&mut self, remote: Vec<Quote>) -> MergeReport {
        let report = merge::merge_remote(&mut self.quotes, &mut self.conflicts, remote);
        self.commit();
        self.save_conflicts();

        let now = Utc::now();
        self.last_sync = Some(now);
        if let Err(e) = self.persistence.save_last_sync(now) {
            self.record_storage_error(e);
        }
        report
    }

    /// Apply the server version of every pending conflict
    pub fn resolve_conflicts(&mut self) -> ResolveReport {
        if self.conflicts.is_empty() {
            // Another session may have queued conflicts since we loaded
            self.conflicts = self.persistence.load_conflicts();
        }
        let report = merge::resolve_conflicts(&mut self.quotes, &mut self.conflicts);
        info!(
            resolved = report.resolved,
            remaining = report.remaining,
            "resolved conflicts"
        );
        if report.resolved > 0 {
            self.commit();
        }
        self.save_conflicts();
        report
    }

    // ==================== Persistence ====================

    /// Save the quote list
    ///
    /// Returns false if the write failed; the error is available from
    /// `take_storage_error`.
    pub fn save(&mut self) -> bool {
        match self.persistence.save_quotes(self.quotes.all()) {
            Ok(()) => true,
            Err(e) => {
                self.record_storage_error(e);
                false
            }
        }
    }

    /// Take the most recent storage failure, if any
    pub fn take_storage_error(&mut self) -> Option<StorageError> {
        self.storage_error.take()
    }

    fn commit(&mut self) {
        self.index.rebuild(self.quotes.all());
        self.save();
    }

    fn save_conflicts(&mut self) {
        if let Err(e) = self.persistence.save_conflicts(&self.conflicts) {
            self.record_storage_error(e);
        }
    }

    fn record_storage_error(&mut self, error: StorageError) {
        warn!(error = %error, "storage write failed");
        self.storage_error = Some(error);
    }
}
