//! Quote persistence
//!
//! Copies application state to and from the key-value stores. Nothing here
//! keeps a reference to the in-memory state; every call serializes a fresh
//! snapshot or hands back a freshly parsed value.
//!
//! Loading never fails outward: a missing key, unreadable file or content
//! of the wrong shape is logged and treated as "nothing saved".

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::kv::KeyValueStore;
use crate::categories::{self, CategoryFilter};
use crate::models::{Conflict, Quote};

/// Keys used in the durable and session stores
pub mod keys {
    pub const QUOTES: &str = "quotes";
    pub const LAST_UPDATED: &str = "lastUpdated";
    pub const CATEGORIES: &str = "categories";
    pub const LAST_FILTER: &str = "lastFilter";
    pub const CONFLICTS: &str = "quoteConflicts";
    pub const LAST_SYNC: &str = "lastSync";

    pub const LAST_VIEWED: &str = "lastViewedQuote";
    pub const PREFERRED_FILTER: &str = "preferredFilter";
    pub const LAST_VISIT: &str = "lastVisit";
}

type BoxedStore = Box<dyn KeyValueStore + Send>;

/// Reads and writes application state in a durable and a session store
pub struct Persistence {
    durable: BoxedStore,
    session: BoxedStore,
}

impl Persistence {
    /// Create a persistence layer over the given stores
    pub fn new(
        durable: impl KeyValueStore + Send + 'static,
        session: impl KeyValueStore + Send + 'static,
    ) -> Self {
        Self {
            durable: Box::new(durable),
            session: Box::new(session),
        }
    }

    // ==================== Quotes ====================

    /// Save the quote list
    ///
    /// Also stamps `lastUpdated` and writes the derived category list. The
    /// three values are written as one batch, so a quota failure leaves all
    /// of them as they were.
    pub fn save_quotes(&mut self, quotes: &[Quote]) -> StorageResult<()> {
        let entries = [
            (keys::QUOTES, encode(keys::QUOTES, &quotes)?),
            (keys::LAST_UPDATED, encode(keys::LAST_UPDATED, &Utc::now())?),
            (
                keys::CATEGORIES,
                encode(keys::CATEGORIES, &categories::categories(quotes))?,
            ),
        ];
        self.durable.set_many(&entries)?;
        debug!(count = quotes.len(), "saved quotes");
        Ok(())
    }

    /// Load the saved quote list
    ///
    /// Returns `None` unless the stored value is a non-empty array of
    /// valid quotes.
    pub fn load_quotes(&self) -> Option<Vec<Quote>> {
        let quotes: Vec<Quote> = read_json(self.durable.as_ref(), keys::QUOTES)?;
        if quotes.is_empty() {
            debug!("saved quote list is empty, keeping defaults");
            return None;
        }
        Some(quotes)
    }

    /// When the quote list was last saved
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        read_json(self.durable.as_ref(), keys::LAST_UPDATED)
    }

    // ==================== Conflicts ====================

    pub fn save_conflicts(&mut self, conflicts: &[Conflict]) -> StorageResult<()> {
        write_json(self.durable.as_mut(), keys::CONFLICTS, &conflicts)
    }

    /// Load pending conflicts, empty if none were saved or content is corrupt
    pub fn load_conflicts(&self) -> Vec<Conflict> {
        read_json(self.durable.as_ref(), keys::CONFLICTS).unwrap_or_default()
    }

    // ==================== Filter ====================

    pub fn save_last_filter(&mut self, filter: &CategoryFilter) -> StorageResult<()> {
        write_json(self.durable.as_mut(), keys::LAST_FILTER, &filter.to_string())
    }

    pub fn load_last_filter(&self) -> Option<CategoryFilter> {
        read_json::<String>(self.durable.as_ref(), keys::LAST_FILTER)
            .map(|value| CategoryFilter::parse(&value))
    }

    pub fn clear_last_filter(&mut self) -> StorageResult<()> {
        self.durable.remove(keys::LAST_FILTER)
    }

    // ==================== Sync ====================

    pub fn save_last_sync(&mut self, at: DateTime<Utc>) -> StorageResult<()> {
        write_json(self.durable.as_mut(), keys::LAST_SYNC, &at)
    }

    pub fn load_last_sync(&self) -> Option<DateTime<Utc>> {
        read_json(self.durable.as_ref(), keys::LAST_SYNC)
    }

    // ==================== Session ====================

    pub fn save_last_viewed(&mut self, quote: &Quote) -> StorageResult<()> {
        write_json(self.session.as_mut(), keys::LAST_VIEWED, quote)
    }

    pub fn load_last_viewed(&self) -> Option<Quote> {
        read_json(self.session.as_ref(), keys::LAST_VIEWED)
    }

    pub fn save_preferred_filter(&mut self, filter: &CategoryFilter) -> StorageResult<()> {
        write_json(
            self.session.as_mut(),
            keys::PREFERRED_FILTER,
            &filter.to_string(),
        )
    }

    pub fn load_preferred_filter(&self) -> Option<CategoryFilter> {
        read_json::<String>(self.session.as_ref(), keys::PREFERRED_FILTER)
            .map(|value| CategoryFilter::parse(&value))
    }

    /// Record a visit now and return the previous one, if any
    pub fn touch_last_visit(&mut self) -> StorageResult<Option<DateTime<Utc>>> {
        let previous = read_json(self.session.as_ref(), keys::LAST_VISIT);
        write_json(self.session.as_mut(), keys::LAST_VISIT, &Utc::now())?;
        Ok(previous)
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> StorageResult<String> {
    serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(
    store: &mut (dyn KeyValueStore + Send),
    key: &str,
    value: &T,
) -> StorageResult<()> {
    store.set(key, &encode(key, value)?)
}

fn read_json<T: DeserializeOwned>(store: &(dyn KeyValueStore + Send), key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring stored value with unexpected shape");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn quote(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    fn persistence(temp_dir: &TempDir) -> Persistence {
        Persistence::new(
            FileStore::open(temp_dir.path()).unwrap(),
            MemoryStore::new(),
        )
    }

    #[test]
    fn test_save_and_load_quotes() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);

        assert!(persistence.load_quotes().is_none());
        assert!(persistence.last_updated().is_none());

        let quotes = vec![quote("A", "X"), quote("B", "Y")];
        persistence.save_quotes(&quotes).unwrap();

        assert_eq!(persistence.load_quotes(), Some(quotes));
        assert!(persistence.last_updated().is_some());

        let categories = std::fs::read_to_string(temp_dir.path().join("categories.json")).unwrap();
        assert_eq!(categories, r#"["X","Y"]"#);
    }

    #[test]
    fn test_load_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);
        persistence.save_quotes(&[quote("A", "X")]).unwrap();

        assert_eq!(persistence.load_quotes(), persistence.load_quotes());
    }

    #[test]
    fn test_load_ignores_empty_array() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);
        persistence.save_quotes(&[]).unwrap();
        assert!(persistence.load_quotes().is_none());
    }

    #[test]
    fn test_load_ignores_corrupt_content() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        for content in [
            "not json",
            r#"{"text":"A","category":"X"}"#,
            r#"[{"text":"","category":"X"}]"#,
            r#"[1, 2]"#,
        ] {
            std::fs::write(temp_dir.path().join("quotes.json"), content).unwrap();
            assert!(persistence.load_quotes().is_none(), "content: {}", content);
        }
    }

    #[test]
    fn test_conflicts_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);

        assert!(persistence.load_conflicts().is_empty());

        let conflicts = vec![Conflict::new(quote("A", "X"), quote("A", "Z"))];
        persistence.save_conflicts(&conflicts).unwrap();
        assert_eq!(persistence.load_conflicts(), conflicts);

        std::fs::write(temp_dir.path().join("quoteConflicts.json"), "{").unwrap();
        assert!(persistence.load_conflicts().is_empty());
    }

    #[test]
    fn test_last_filter() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);

        assert!(persistence.load_last_filter().is_none());

        persistence
            .save_last_filter(&CategoryFilter::parse("Life"))
            .unwrap();
        assert_eq!(
            persistence.load_last_filter(),
            Some(CategoryFilter::parse("Life"))
        );

        persistence.save_last_filter(&CategoryFilter::All).unwrap();
        assert_eq!(persistence.load_last_filter(), Some(CategoryFilter::All));

        persistence.clear_last_filter().unwrap();
        assert!(persistence.load_last_filter().is_none());
    }

    #[test]
    fn test_last_sync() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);

        let now = Utc::now();
        persistence.save_last_sync(now).unwrap();
        assert_eq!(persistence.load_last_sync(), Some(now));
    }

    #[test]
    fn test_session_values_are_not_durable() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut persistence = persistence(&temp_dir);
            persistence.save_last_viewed(&quote("A", "X")).unwrap();
            persistence
                .save_preferred_filter(&CategoryFilter::parse("X"))
                .unwrap();
            assert_eq!(persistence.load_last_viewed(), Some(quote("A", "X")));
            assert_eq!(
                persistence.load_preferred_filter(),
                Some(CategoryFilter::parse("X"))
            );
        }

        // New session, same durable directory
        let persistence = persistence(&temp_dir);
        assert!(persistence.load_last_viewed().is_none());
        assert!(persistence.load_preferred_filter().is_none());
    }

    #[test]
    fn test_touch_last_visit() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = persistence(&temp_dir);

        assert!(persistence.touch_last_visit().unwrap().is_none());
        assert!(persistence.touch_last_visit().unwrap().is_some());
    }

    #[test]
    fn test_save_reports_quota_failure() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = Persistence::new(
            FileStore::open(temp_dir.path()).unwrap().with_quota(16),
            MemoryStore::new(),
        );

        let err = persistence
            .save_quotes(&[quote("A rather long quote that will not fit", "X")])
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_failed_save_leaves_saved_state_consistent() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = Persistence::new(
            FileStore::open(temp_dir.path()).unwrap().with_quota(120),
            MemoryStore::new(),
        );
        persistence.save_quotes(&[quote("A", "X")]).unwrap();
        let updated = persistence.last_updated();

        // The quote list alone fits, the list plus its category list does not
        let long_category = "C".repeat(40);
        let err = persistence
            .save_quotes(&[quote("A", &long_category)])
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        assert_eq!(persistence.load_quotes(), Some(vec![quote("A", "X")]));
        assert_eq!(persistence.last_updated(), updated);
        let categories = std::fs::read_to_string(temp_dir.path().join("categories.json")).unwrap();
        assert_eq!(categories, r#"["X"]"#);
    }
}
