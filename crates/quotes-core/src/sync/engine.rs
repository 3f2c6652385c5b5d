//! Sync engine
//!
//! One sync attempt runs `Idle -> Syncing -> Idle`:
//! 1. fetch remote quotes (failure aborts, local state untouched)
//! 2. push a sample of local quotes (failure is logged and ignored)
//! 3. merge, queueing conflicts
//! 4. persist quotes, conflicts and the sync time
//!
//! A busy flag rejects a second attempt while one is in flight, whether it
//! came from the timer or from the user.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use super::error::SyncError;
use super::remote::{HttpRemote, RemoteSource};
use crate::config::Config;
use crate::library::Library;
use crate::models::Quote;

/// Connection status as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Idle, last attempt (if any) succeeded
    Online,
    /// Attempt in progress
    Syncing,
    /// Idle, last attempt failed
    Offline,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SyncStatus::Online => "online",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Outcome of a completed sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote quotes received
    pub fetched: usize,
    /// Local quotes accepted by the remote
    pub pushed: usize,
    /// Remote quotes appended locally
    pub added: usize,
    /// Conflicts newly queued
    pub conflicts: usize,
}

/// Result of asking for a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sync ran to completion
    Completed(SyncReport),
    /// Another sync was already in progress; nothing was done
    AlreadyRunning,
}

/// Limits applied to each sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncLimits {
    pub fetch: usize,
    pub push: usize,
    pub push_enabled: bool,
}

impl SyncLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch: config.fetch_limit,
            push: config.push_limit,
            push_enabled: config.push_enabled,
        }
    }
}

impl Default for SyncLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Merges a remote collection into a library
pub struct SyncEngine<R> {
    remote: R,
    limits: SyncLimits,
    busy: AtomicBool,
    status: watch::Sender<SyncStatus>,
    status_rx: watch::Receiver<SyncStatus>,
}

impl SyncEngine<HttpRemote> {
    /// Create an engine talking HTTP to the configured endpoint
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        Ok(Self::new(
            HttpRemote::from_config(config)?,
            SyncLimits::from_config(config),
        ))
    }
}

impl<R: RemoteSource> SyncEngine<R> {
    pub fn new(remote: R, limits: SyncLimits) -> Self {
        let (status, status_rx) = watch::channel(SyncStatus::Online);
        Self {
            remote,
            limits,
            busy: AtomicBool::new(false),
            status,
            status_rx,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Get the current status
    pub fn status(&self) -> SyncStatus {
        *self.status_rx.borrow()
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_rx.clone()
    }

    /// Whether a sync is in progress
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one sync attempt against `library`
    pub async fn sync(&self, library: &mut Library) -> Result<SyncOutcome, SyncError> {
        let Some(_guard) = self.try_begin() else {
            info!("sync already in progress");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        self.set_status(SyncStatus::Syncing);
        info!("starting sync");

        let remote_quotes = match self.remote.fetch_quotes(self.limits.fetch).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(error = %e, "sync fetch failed");
                self.set_status(SyncStatus::Offline);
                return Err(e);
            }
        };
        let fetched = remote_quotes.len();

        let pushed = if self.limits.push_enabled {
            self.push_sample(library.quotes().all()).await
        } else {
            0
        };

        let merge = library.apply_remote(remote_quotes);
        let report = SyncReport {
            fetched,
            pushed,
            added: merge.added,
            conflicts: merge.conflicts,
        };

        info!(
            fetched,
            pushed,
            added = report.added,
            conflicts = report.conflicts,
            "sync complete"
        );
        self.set_status(SyncStatus::Online);
        Ok(SyncOutcome::Completed(report))
    }

    /// Push the first few local quotes; failures never abort the sync
    async fn push_sample(&self, quotes: &[Quote]) -> usize {
        let sample: Vec<Quote> = quotes.iter().take(self.limits.push).cloned().collect();
        if sample.is_empty() {
            return 0;
        }
        match self.remote.push_quotes(&sample).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "failed to push quotes to server");
                0
            }
        }
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag: &self.busy })
    }

    fn set_status(&self, status: SyncStatus) {
        let _ = self.status.send(status);
    }
}

/// Clears the busy flag when the attempt ends, including early returns
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory remote recording what was pushed
    #[derive(Default)]
    struct FakeRemote {
        quotes: Vec<Quote>,
        fail_fetch: bool,
        fail_push: bool,
        pushed: Mutex<Vec<Quote>>,
        fetches: AtomicUsize,
    }

    impl RemoteSource for FakeRemote {
        async fn fetch_quotes(&self, limit: usize) -> Result<Vec<Quote>, SyncError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(SyncError::Status {
                    url: "fake".to_string(),
                    status: 500,
                });
            }
            Ok(self.quotes.iter().take(limit).cloned().collect())
        }

        async fn push_quotes(&self, quotes: &[Quote]) -> Result<usize, SyncError> {
            if self.fail_push {
                return Err(SyncError::Request {
                    url: "fake".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            self.pushed.lock().unwrap().extend_from_slice(quotes);
            Ok(quotes.len())
        }
    }

    fn quote(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    fn library_with(temp_dir: &TempDir, quotes: Vec<Quote>) -> Library {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        let mut library = Library::open_with_config(config).unwrap();
        library.replace(quotes);
        library
    }

    fn engine(remote: FakeRemote) -> SyncEngine<FakeRemote> {
        SyncEngine::new(remote, SyncLimits::default())
    }

    #[tokio::test]
    async fn test_sync_adds_remote_quotes() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, vec![quote("A", "X")]);
        let engine = engine(FakeRemote {
            quotes: vec![quote("B", "Server"), quote("C", "Server")],
            ..FakeRemote::default()
        });

        let outcome = engine.sync(&mut library).await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Completed(SyncReport {
                fetched: 2,
                pushed: 1,
                added: 2,
                conflicts: 0,
            })
        );
        assert_eq!(library.quotes().len(), 3);
        assert!(library.last_sync().is_some());
        assert_eq!(engine.status(), SyncStatus::Online);
        assert!(!engine.is_busy());
    }

    #[tokio::test]
    async fn test_sync_queues_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, vec![quote("A", "X")]);
        let engine = engine(FakeRemote {
            quotes: vec![quote("A", "Z")],
            ..FakeRemote::default()
        });

        let outcome = engine.sync(&mut library).await.unwrap();

        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected completed sync");
        };
        assert_eq!(report.conflicts, 1);
        assert_eq!(library.quotes().all(), [quote("A", "X")]);
        assert_eq!(library.pending_conflicts()[0].server, quote("A", "Z"));
    }

    #[tokio::test]
    async fn test_sync_respects_fetch_limit() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, Vec::new());
        let remote = FakeRemote {
            quotes: (0..20).map(|i| quote(&format!("q{}", i), "Server")).collect(),
            ..FakeRemote::default()
        };
        let engine = SyncEngine::new(
            remote,
            SyncLimits {
                fetch: 10,
                push: 5,
                push_enabled: true,
            },
        );

        engine.sync(&mut library).await.unwrap();
        assert_eq!(library.quotes().len(), 10);
    }

    #[tokio::test]
    async fn test_sync_pushes_sample() {
        let temp_dir = TempDir::new().unwrap();
        let local: Vec<Quote> = (0..8).map(|i| quote(&format!("l{}", i), "Local")).collect();
        let mut library = library_with(&temp_dir, local.clone());
        let engine = engine(FakeRemote::default());

        engine.sync(&mut library).await.unwrap();

        let pushed = engine.remote().pushed.lock().unwrap().clone();
        assert_eq!(pushed, local[..5].to_vec());
    }

    #[tokio::test]
    async fn test_sync_push_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, vec![quote("A", "X")]);
        let engine = SyncEngine::new(
            FakeRemote::default(),
            SyncLimits {
                push_enabled: false,
                ..SyncLimits::default()
            },
        );

        engine.sync(&mut library).await.unwrap();
        assert!(engine.remote().pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_failure_does_not_abort() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, vec![quote("A", "X")]);
        let engine = engine(FakeRemote {
            quotes: vec![quote("B", "Server")],
            fail_push: true,
            ..FakeRemote::default()
        });

        let outcome = engine.sync(&mut library).await.unwrap();
        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected completed sync");
        };
        assert_eq!(report.pushed, 0);
        assert_eq!(report.added, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, vec![quote("A", "X")]);
        let engine = engine(FakeRemote {
            quotes: vec![quote("B", "Server")],
            fail_fetch: true,
            ..FakeRemote::default()
        });

        let err = engine.sync(&mut library).await.unwrap_err();

        assert!(matches!(err, SyncError::Status { status: 500, .. }));
        assert_eq!(library.quotes().all(), [quote("A", "X")]);
        assert!(library.last_sync().is_none());
        assert_eq!(engine.status(), SyncStatus::Offline);
        assert!(!engine.is_busy());
        assert!(engine.remote().pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_busy_guard_rejects_overlap() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, vec![quote("A", "X")]);
        let engine = engine(FakeRemote {
            quotes: vec![quote("B", "Server")],
            ..FakeRemote::default()
        });

        let guard = engine.try_begin().unwrap();
        assert!(engine.is_busy());

        let outcome = engine.sync(&mut library).await.unwrap();
        assert_eq!(outcome, SyncOutcome::AlreadyRunning);
        assert_eq!(engine.remote().fetches.load(Ordering::SeqCst), 0);
        assert_eq!(library.quotes().len(), 1);

        drop(guard);
        assert!(!engine.is_busy());
        assert!(matches!(
            engine.sync(&mut library).await.unwrap(),
            SyncOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn test_status_subscription() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = library_with(&temp_dir, Vec::new());
        let engine = engine(FakeRemote {
            fail_fetch: true,
            ..FakeRemote::default()
        });
        let rx = engine.subscribe_status();
        assert_eq!(*rx.borrow(), SyncStatus::Online);

        let _ = engine.sync(&mut library).await;
        assert_eq!(*rx.borrow(), SyncStatus::Offline);
    }
}
