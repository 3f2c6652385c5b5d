//! Server sync
//!
//! Exchanges quotes with a remote posts collection over HTTP.
//!
//! ## Flow
//!
//! 1. `AutoSync` ticks (or the user asks for a sync)
//! 2. `SyncEngine` fetches remote quotes and pushes a local sample
//! 3. `merge` appends new quotes and queues conflicts
//! 4. `Library::resolve_conflicts` applies the server side on request
//!
//! ## Usage
//!
//! ```ignore
//! let engine = SyncEngine::from_config(library.config())?;
//! match engine.sync(&mut library).await? {
//!     SyncOutcome::Completed(report) => println!("{} new", report.added),
//!     SyncOutcome::AlreadyRunning => {}
//! }
//! ```

pub mod engine;
pub mod error;
pub mod merge;
pub mod remote;
pub mod schedule;

pub use engine::{SyncEngine, SyncLimits, SyncOutcome, SyncReport, SyncStatus};
pub use error::SyncError;
pub use merge::{MergeReport, ResolveReport};
pub use remote::{HttpRemote, RemoteSource};
pub use schedule::{AutoSync, Tick};
