//! Quotes Core Library
//!
//! This crate provides the core functionality for `quotes`, a small
//! local-first collection of categorized quotes that can be filtered,
//! exported, imported and synced with a remote server.
//!
//! # Architecture
//!
//! - **Library**: owns the quote list and is the only way to change it
//! - **Storage**: JSON values in a durable file store and a session store
//! - **Sync**: HTTP fetch/push with queued conflict resolution
//!
//! # Quick Start
//!
//! ```text
//! let mut library = Library::open()?;
//!
//! library.add("Less is more.", "Design")?;
//! for view in library.apply_filter(CategoryFilter::parse("Design")) {
//!     println!("{}", view.quote());
//! }
//! ```
//!
//! # Modules
//!
//! - `library`: State coordinator (main entry point)
//! - `models`: Quotes, conflicts and validation errors
//! - `store`: In-memory ordered quote list
//! - `categories`: Derived category list and filter selection
//! - `render`: Display views of random and filtered quotes
//! - `transfer`: JSON export and import
//! - `storage`: Key-value persistence
//! - `sync`: Server sync, merge and the auto-sync timer
//! - `config`: Application configuration

pub mod categories;
pub mod config;
pub mod library;
pub mod models;
pub mod render;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use categories::{CategoryFilter, CategoryIndex};
pub use config::Config;
pub use library::Library;
pub use models::{default_quotes, Conflict, Quote, ValidationError};
pub use render::QuoteView;
pub use storage::{StorageError, StorageResult};
pub use store::QuoteStore;
pub use sync::{AutoSync, SyncEngine, SyncError, SyncOutcome, SyncReport, SyncStatus};
pub use transfer::ImportReport;
