//! Storage layer
//!
//! Handles persistence of quotes and session state.
//!
//! ## Architecture
//!
//! - **Durable store**: one JSON file per key, survives restarts
//! - **Session store**: in-memory, lives as long as the session
//!
//! `Persistence` copies state in and out of both stores; it never owns the
//! in-memory quote list.

pub mod error;
pub mod kv;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use persistence::{keys, Persistence};
