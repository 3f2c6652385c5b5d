//! Merge and conflict resolution
//!
//! Remote quotes are compared to local ones by text and category:
//! - identical quote: skipped
//! - same text, different category: queued as a conflict, local untouched
//! - anything else: appended
//!
//! Queued conflicts are only applied by `resolve_conflicts`, where the
//! server version replaces the local one.

use serde::Serialize;

use crate::models::{Conflict, Quote};
use crate::store::QuoteStore;

/// Outcome of merging a batch of remote quotes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Remote quotes appended locally
    pub added: usize,
    /// Conflicts newly queued
    pub conflicts: usize,
    /// Remote quotes already present
    pub unchanged: usize,
}

/// Merge remote quotes into the store, queueing conflicts
///
/// A conflict already pending for the same local/server pair is not
/// queued twice.
pub fn merge_remote(
    store: &mut QuoteStore,
    pending: &mut Vec<Conflict>,
    remote: impl IntoIterator<Item = Quote>,
) -> MergeReport {
    let mut report = MergeReport::default();

    for server in remote {
        if store.contains(&server) {
            report.unchanged += 1;
            continue;
        }

        if let Some(local) = store.find_text_conflict(&server) {
            let conflict = Conflict::new(local.clone(), server);
            if !pending.iter().any(|c| c.same_pair(&conflict)) {
                pending.push(conflict);
                report.conflicts += 1;
            }
            continue;
        }

        store.merge(std::iter::once(server));
        report.added += 1;
    }

    report
}

/// Outcome of applying queued conflicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Conflicts applied and removed from the queue
    pub resolved: usize,
    /// Conflicts still queued because their local quote was not found
    pub remaining: usize,
}

/// Apply the server version of every queued conflict
///
/// The local quote is located by the conflict's recorded local text and
/// category. If it has since been changed or deleted the conflict stays
/// queued.
pub fn resolve_conflicts(store: &mut QuoteStore, pending: &mut Vec<Conflict>) -> ResolveReport {
    let mut report = ResolveReport::default();
    let mut unresolved = Vec::new();

    for conflict in pending.drain(..) {
        match store.position_of(&conflict.local) {
            Some(index) => {
                // Index comes from position_of, so set cannot fail
                let _ = store.set(index, conflict.server);
                report.resolved += 1;
            }
            None => unresolved.push(conflict),
        }
    }

    report.remaining = unresolved.len();
    *pending = unresolved;
    report
}
