// src/fingerprint.rs

//! Run-scoped memo of commit fingerprints.

use crate::model::Fingerprint;
use crate::repo::RepoQuery;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

type Slot = Arc<OnceLock<Option<Fingerprint>>>;

/// Maps commit id to its fingerprint, or to `None` when the commit has none.
///
/// Each key owns a once-cell: the first caller computes, concurrent callers
/// for the same key block on the cell and reuse the result. A panicking
/// computation leaves the cell empty, so no partial entry is ever observed.
#[derive(Default)]
pub struct FingerprintCache {
    slots: DashMap<String, Slot>,
    hits: AtomicUsize,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<R: RepoQuery + ?Sized>(&self, repo: &R, commit_id: &str) -> Option<Fingerprint> {
        // The shard lock is released before computing; only the cell is held.
        let slot: Slot = self.slots.entry(commit_id.to_string()).or_default().clone();

        if let Some(cached) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }

        slot.get_or_init(|| match repo.fingerprint(commit_id) {
            Ok(Some(fingerprint)) => Some(fingerprint),
            Ok(None) => {
                tracing::debug!(commit = commit_id, "commit has no patch to fingerprint");
                None
            }
            Err(e) => {
                tracing::warn!(commit = commit_id, "fingerprint unavailable: {}", e);
                None
            }
        })
        .clone()
    }

    /// Number of commits with a settled entry, absent fingerprints included
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered without computing
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}
