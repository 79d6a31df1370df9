// src/index.rs

//! Fingerprint index of the target range.

use crate::error::Result;
use crate::fingerprint::FingerprintCache;
use crate::model::Fingerprint;
use crate::pool::PoolSettings;
use crate::repo::{RepoQuery, RevRange};
use std::collections::HashSet;

/// Index width is a small constant, independent of the range size
pub const DEFAULT_INDEX_WORKERS: usize = 8;

/// Fingerprints seen in the target range. Read-only once built.
#[derive(Debug, Default, Clone)]
pub struct FingerprintIndex {
    fingerprints: HashSet<Fingerprint>,
}

impl FingerprintIndex {
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl FromIterator<Fingerprint> for FingerprintIndex {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self { fingerprints: iter.into_iter().collect() }
    }
}

pub struct IndexBuilder<'a, R: RepoQuery + ?Sized> {
    repo: &'a R,
    cache: &'a FingerprintCache,
    pool: PoolSettings,
}

impl<'a, R: RepoQuery + ?Sized> IndexBuilder<'a, R> {
    pub fn new(repo: &'a R, cache: &'a FingerprintCache) -> Self {
        Self { repo, cache, pool: PoolSettings::new(DEFAULT_INDEX_WORKERS) }
    }

    pub fn pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    /// Fingerprints every commit of `target`, or of `since..target` when a
    /// boundary is given. Commits without a fingerprint, and commits whose
    /// fingerprinting failed, are left out.
    pub fn build(&self, target: &str, since: Option<&str>) -> Result<FingerprintIndex> {
        let range = RevRange::new(target, since.map(String::from));
        let ids = self.repo.list_commit_ids(&range)?;
        tracing::info!(range = %range, commits = ids.len(), "building fingerprint index");

        let pool = self.pool.build()?;
        let fingerprints = pool.run("indexing target", &ids, |id| {
            self.cache.get_or_compute(self.repo, id)
        });

        let index: FingerprintIndex = fingerprints.into_iter().flatten().flatten().collect();
        tracing::info!(fingerprints = index.len(), "fingerprint index complete");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::testing::{commit, MemoryRepo};

    fn target_repo() -> MemoryRepo {
        MemoryRepo::default()
            .with_range(
                RevRange::new("v2", None),
                vec![commit("t1", "a"), commit("t2", "b"), commit("t3", "c"), commit("t4", "d")],
            )
            .with_range(RevRange::new("v2", Some("base".into())), vec![commit("t1", "a"), commit("t2", "b")])
            .with_fingerprint("t1", "p-1")
            .with_fingerprint("t2", "p-2")
            .with_fingerprint("t3", "p-3")
            .with_fingerprint("t4", "p-1")
    }

    #[test]
    fn test_builds_set_of_fingerprints() {
        let repo = target_repo();
        let cache = FingerprintCache::new();

        let index = IndexBuilder::new(&repo, &cache).build("v2", None).unwrap();

        assert_eq!(index.len(), 3);
        assert!(index.contains(&Fingerprint::new("p-3")));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_since_boundary_restricts_range() {
        let repo = target_repo();
        let cache = FingerprintCache::new();

        let narrow = IndexBuilder::new(&repo, &cache).build("v2", Some("base")).unwrap();
        let full = IndexBuilder::new(&repo, &cache).build("v2", None).unwrap();

        assert_eq!(narrow.len(), 2);
        assert!(!narrow.contains(&Fingerprint::new("p-3")));
        // The full index is a superset of the bounded one.
        assert!([Fingerprint::new("p-1"), Fingerprint::new("p-2")].iter().all(|f| full.contains(f)));
    }

    #[test]
    fn test_failures_are_skipped_not_fatal() {
        let mut repo = target_repo();
        repo.broken.insert("t2".into());
        repo.panicking.insert("t3".into());
        let cache = FingerprintCache::new();

        let index = IndexBuilder::new(&repo, &cache)
            .pool(PoolSettings::new(2))
            .build("v2", None)
            .unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.contains(&Fingerprint::new("p-1")));
    }

    #[test]
    fn test_unknown_range_is_an_error() {
        let repo = target_repo();
        let cache = FingerprintCache::new();

        assert!(IndexBuilder::new(&repo, &cache).build("nope", None).is_err());
    }
}
