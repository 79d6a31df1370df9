// src/filter.rs

//! Splits the source range into unique and equivalent commits.

use crate::error::Result;
use crate::fingerprint::FingerprintCache;
use crate::index::FingerprintIndex;
use crate::model::{CommitRef, Partition};
use crate::pool::PoolSettings;
use crate::repo::RepoQuery;

pub struct UniquenessFilter<'a, R: RepoQuery + ?Sized> {
    repo: &'a R,
    cache: &'a FingerprintCache,
    index: &'a FingerprintIndex,
    pool: PoolSettings,
}

impl<'a, R: RepoQuery + ?Sized> UniquenessFilter<'a, R> {
    pub fn new(repo: &'a R, cache: &'a FingerprintCache, index: &'a FingerprintIndex, pool: PoolSettings) -> Self {
        Self { repo, cache, index, pool }
    }

    /// Every input commit lands in exactly one side. Unique commits keep source order.
    pub fn partition(&self, commits: &[CommitRef]) -> Result<Partition> {
        let pool = self.pool.build()?;
        let verdicts = pool.run("checking uniqueness", commits, |commit| self.is_unique(commit));

        let mut partition = Partition::default();
        for (commit, verdict) in commits.iter().zip(verdicts) {
            // A failed task is an unknown fingerprint, and unknown means unique.
            if verdict.unwrap_or(true) {
                partition.unique.push(commit.clone());
            } else {
                partition.equivalent_count += 1;
            }
        }

        tracing::info!(
            total = commits.len(),
            unique = partition.unique.len(),
            equivalent = partition.equivalent_count,
            "uniqueness filter complete"
        );
        Ok(partition)
    }

    fn is_unique(&self, commit: &CommitRef) -> bool {
        match self.cache.get_or_compute(self.repo, &commit.oid) {
            Some(fingerprint) => !self.index.contains(&fingerprint),
            None => {
                tracing::warn!(commit = %commit.id, "no fingerprint, assuming unique");
                true
            }
        }
    }
}
