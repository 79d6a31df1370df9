// src/classifier.rs

//! Enriches unique commits with details and labels them.

use crate::error::Result;
use crate::model::{ClassifiedRecord, CommitDetail, CommitRef};
use crate::pool::{PoolSettings, TaskKey};
use crate::repo::RepoQuery;
use crate::rules::RuleSet;

struct Enriched {
    commit: CommitRef,
    detail: CommitDetail,
}

impl TaskKey for Enriched {
    fn task_key(&self) -> &str {
        &self.commit.id
    }
}

pub struct Classifier<'a, R: RepoQuery + ?Sized> {
    repo: &'a R,
    rules: RuleSet,
    pool: PoolSettings,
}

impl<'a, R: RepoQuery + ?Sized> Classifier<'a, R> {
    pub fn new(repo: &'a R, pool: PoolSettings) -> Self {
        Self { repo, rules: RuleSet::default(), pool }
    }

    /// Loads details for every commit, then labels each one.
    ///
    /// Records come out grouped by commit in input order, one per category.
    pub fn classify(&self, commits: &[CommitRef]) -> Result<Vec<ClassifiedRecord>> {
        let details = self.pool.build()?.run("fetching details", commits, |commit| self.fetch_detail(commit));

        let enriched: Vec<Enriched> = commits
            .iter()
            .zip(details)
            .map(|(commit, detail)| Enriched { commit: commit.clone(), detail: detail.unwrap_or_default() })
            .collect();

        let labelled = self.pool.build()?.run("classifying", &enriched, |item| self.label(item));

        let records: Vec<ClassifiedRecord> = enriched
            .iter()
            .zip(labelled)
            .flat_map(|(item, records)| records.unwrap_or_else(|| vec![self.fallback_record(item)]))
            .collect();

        tracing::info!(commits = commits.len(), records = records.len(), "classification complete");
        Ok(records)
    }

    /// Each query degrades to an empty value on failure.
    pub fn fetch_detail(&self, commit: &CommitRef) -> CommitDetail {
        let id = commit.oid.as_str();
        CommitDetail {
            full_message: self.repo.full_message(id).unwrap_or_else(|e| {
                tracing::warn!(commit = id, "could not read message: {}", e);
                String::new()
            }),
            changed_files: self.repo.changed_files(id).unwrap_or_else(|e| {
                tracing::warn!(commit = id, "could not list changed files: {}", e);
                Vec::new()
            }),
            file_stats: self.repo.change_stats(id).unwrap_or_else(|e| {
                tracing::warn!(commit = id, "could not read change stats: {}", e);
                Vec::new()
            }),
        }
    }

    fn label(&self, item: &Enriched) -> Vec<ClassifiedRecord> {
        let categories = self.rules.categorize(&item.commit.subject, &item.detail.changed_files);
        let patch_type = self.rules.patch_type(&item.commit.subject, &item.detail.full_message);
        tracing::debug!(commit = %item.commit.id, ?categories, %patch_type, "classified");

        categories
            .into_iter()
            .map(|category| ClassifiedRecord {
                commit: item.commit.clone(),
                detail: item.detail.clone(),
                category,
                patch_type,
            })
            .collect()
    }

    fn fallback_record(&self, item: &Enriched) -> ClassifiedRecord {
        ClassifiedRecord {
            commit: item.commit.clone(),
            detail: item.detail.clone(),
            category: self.rules.fallback_category,
            patch_type: self.rules.fallback_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, FileStat, PatchType};
    use crate::repo::testing::{commit, MemoryRepo};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    fn detail(files: &[&str], message: &str) -> CommitDetail {
        CommitDetail {
            full_message: message.to_string(),
            changed_files: files.iter().map(|f| f.to_string()).collect(),
            file_stats: files
                .iter()
                .map(|f| FileStat { path: f.to_string(), added: 2, deleted: 1 })
                .collect(),
        }
    }

    fn labels(records: &[ClassifiedRecord]) -> Vec<(&str, Category, PatchType)> {
        records.iter().map(|r| (r.commit.id.as_str(), r.category, r.patch_type)).collect()
    }

    #[test]
    fn test_scheduler_fix() {
        let repo = MemoryRepo::default().with_detail("c1", detail(&["kernel/sched/core.c"], "body"));
        let commits = vec![commit("c1", "Fix null pointer in scheduler core")];

        let records = Classifier::new(&repo, PoolSettings::new(2)).classify(&commits).unwrap();

        assert_eq!(labels(&records), vec![("c1", Category::Scheduling, PatchType::DefectFix)]);
        assert_eq!(records[0].detail.file_stats[0].to_string(), "kernel/sched/core.c(+2/-1)");
    }

    #[test]
    fn test_rtc_subject_goes_to_driver_only() {
        let repo = MemoryRepo::default().with_detail("c1", detail(&["drivers/rtc/rtc-x.c"], ""));
        let commits = vec![commit("c1", "Update rtc driver timeout")];

        let records = Classifier::new(&repo, PoolSettings::new(2)).classify(&commits).unwrap();

        assert_eq!(labels(&records), vec![("c1", Category::Driver, PatchType::Update)]);
    }

    #[test]
    fn test_fan_out_shares_commit_and_detail() {
        let repo = MemoryRepo::default().with_detail("c1", detail(&["mm/slub.c"], "msg"));
        let commits = vec![commit("c1", "net: add socket memory accounting")];

        let records = Classifier::new(&repo, PoolSettings::new(2)).classify(&commits).unwrap();

        assert_eq!(
            labels(&records),
            vec![
                ("c1", Category::Memory, PatchType::NewFeature),
                ("c1", Category::Networking, PatchType::NewFeature),
            ]
        );
        assert_eq!(records[0].commit, records[1].commit);
        assert_eq!(records[0].detail, records[1].detail);
    }

    #[test]
    fn test_detail_failure_still_classified() {
        let mut repo = MemoryRepo::default();
        repo.broken.insert("c1".into());
        let commits = vec![commit("c1", "Tidy up whitespace")];

        let records = Classifier::new(&repo, PoolSettings::new(1)).classify(&commits).unwrap();

        assert_eq!(labels(&records), vec![("c1", Category::Uncategorized, PatchType::Other)]);
        assert_eq!(records[0].detail, CommitDetail::default());
    }

    #[test]
    fn test_panicking_fetch_degrades_to_empty_detail() {
        let mut repo = MemoryRepo::default().with_detail("c2", detail(&["fs/ext4/inode.c"], ""));
        repo.panicking.insert("c1".into());
        let commits = vec![commit("c1", "Fix xfs log"), commit("c2", "ext4: fix leak")];

        let records = Classifier::new(&repo, PoolSettings::new(2)).classify(&commits).unwrap();

        // c1's detail task panicked, so it is classified on its subject with empty details.
        assert_eq!(
            labels(&records),
            vec![
                ("c1", Category::Filesystem, PatchType::DefectFix),
                ("c2", Category::Filesystem, PatchType::DefectFix),
            ]
        );
    }

    #[test]
    fn test_every_commit_yields_a_record() {
        let repo = MemoryRepo::default();
        let commits: Vec<CommitRef> = (0..50).map(|i| commit(&format!("c{i}"), "Tidy up")).collect();

        let records = Classifier::new(&repo, PoolSettings::new(4)).classify(&commits).unwrap();

        assert_eq!(records.len(), 50);
        assert_eq!(repo.detail_calls.load(Ordering::SeqCst), 50);
        assert!(records.iter().all(|r| r.category == Category::Uncategorized));
    }
}
