// src/analyzer.rs

//! Runs the stages in order: index, filter, classify, report.

use crate::classifier::Classifier;
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::filter::UniquenessFilter;
use crate::fingerprint::FingerprintCache;
use crate::index::IndexBuilder;
use crate::model::ClassifiedRecord;
use crate::pool::PoolSettings;
use crate::report::{self, Report};
use crate::repo::{RepoQuery, RevRange};
use colored::Colorize;
use std::path::PathBuf;

/// What a run found, and where it was written
#[derive(Debug, Default)]
pub struct AuditOutcome {
    pub merge_base: Option<String>,
    pub source_total: usize,
    pub equivalent_count: usize,
    pub unique_count: usize,
    pub records: Vec<ClassifiedRecord>,
    pub cache_entries: usize,
    /// Fingerprint lookups answered from the cache
    pub cache_hits: usize,
    /// `None` when there was nothing to report
    pub report_path: Option<PathBuf>,
}

pub fn audit<R: RepoQuery + ?Sized>(repo: &R, config: &AuditConfig) -> Result<AuditOutcome> {
    for reference in [&config.source, &config.target] {
        if !repo.ref_exists(reference) {
            return Err(AuditError::ref_not_found(reference.as_str()));
        }
    }

    let merge_base = if config.use_merge_base {
        let base = repo.merge_base(&config.target, &config.source)?;
        match &base {
            Some(base) => tracing::info!(merge_base = %base, "found common ancestor"),
            None => tracing::warn!(
                "no common ancestor for {} and {}, comparing full history",
                config.target,
                config.source
            ),
        }
        base
    } else {
        None
    };

    let exclude = merge_base.clone().unwrap_or_else(|| config.target.clone());
    let source_range = RevRange::new(config.source.as_str(), Some(exclude));
    let source_commits = repo.list_commits(&source_range)?;
    tracing::info!(range = %source_range, commits = source_commits.len(), "listed source commits");

    let mut outcome = AuditOutcome {
        merge_base,
        source_total: source_commits.len(),
        ..Default::default()
    };
    if source_commits.is_empty() {
        return Ok(outcome);
    }

    let cache = FingerprintCache::new();
    let index_pool = PoolSettings::new(config.index_jobs).with_progress(config.show_progress);
    let index = IndexBuilder::new(repo, &cache)
        .pool(index_pool)
        .build(&config.target, outcome.merge_base.as_deref())?;

    let pool = PoolSettings::new(config.jobs).with_progress(config.show_progress);
    let partition = UniquenessFilter::new(repo, &cache, &index, pool).partition(&source_commits)?;
    outcome.equivalent_count = partition.equivalent_count;
    outcome.unique_count = partition.unique.len();
    outcome.cache_entries = cache.len();
    outcome.cache_hits = cache.hits();
    if partition.unique.is_empty() {
        return Ok(outcome);
    }

    outcome.records = Classifier::new(repo, pool).classify(&partition.unique)?;

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| report::default_output_path(&config.source, &config.target));
    outcome.report_path = Some(report::write_report(&Report::new(&outcome.records), &output)?);

    Ok(outcome)
}

/// Human-readable end-of-run summary on stdout
pub fn print_summary(config: &AuditConfig, outcome: &AuditOutcome) {
    if outcome.source_total == 0 {
        println!("{} no commits in {} missing from {}", "✓".green(), config.source, config.target);
        return;
    }
    if outcome.unique_count == 0 {
        println!(
            "{} all {} commits have an equivalent in {}",
            "✓".green(),
            outcome.source_total,
            config.target
        );
        return;
    }

    println!();
    println!("{}", "Unique patch analysis".bold());
    println!("  {:<16}{} vs {}", "Refs:", config.source.cyan(), config.target.cyan());
    if let Some(base) = &outcome.merge_base {
        println!("  {:<16}{}", "Merge base:", base);
    }
    println!("  {:<16}{}", "Commits:", outcome.source_total);
    println!("  {:<16}{}", "Equivalent:", outcome.equivalent_count);
    println!("  {:<16}{}", "Unique:", outcome.unique_count.to_string().yellow().bold());
    println!("  {:<16}{} ({} reused)", "Fingerprints:", outcome.cache_entries, outcome.cache_hits);
    println!("  {:<16}{}", "Workers:", config.jobs);
    if let Some(path) = &outcome.report_path {
        println!("  {:<16}{}", "Report:", path.display());
    }

    let report = Report::new(&outcome.records);
    println!();
    println!("{}", "By category".bold());
    for (category, count) in &report.category_counts {
        println!("  {:<16}{}", category.label(), count);
    }
    println!();
    println!("{}", "By type".bold());
    for (patch_type, count) in &report.type_counts {
        println!("  {:<16}{}", patch_type.label(), count);
    }
}
