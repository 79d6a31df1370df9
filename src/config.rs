// src/config.rs

use crate::index::DEFAULT_INDEX_WORKERS;
use std::path::PathBuf;

/// Inputs for one source-vs-target audit
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub repo: PathBuf,
    /// Ref whose unique patches are reported
    pub source: String,
    /// Ref the source is compared against
    pub target: String,
    /// Restrict both ranges to commits after the common ancestor
    pub use_merge_base: bool,
    /// Width of the uniqueness and classification pools
    pub jobs: usize,
    /// Width of the index pool
    pub index_jobs: usize,
    /// Report path; derived from the refs when unset
    pub output: Option<PathBuf>,
    pub show_progress: bool,
}

impl AuditConfig {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            repo: PathBuf::from("."),
            source: source.into(),
            target: target.into(),
            use_merge_base: true,
            jobs: num_cpus::get(),
            index_jobs: DEFAULT_INDEX_WORKERS,
            output: None,
            show_progress: false,
        }
    }
}
