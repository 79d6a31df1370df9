// src/lib.rs

//! git-patch-audit
//!
//! Finds commits in a source ref whose change has no patch-equivalent in a
//! target ref, then labels each one by subsystem and intent:
//! - Fingerprints are stable patch ids, memoized for the run
//! - The target index and the source filter fan out over bounded pools
//! - Classification is table-driven, with keyword exclusions

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod index;
pub mod model;
pub mod pool;
pub mod report;
pub mod repo;
pub mod rules;
pub mod versions;

pub use analyzer::{audit, AuditOutcome};
pub use config::AuditConfig;
pub use error::{AuditError, Result};
pub use model::{Category, ClassifiedRecord, CommitDetail, CommitRef, Fingerprint, PatchType};
pub use repo::{GitRepo, RepoQuery, RevRange};
