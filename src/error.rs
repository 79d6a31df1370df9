// src/error.rs

//! Error types for the audit engine
//!
//! Only ref resolution and total loss of output escalate to the caller.
//! Everything per-commit is contained where it happens.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// A source or target ref does not resolve
    #[error("reference '{reference}' does not exist")]
    RefNotFound { reference: String },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The primary report renderer failed
    #[error("render error: {0}")]
    Render(String),

    #[error("worker pool error: {0}")]
    Pool(String),

    /// Neither the primary nor the fallback report could be written
    #[error("no report written (primary: {primary}; fallback: {fallback})")]
    NoOutput { primary: String, fallback: String },
}

impl AuditError {
    pub fn ref_not_found(reference: impl Into<String>) -> Self {
        AuditError::RefNotFound { reference: reference.into() }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        AuditError::Render(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
