// src/pool.rs

//! Bounded fan-out used by every stage.

use crate::error::{AuditError, Result};
use crate::model::CommitRef;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Identifies a pooled work item in logs
pub trait TaskKey {
    fn task_key(&self) -> &str;
}

impl TaskKey for CommitRef {
    fn task_key(&self) -> &str {
        &self.id
    }
}

impl TaskKey for String {
    fn task_key(&self) -> &str {
        self
    }
}

/// Width and progress display for the pool a stage builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub width: usize,
    pub show_progress: bool,
}

impl PoolSettings {
    pub fn new(width: usize) -> Self {
        Self { width, show_progress: false }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn build(self) -> Result<WorkerPool> {
        WorkerPool::new(self.width, self.show_progress)
    }
}

/// A fixed-width rayon pool owned by one stage and dropped with it
pub struct WorkerPool {
    pool: ThreadPool,
    width: usize,
    show_progress: bool,
}

impl WorkerPool {
    pub fn new(width: usize, show_progress: bool) -> Result<Self> {
        let width = width.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("audit-worker-{i}"))
            .build()
            .map_err(|e| AuditError::Pool(e.to_string()))?;
        Ok(Self { pool, width, show_progress })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs `task` once per item and returns results in input order.
    ///
    /// A task that panics is logged with its key and yields `None`; its
    /// siblings keep running.
    pub fn run<T, R, F>(&self, stage: &str, items: &[T], task: F) -> Vec<Option<R>>
    where
        T: TaskKey + Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let bar = self.progress_bar(stage, items.len());

        let results = self.pool.install(|| {
            items
                .par_iter()
                .progress_with(bar.clone())
                .map(|item| match panic::catch_unwind(AssertUnwindSafe(|| task(item))) {
                    Ok(result) => Some(result),
                    Err(payload) => {
                        tracing::warn!(
                            stage,
                            commit = item.task_key(),
                            "worker task failed: {}",
                            panic_message(payload.as_ref())
                        );
                        None
                    }
                })
                .collect::<Vec<_>>()
        });

        bar.finish_with_message(format!("{stage} done"));
        results
    }

    fn progress_bar(&self, stage: &str, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template("{msg:<24} [{bar:40}] {pos}/{len} ({eta})") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(stage.to_string());
        bar
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
