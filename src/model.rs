// src/model.rs

use std::fmt;

/// A commit as listed in a revision range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitRef {
    /// Abbreviated hash, unique within the repository
    pub id: String,
    /// Full hash; the key shared by every per-commit query
    pub oid: String,
    pub author: String,
    /// Author date, `YYYY-MM-DD`
    pub date: String,
    pub subject: String,
}

/// Content-derived token identifying a commit's code change independent of its metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lines added and deleted in one file of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub path: String,
    pub added: usize,
    pub deleted: usize,
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(+{}/-{})", self.path, self.added, self.deleted)
    }
}

/// Details loaded only for unique commits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDetail {
    pub full_message: String,
    pub changed_files: Vec<String>,
    pub file_stats: Vec<FileStat>,
}

/// Subsystem label; a commit may carry several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    RiscV,
    Scheduling,
    Memory,
    Filesystem,
    Networking,
    Driver,
    Uncategorized,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::RiscV => "RISC-V",
            Category::Scheduling => "scheduling",
            Category::Memory => "memory",
            Category::Filesystem => "filesystem",
            Category::Networking => "networking",
            Category::Driver => "driver",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Intent of a commit; exactly one per commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatchType {
    DefectFix,
    NewFeature,
    Optimization,
    Update,
    Other,
}

impl PatchType {
    pub fn label(self) -> &'static str {
        match self {
            PatchType::DefectFix => "defect-fix",
            PatchType::NewFeature => "new-feature",
            PatchType::Optimization => "optimization",
            PatchType::Update => "update",
            PatchType::Other => "other",
        }
    }
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the final report. A commit with several categories yields several records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub commit: CommitRef,
    pub detail: CommitDetail,
    pub category: Category,
    pub patch_type: PatchType,
}

/// Outcome of the uniqueness filter
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Unique commits, in source order
    pub unique: Vec<CommitRef>,
    pub equivalent_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stat_display() {
        let stat = FileStat { path: "kernel/sched/core.c".into(), added: 3, deleted: 1 };
        assert_eq!(stat.to_string(), "kernel/sched/core.c(+3/-1)");
    }
}
