// src/rules.rs

//! Declarative classification tables.
//!
//! Categories are evaluated independently; types are a first-match cascade.
//! All matching is case-insensitive substring containment.

use crate::model::{Category, PatchType};

/// Voids a keyword match when the subject also names an unrelated subsystem
/// that happens to share the `trigger` substring.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion {
    pub trigger: &'static str,
    pub unrelated: &'static [&'static str],
}

impl Exclusion {
    fn applies(&self, subject: &str) -> bool {
        subject.contains(self.trigger) && self.unrelated.iter().any(|k| subject.contains(k))
    }
}

/// How a category rule matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    Path,
    Keyword,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    pub paths: &'static [&'static str],
    pub keywords: &'static [&'static str],
    /// Consulted only for keyword matches
    pub exclusions: &'static [Exclusion],
}

impl CategoryRule {
    /// `subject` and `files` must already be lowercase.
    pub fn evaluate(&self, subject: &str, files: &[String]) -> Option<RuleMatch> {
        if files.iter().any(|file| self.paths.iter().any(|p| file.contains(p))) {
            return Some(RuleMatch::Path);
        }
        if !self.keywords.iter().any(|k| subject.contains(k)) {
            return None;
        }
        if self.exclusions.iter().any(|e| e.applies(subject)) {
            return None;
        }
        Some(RuleMatch::Keyword)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub patch_type: PatchType,
    pub keywords: &'static [&'static str],
}

const SCHED_KEYWORDS: &[&str] = &[
    "scheduler", "sched:", "sched_", "cfs:", "cfs_", "rt:", "rt_",
    "fair scheduler", "rt scheduler", "deadline scheduler",
    "load balancing", "load balance", "cpu scheduler",
    "task scheduler", "process scheduler", "thread scheduler",
    "runqueue", "rq_", "pick_next_task", "enqueue_task", "dequeue_task",
    "sched_domain", "sched_group", "sched_entity", "sched_class",
    "wake_up_new_task", "try_to_wake_up", "schedule()", "preempt",
];

const SCHED_PATHS: &[&str] = &["kernel/sched/", "include/linux/sched/", "include/uapi/linux/sched.h"];

const SCHED_EXCLUSIONS: &[Exclusion] = &[Exclusion {
    trigger: "rt",
    unrelated: &["rtc", "uart", "spi", "i2c", "usb", "pci", "dma", "gpio"],
}];

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::RiscV,
        paths: &["arch/riscv"],
        keywords: &["riscv", "risc-v"],
        exclusions: &[],
    },
    CategoryRule {
        category: Category::Scheduling,
        paths: SCHED_PATHS,
        keywords: SCHED_KEYWORDS,
        exclusions: SCHED_EXCLUSIONS,
    },
    CategoryRule {
        category: Category::Memory,
        paths: &["mm/", "include/linux/mm"],
        keywords: &["mm", "memory", "page", "slab", "kmem"],
        exclusions: &[],
    },
    CategoryRule {
        category: Category::Filesystem,
        paths: &["fs/"],
        keywords: &["fs", "filesystem", "ext4", "btrfs", "xfs"],
        exclusions: &[],
    },
    CategoryRule {
        category: Category::Networking,
        paths: &["net/"],
        keywords: &["net", "network", "tcp", "udp", "socket"],
        exclusions: &[],
    },
    CategoryRule {
        category: Category::Driver,
        paths: &["drivers/"],
        keywords: &["driver", "device"],
        exclusions: &[],
    },
];

pub const TYPE_RULES: &[TypeRule] = &[
    TypeRule { patch_type: PatchType::DefectFix, keywords: &["fix", "bug", "error", "issue"] },
    TypeRule { patch_type: PatchType::NewFeature, keywords: &["add", "new", "implement", "introduce"] },
    TypeRule { patch_type: PatchType::Optimization, keywords: &["improve", "optimize", "enhance", "refactor"] },
    TypeRule { patch_type: PatchType::Update, keywords: &["update", "change", "modify"] },
];

/// The tables a classifier runs with, plus the labels used when nothing matches
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub categories: &'static [CategoryRule],
    pub types: &'static [TypeRule],
    pub fallback_category: Category,
    pub fallback_type: PatchType,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            categories: CATEGORY_RULES,
            types: TYPE_RULES,
            fallback_category: Category::Uncategorized,
            fallback_type: PatchType::Other,
        }
    }
}

impl RuleSet {
    /// Every matching category in table order; never empty.
    pub fn categorize(&self, subject: &str, files: &[String]) -> Vec<Category> {
        let subject = subject.to_lowercase();
        let files: Vec<String> = files.iter().map(|f| f.to_lowercase()).collect();

        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .filter(|rule| rule.evaluate(&subject, &files).is_some())
            .map(|rule| rule.category)
            .collect();

        if categories.is_empty() {
            categories.push(self.fallback_category);
        }
        categories
    }

    /// First matching type rule over the subject line.
    ///
    /// The full message is accepted but not consulted; only the subject decides.
    pub fn patch_type(&self, subject: &str, _full_message: &str) -> PatchType {
        let subject = subject.to_lowercase();
        self.types
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| subject.contains(k)))
            .map_or(self.fallback_type, |rule| rule.patch_type)
    }
}
