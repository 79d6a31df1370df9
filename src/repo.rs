// src/repo.rs

//! Repository queries used by every stage of the audit.
//!
//! `RepoQuery` is the seam between the engine and git. `GitRepo` answers it
//! with libgit2; unit tests answer it from memory.

use crate::error::{AuditError, Result};
use crate::model::{CommitRef, FileStat, Fingerprint};
use chrono::{FixedOffset, TimeZone, Utc};
use git2::{BranchType, Commit, Diff, DiffOptions, ErrorCode, Oid, Patch, Repository, Sort};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Commits reachable from `include` but not from `exclude` (`exclude..include`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevRange {
    pub include: String,
    pub exclude: Option<String>,
}

impl RevRange {
    pub fn new(include: impl Into<String>, exclude: Option<String>) -> Self {
        Self { include: include.into(), exclude }
    }
}

impl std::fmt::Display for RevRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.exclude {
            Some(exclude) => write!(f, "{}..{}", exclude, self.include),
            None => f.write_str(&self.include),
        }
    }
}

/// Queries the engine needs from a repository. Implementations are shared across pool workers.
pub trait RepoQuery: Sync {
    fn ref_exists(&self, reference: &str) -> bool;

    /// Best common ancestor of two refs, if they share history
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>>;

    /// Non-merge commits in `range`, newest first
    fn list_commits(&self, range: &RevRange) -> Result<Vec<CommitRef>>;

    /// Every commit id in `range`, merges included
    fn list_commit_ids(&self, range: &RevRange) -> Result<Vec<String>>;

    /// Stable patch id of the commit's change. `None` when the commit has no patch of its own.
    fn fingerprint(&self, commit_id: &str) -> Result<Option<Fingerprint>>;

    fn changed_files(&self, commit_id: &str) -> Result<Vec<String>>;

    fn change_stats(&self, commit_id: &str) -> Result<Vec<FileStat>>;

    fn full_message(&self, commit_id: &str) -> Result<String>;
}

/// libgit2-backed repository.
///
/// `Repository` is `Send` but not `Sync`, so opened handles are kept on a
/// stack and each call borrows one for its duration.
pub struct GitRepo {
    git_dir: PathBuf,
    handles: Mutex<Vec<Repository>>,
}

impl GitRepo {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)?;
        let git_dir = repo.path().to_path_buf();
        Ok(Self { git_dir, handles: Mutex::new(vec![repo]) })
    }

    fn with_repo<T>(&self, f: impl FnOnce(&Repository) -> Result<T>) -> Result<T> {
        let popped = self.handles.lock().pop();
        let repo = match popped {
            Some(repo) => repo,
            None => Repository::open(&self.git_dir)?,
        };
        let result = f(&repo);
        self.handles.lock().push(repo);
        result
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        self.branch_names(BranchType::Local)
    }

    /// Remote-tracking branches, without the symbolic `*/HEAD` entries
    pub fn remote_branches(&self) -> Result<Vec<String>> {
        let names = self.branch_names(BranchType::Remote)?;
        Ok(names.into_iter().filter(|name| !name.ends_with("/HEAD")).collect())
    }

    fn branch_names(&self, kind: BranchType) -> Result<Vec<String>> {
        self.with_repo(|repo| {
            let mut names = Vec::new();
            for branch in repo.branches(Some(kind))? {
                let (branch, _) = branch?;
                if let Some(name) = branch.name()? {
                    names.push(name.to_string());
                }
            }
            names.sort();
            Ok(names)
        })
    }

    pub fn tags(&self) -> Result<Vec<String>> {
        self.with_repo(|repo| {
            let names = repo.tag_names(None)?;
            Ok(names.iter().flatten().map(String::from).collect())
        })
    }
}

fn resolve(repo: &Repository, reference: &str) -> Result<Oid> {
    let object = repo.revparse_single(reference).map_err(|e| match e.code() {
        ErrorCode::NotFound | ErrorCode::Ambiguous | ErrorCode::InvalidSpec => {
            AuditError::ref_not_found(reference)
        }
        _ => AuditError::Git(e),
    })?;
    Ok(object.peel_to_commit()?.id())
}

fn find_commit<'r>(repo: &'r Repository, commit_id: &str) -> Result<Commit<'r>> {
    let oid = resolve(repo, commit_id)?;
    Ok(repo.find_commit(oid)?)
}

fn walk<'r>(repo: &'r Repository, range: &RevRange) -> Result<git2::Revwalk<'r>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push(resolve(repo, &range.include)?)?;
    if let Some(exclude) = &range.exclude {
        revwalk.hide(resolve(repo, exclude)?)?;
    }
    Ok(revwalk)
}

/// Diff of a commit against its first parent; root commits diff against the empty tree.
fn first_parent_diff<'r>(repo: &'r Repository, commit: &Commit<'r>) -> Result<Diff<'r>> {
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let current_tree = commit.tree()?;

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);

    Ok(repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&current_tree), Some(&mut diff_opts))?)
}

fn delta_path(delta: &git2::DiffDelta<'_>) -> Option<String> {
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(|p| p.to_string_lossy().into_owned())
}

fn commit_ref(commit: &Commit<'_>) -> Result<CommitRef> {
    let oid = commit.id().to_string();
    let short = commit.as_object().short_id()?;
    let id = short.as_str().map(String::from).unwrap_or_else(|| oid.clone());

    let author = commit.author();
    let when = author.when();
    let date = FixedOffset::east_opt(when.offset_minutes() * 60)
        .and_then(|offset| {
            Utc.timestamp_opt(when.seconds(), 0)
                .single()
                .map(|ts| ts.with_timezone(&offset).format("%Y-%m-%d").to_string())
        })
        .unwrap_or_default();

    // Text in a legacy encoding is kept, with undecodable bytes replaced.
    let name = String::from_utf8_lossy(author.name_bytes());
    Ok(CommitRef {
        id,
        oid,
        author: if name.is_empty() { "Unknown".to_string() } else { name.into_owned() },
        date,
        subject: commit.summary_bytes().map(String::from_utf8_lossy).unwrap_or_default().into_owned(),
    })
}

impl RepoQuery for GitRepo {
    fn ref_exists(&self, reference: &str) -> bool {
        self.with_repo(|repo| Ok(repo.revparse_single(reference).is_ok()))
            .unwrap_or(false)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        self.with_repo(|repo| {
            let a = resolve(repo, a)?;
            let b = resolve(repo, b)?;
            match repo.merge_base(a, b) {
                Ok(oid) => Ok(Some(oid.to_string())),
                Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn list_commits(&self, range: &RevRange) -> Result<Vec<CommitRef>> {
        self.with_repo(|repo| {
            let mut commits = Vec::new();
            for oid in walk(repo, range)? {
                let commit = repo.find_commit(oid?)?;
                if commit.parent_count() > 1 {
                    continue;
                }
                commits.push(commit_ref(&commit)?);
            }
            Ok(commits)
        })
    }

    fn list_commit_ids(&self, range: &RevRange) -> Result<Vec<String>> {
        self.with_repo(|repo| {
            let mut ids = Vec::new();
            for oid in walk(repo, range)? {
                ids.push(oid?.to_string());
            }
            Ok(ids)
        })
    }

    fn fingerprint(&self, commit_id: &str) -> Result<Option<Fingerprint>> {
        self.with_repo(|repo| {
            let commit = find_commit(repo, commit_id)?;
            // A merge has no single-parent patch to compare.
            if commit.parent_count() > 1 {
                return Ok(None);
            }
            let diff = first_parent_diff(repo, &commit)?;
            if diff.deltas().len() == 0 {
                return Ok(None);
            }
            let patch_id = diff.patchid(None)?;
            Ok(Some(Fingerprint::new(patch_id.to_string())))
        })
    }

    fn changed_files(&self, commit_id: &str) -> Result<Vec<String>> {
        self.with_repo(|repo| {
            let commit = find_commit(repo, commit_id)?;
            let diff = first_parent_diff(repo, &commit)?;
            Ok(diff.deltas().filter_map(|delta| delta_path(&delta)).collect())
        })
    }

    fn change_stats(&self, commit_id: &str) -> Result<Vec<FileStat>> {
        self.with_repo(|repo| {
            let commit = find_commit(repo, commit_id)?;
            let diff = first_parent_diff(repo, &commit)?;
            let mut stats = Vec::new();
            for (idx, delta) in diff.deltas().enumerate() {
                let Some(path) = delta_path(&delta) else { continue };
                // Binary files have no line stats and count as zero.
                let (added, deleted) = match Patch::from_diff(&diff, idx)? {
                    Some(patch) => {
                        let (_, added, deleted) = patch.line_stats()?;
                        (added, deleted)
                    }
                    None => (0, 0),
                };
                stats.push(FileStat { path, added, deleted });
            }
            Ok(stats)
        })
    }

    fn full_message(&self, commit_id: &str) -> Result<String> {
        self.with_repo(|repo| {
            let commit = find_commit(repo, commit_id)?;
            Ok(String::from_utf8_lossy(commit.message_bytes()).trim().to_string())
        })
    }
}
