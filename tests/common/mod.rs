//! Builds small repositories directly through libgit2.

use git2::{Index, IndexEntry, IndexTime, ObjectType, Oid, Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commits `files` on top of `parent` without touching any branch.
    /// Files not listed keep the parent's content.
    pub fn commit(&self, parent: Option<Oid>, files: &[(&str, &str)], message: &str, author: &str, time: i64) -> Oid {
        let mut index = Index::new().unwrap();
        let parent_commit = parent.map(|oid| self.repo.find_commit(oid).unwrap());
        if let Some(parent) = &parent_commit {
            index.read_tree(&parent.tree().unwrap()).unwrap();
        }

        for (path, content) in files {
            let blob = self.repo.blob(content.as_bytes()).unwrap();
            index.add(&entry(path, blob, content.len())).unwrap();
        }

        let tree_id = index.write_tree_to(&self.repo).unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let email = format!("{}@example.org", author.to_lowercase().replace(' ', "."));
        let sig = Signature::new(author, &email, &Time::new(time, 0)).unwrap();
        let parents: Vec<&git2::Commit<'_>> = parent_commit.iter().collect();

        self.repo.commit(None, &sig, &sig, message, &tree, &parents).unwrap()
    }

    /// Writes a commit object byte for byte, so headers and text need not be UTF-8.
    /// Reuses the tree of `tree_from`.
    pub fn raw_commit(&self, parent: Oid, tree_from: Oid, header_extra: &[u8], author: &[u8], message: &[u8]) -> Oid {
        let tree = self.repo.find_commit(tree_from).unwrap().tree_id();
        let mut raw = format!("tree {tree}\nparent {parent}\n").into_bytes();
        for role in [&b"author "[..], &b"committer "[..]] {
            raw.extend_from_slice(role);
            raw.extend_from_slice(author);
            raw.extend_from_slice(b" <dev@example.org> 600 +0000\n");
        }
        raw.extend_from_slice(header_extra);
        raw.push(b'\n');
        raw.extend_from_slice(message);
        self.repo.odb().unwrap().write(ObjectType::Commit, &raw).unwrap()
    }

    pub fn branch(&self, name: &str, at: Oid) {
        self.repo
            .reference(&format!("refs/heads/{name}"), at, true, "test branch")
            .unwrap();
    }

    pub fn tag(&self, name: &str, at: Oid) {
        let object = self.repo.find_object(at, Some(ObjectType::Commit)).unwrap();
        self.repo.tag_lightweight(name, &object, true).unwrap();
    }
}

fn entry(path: &str, id: Oid, len: usize) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: 0o100644,
        uid: 0,
        gid: 0,
        file_size: len as u32,
        id,
        flags: 0,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    }
}

/// Ids of the commits in the shared kernel-like fixture
pub struct Fixture {
    pub base: Oid,
    pub t1: Oid,
    pub t2: Oid,
    pub s1: Oid,
    pub s2: Oid,
    pub s3: Oid,
    pub s4: Oid,
}

/// `base` is shared. Target `v1` = base, t1, t2. Source `v2` = base, s1..s4,
/// where s2 carries t1's change under a different author, date and message,
/// and s4 changes nothing.
pub fn kernel_fixture(t: &TestRepo) -> Fixture {
    let base = t.commit(
        None,
        &[
            ("kernel/sched/core.c", "int core;\n"),
            ("drivers/rtc/rtc-x.c", "int timeout = 1;\n"),
            ("net/core.c", "int sock;\n"),
            ("README", "hello\n"),
        ],
        "Initial import",
        "Linus",
        10,
    );

    let t1 = t.commit(Some(base), &[("net/core.c", "int sock;\nint backlog;\n")], "net: add backlog", "Alice", 20);
    let t2 = t.commit(Some(t1), &[("README", "hello\nworld\n")], "docs: expand readme", "Alice", 30);

    let s1 = t.commit(
        Some(base),
        &[("kernel/sched/core.c", "int core;\nint fixed;\n")],
        "Fix null pointer in scheduler core",
        "Bob",
        100,
    );
    let s2 = t.commit(
        Some(s1),
        &[("net/core.c", "int sock;\nint backlog;\n")],
        "net: add backlog\n\n(cherry picked from upstream)\nSigned-off-by: Bob",
        "Bob",
        200,
    );
    let s3 = t.commit(
        Some(s2),
        &[("drivers/rtc/rtc-x.c", "int timeout = 5;\n")],
        "Update rtc driver timeout",
        "Carol",
        300,
    );
    let s4 = t.commit(Some(s3), &[], "Tidy up nothing", "Carol", 400);

    t.branch("v1", t2);
    t.branch("v2", s4);
    t.tag("v6.6.9", t2);
    t.tag("v6.6.10", s4);

    Fixture { base, t1, t2, s1, s2, s3, s4 }
}
