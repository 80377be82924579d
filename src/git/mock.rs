use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::{ChangehelperError, Result};
use crate::git::{Commit, Diff, RefKind, Repository};

/// Mock repository for testing without running git
///
/// Commits are held newest first, like `git log` lists them. Every mutating
/// call is recorded and can be inspected with [MockRepository::calls].
pub struct MockRepository {
    remotes: Vec<String>,
    branch: String,
    commits: Vec<Commit>,
    diffs: HashMap<String, Diff>,
    last_modified: HashMap<String, String>,
    remote_refs: HashMap<RefKind, Vec<String>>,
    failing_refs: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl MockRepository {
    /// Create a mock with a single `origin` remote on branch `main`
    pub fn new() -> Self {
        MockRepository {
            remotes: vec!["origin".to_string()],
            branch: "main".to_string(),
            commits: Vec::new(),
            diffs: HashMap::new(),
            last_modified: HashMap::new(),
            remote_refs: HashMap::new(),
            failing_refs: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_remotes(&mut self, remotes: &[&str]) {
        self.remotes = remotes.iter().map(|r| r.to_string()).collect();
    }

    /// Add a commit on top of the history, with the files it touched
    pub fn add_commit(&mut self, commit: Commit, diff: Diff) {
        self.diffs.insert(commit.hash.clone(), diff);
        self.commits.insert(0, commit);
    }

    /// Record `hash` as the last commit that modified `path`
    pub fn set_last_modified(&mut self, path: impl Into<String>, hash: impl Into<String>) {
        self.last_modified.insert(path.into(), hash.into());
    }

    pub fn add_remote_ref(&mut self, kind: RefKind, name: impl Into<String>) {
        self.remote_refs.entry(kind).or_default().push(name.into());
    }

    /// Make every push or tag operation on `name` fail
    pub fn fail_ref(&mut self, name: impl Into<String>) {
        self.failing_refs.insert(name.into());
    }

    /// Calls that changed repository state, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn check_ref(&self, command: &str, name: &str) -> Result<()> {
        if self.failing_refs.contains(name) {
            return Err(ChangehelperError::git(command, 1, format!("rejected {}", name)));
        }
        Ok(())
    }

    /// Commits newer than `hash`, or all when `hash` is unknown
    fn commits_after(&self, hash: &str) -> Vec<Commit> {
        self.commits
            .iter()
            .take_while(|c| c.hash != hash)
            .cloned()
            .collect()
    }

    /// `hash` and everything older
    fn commits_from(&self, hash: &str) -> Vec<Commit> {
        self.commits
            .iter()
            .skip_while(|c| c.hash != hash)
            .cloned()
            .collect()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn remote_name(&self) -> Result<String> {
        self.remotes.last().cloned().ok_or(ChangehelperError::MissingRemote)
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.record(format!("fetch {}", remote));
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        self.record("pull".to_string());
        Ok(())
    }

    fn checkout(&self, git_ref: &str) -> Result<()> {
        self.record(format!("checkout {}", git_ref));
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn head_commit(&self) -> Result<String> {
        Ok(self
            .commits
            .first()
            .map(|c| c.hash.clone())
            .unwrap_or_else(|| "HEAD".to_string()))
    }

    fn list_commits(&self, range: &str, limit: Option<usize>) -> Result<Vec<Commit>> {
        let commits = match range.split_once("..") {
            Some((from, _)) => self.commits_after(from),
            None if range.is_empty() || range == "HEAD" => self.commits.clone(),
            None => self.commits_from(range),
        };
        Ok(commits
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn ref_diff(&self, git_ref: &str) -> Result<Diff> {
        self.diffs.get(git_ref).cloned().ok_or_else(|| {
            ChangehelperError::git(format!("git diff-tree {}", git_ref), 128, "bad object")
        })
    }

    fn last_modifying_commit(&self, path: &str) -> Result<Option<String>> {
        Ok(self.last_modified.get(path).cloned())
    }

    fn list_remote_refs(&self, _remote: &str, kind: RefKind) -> Result<Vec<String>> {
        Ok(self.remote_refs.get(&kind).cloned().unwrap_or_default())
    }

    fn add(&self, paths: &[String]) -> Result<()> {
        self.record(format!("add {}", paths.join(" ")));
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record(format!("commit {}", message));
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("push {} {}", remote, branch));
        Ok(())
    }

    fn force_push_ref(&self, remote: &str, local: &str, remote_ref: &str) -> Result<()> {
        let name = remote_ref.trim_start_matches("refs/heads/");
        self.check_ref("git push --force", name)?;
        self.record(format!("force-push {} {}:{}", remote, local, remote_ref));
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.record(format!("delete-tag {}", name));
        Ok(())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        self.check_ref("git tag", name)?;
        self.record(format!("tag {} {}", name, target));
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        self.record(format!("push-tag {} {}", remote, name));
        Ok(())
    }
}
