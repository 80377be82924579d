//! Git operations abstraction layer
//!
//! The primary abstraction is the [Repository] trait, which defines the
//! version-control operations changehelper needs. The implementations are:
//!
//! - [repository::GitCli]: runs the `git` command line in a working directory
//! - [mock::MockRepository]: an in-memory implementation for testing
//!
//! Most code should depend on the [Repository] trait rather than concrete
//! implementations.
//!
//! ```rust
//! # use changehelper::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> changehelper::Result<()> {
//! let remote = repo.remote_name()?;
//! let commits = repo.list_commits("HEAD", Some(10))?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod mock;
pub mod repository;

pub use command::{run_command, CommandOutput};
pub use mock::MockRepository;
pub use repository::GitCli;

use std::collections::BTreeSet;

use crate::boundary::BoundaryWarning;
use crate::error::{ChangehelperError, Result};

/// Separates the hash from the message in `git log` output
pub const FIELD_SEPARATOR: char = '\x1f';
/// Terminates each record in `git log` output
pub const RECORD_SEPARATOR: char = '\x1e';

/// A commit as listed by the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    /// Full message, subject and body
    pub message: String,
}

impl Commit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Commit {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// First line of the message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }
}

/// Files touched by one commit, by kind of change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub added: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl Diff {
    /// Parse `git diff-tree --name-status -M` output.
    ///
    /// `A` and copies count as added, `M`, `T` and renames as changed (keyed by
    /// the new path), `D` as removed. Other status letters are ignored.
    pub fn parse_name_status(output: &str) -> Self {
        let mut diff = Diff::default();
        for line in output.lines() {
            let mut fields = line.split('\t');
            let status = fields.next().unwrap_or_default().trim();
            let paths: Vec<&str> = fields.collect();
            let Some(path) = paths.last().map(|p| p.to_string()) else {
                continue;
            };
            match status.chars().next() {
                Some('A') | Some('C') => {
                    diff.added.insert(path);
                }
                Some('M') | Some('T') | Some('R') => {
                    diff.changed.insert(path);
                }
                Some('D') => {
                    diff.removed.insert(path);
                }
                _ => {}
            }
        }
        diff
    }

    /// Re-key paths below `dir` as `./<rest>`; other paths stay as they are.
    pub fn relative_to(self, dir: &str) -> Self {
        let dir = dir.trim_start_matches("./").trim_end_matches('/');
        if dir.is_empty() || dir == "." {
            return self;
        }
        let prefix = format!("{}/", dir);
        let rebase = |set: BTreeSet<String>| -> BTreeSet<String> {
            set.into_iter()
                .map(|path| match path.strip_prefix(&prefix) {
                    Some(rest) => format!("./{}", rest),
                    None => path,
                })
                .collect()
        };
        Diff {
            added: rebase(self.added),
            changed: rebase(self.changed),
            removed: rebase(self.removed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Kind of release ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    pub fn from_use_tags(use_tags: bool) -> Self {
        if use_tags {
            RefKind::Tag
        } else {
            RefKind::Branch
        }
    }

    /// `git ls-remote` flag selecting this kind
    pub fn ls_remote_flag(self) -> &'static str {
        match self {
            RefKind::Branch => "--heads",
            RefKind::Tag => "--tags",
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            RefKind::Branch => "refs/heads/",
            RefKind::Tag => "refs/tags/",
        }
    }
}

/// Parse `git log --format=%H%x1f%B%x1e` output, newest first.
pub fn parse_log(output: &str) -> Vec<Commit> {
    output
        .split(RECORD_SEPARATOR)
        .filter_map(|record| {
            let (hash, message) = record.trim_start().split_once(FIELD_SEPARATOR)?;
            Some(Commit::new(hash.trim(), message.trim()))
        })
        .collect()
}

/// Parse `git ls-remote` output into short ref names, dropping peeled entries.
pub fn parse_ls_remote(output: &str, kind: RefKind) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter(|name| !name.ends_with("^{}"))
        .map(|name| name.strip_prefix(kind.namespace()).unwrap_or(name).to_string())
        .collect()
}

/// Pick the remote to use from `git remote` output.
///
/// No remote is an error; with several, the last one listed wins.
pub fn select_remote(output: &str) -> Result<(String, Option<BoundaryWarning>)> {
    let remotes: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let chosen = remotes.last().cloned().ok_or(ChangehelperError::MissingRemote)?;
    let warning = (remotes.len() > 1).then(|| BoundaryWarning::MultipleRemotes {
        chosen: chosen.clone(),
        remotes: remotes.clone(),
    });
    Ok((chosen, warning))
}

/// Version-control operations used by the release workflows
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. A command that exits with a
/// non-zero code is reported as [ChangehelperError::Git].
///
/// ## Implementations
///
/// - [GitCli](repository::GitCli): runs `git` in a working directory
/// - [MockRepository](mock::MockRepository): records calls for tests
pub trait Repository {
    /// Name of the remote to fetch from and push to
    fn remote_name(&self) -> Result<String>;

    fn fetch(&self, remote: &str) -> Result<()>;

    fn pull(&self) -> Result<()>;

    fn checkout(&self, git_ref: &str) -> Result<()>;

    /// Name of the checked out branch
    fn current_branch(&self) -> Result<String>;

    /// Hash of the `HEAD` commit
    fn head_commit(&self) -> Result<String>;

    /// List commits for a revision range such as `abc123..HEAD`, newest first
    ///
    /// # Arguments
    /// * `range` - Anything `git log` accepts as a revision range
    /// * `limit` - Maximum number of commits to return
    fn list_commits(&self, range: &str, limit: Option<usize>) -> Result<Vec<Commit>>;

    /// Files added, changed and removed by a single commit
    fn ref_diff(&self, git_ref: &str) -> Result<Diff>;

    /// Hash of the newest commit that modified `path`, if any
    fn last_modifying_commit(&self, path: &str) -> Result<Option<String>>;

    /// Short names of the branches or tags present on `remote`
    fn list_remote_refs(&self, remote: &str, kind: RefKind) -> Result<Vec<String>>;

    fn add(&self, paths: &[String]) -> Result<()>;

    fn commit(&self, message: &str) -> Result<()>;

    /// Push `branch` to `remote`
    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Force `remote_ref` on `remote` to point at `local`
    fn force_push_ref(&self, remote: &str, local: &str, remote_ref: &str) -> Result<()>;

    fn delete_tag(&self, name: &str) -> Result<()>;

    fn create_tag(&self, name: &str, target: &str) -> Result<()>;

    /// Force-push the tag `name` to `remote`
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;
}
