//! Release refs: looking up released versions and moving the
//! `major`, `major.minor` and full-version refs to a release commit.

use semver::Version;
use tracing::{debug, error, info};

use crate::boundary::BoundaryWarning;
use crate::domain::tag::{release_ref_names, strip_release_prefix};
use crate::error::{ChangehelperError, Result};
use crate::git::{RefKind, Repository};
use crate::version::{scoped_versions, ScopedVersions};

/// Release refs of one kind on one remote
pub struct RefUpdater<'a, R: Repository> {
    repo: &'a R,
    remote: String,
    kind: RefKind,
    prefix: String,
}

impl<'a, R: Repository> RefUpdater<'a, R> {
    pub fn new(repo: &'a R, remote: impl Into<String>, kind: RefKind, prefix: impl Into<String>) -> Self {
        RefUpdater {
            repo,
            remote: remote.into(),
            kind,
            prefix: prefix.into(),
        }
    }

    /// Names of the remote release refs with the prefix removed.
    pub fn list(&self) -> Result<Vec<String>> {
        let names = self.repo.list_remote_refs(&self.remote, self.kind)?;
        Ok(names
            .iter()
            .filter_map(|name| strip_release_prefix(&self.prefix, name))
            .map(str::to_string)
            .collect())
    }

    /// Released versions per scope, newest first.
    pub fn released_versions(&self) -> Result<(ScopedVersions, Vec<BoundaryWarning>)> {
        let names = self.list()?;
        debug!(count = names.len(), kind = ?self.kind, "found release refs");
        Ok(scoped_versions(&names))
    }

    /// Point the release refs for `version` at `commit`.
    ///
    /// Every ref is attempted; if any of them fails, all failures are
    /// reported together once the others were tried.
    pub fn update(&self, scope: Option<&str>, version: &Version, commit: &str) -> Result<Vec<String>> {
        let names = release_ref_names(&self.prefix, scope, version);
        let mut failures = Vec::new();

        for name in &names {
            match self.update_ref(name, commit) {
                Ok(()) => info!(git_ref = %name, commit, "release ref updated"),
                Err(e) => {
                    error!(git_ref = %name, error = %e, "failed to update release ref");
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(names)
        } else {
            Err(ChangehelperError::RefUpdate { failures })
        }
    }

    fn update_ref(&self, name: &str, commit: &str) -> Result<()> {
        match self.kind {
            RefKind::Branch => {
                let remote_ref = format!("refs/heads/{}", name);
                self.repo.force_push_ref(&self.remote, commit, &remote_ref)
            }
            RefKind::Tag => {
                if let Err(e) = self.repo.delete_tag(name) {
                    debug!(tag = name, error = %e, "no local tag to delete");
                }
                self.repo.create_tag(name, commit)?;
                self.repo.push_tag(&self.remote, name)
            }
        }
    }
}
