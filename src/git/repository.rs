use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ChangehelperError, Result};
use crate::git::command::{run_command, CommandOutput};
use crate::git::{parse_log, parse_ls_remote, select_remote, Commit, Diff, RefKind};

const LOG_FORMAT: &str = "--format=%H%x1f%B%x1e";

/// Repository backed by the `git` command line
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Run git commands inside `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        GitCli {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        run_command(&self.workdir, "git", args)
    }

    /// Run and fail on a non-zero exit code, returning stdout
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.success() {
            return Err(ChangehelperError::git(
                format!("git {}", args.join(" ")),
                output.code,
                output.stderr.trim(),
            ));
        }
        Ok(output.stdout)
    }
}

impl super::Repository for GitCli {
    fn remote_name(&self) -> Result<String> {
        let output = self.run_checked(&["remote"])?;
        let (remote, warning) = select_remote(&output)?;
        if let Some(warning) = warning {
            warn!("{}", warning);
        }
        Ok(remote)
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run_checked(&["fetch", remote])?;
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        self.run_checked(&["pull"])?;
        Ok(())
    }

    fn checkout(&self, git_ref: &str) -> Result<()> {
        self.run_checked(&["checkout", git_ref])?;
        info!(git_ref, "checked out");
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self
            .run_checked(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    fn head_commit(&self) -> Result<String> {
        Ok(self.run_checked(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn list_commits(&self, range: &str, limit: Option<usize>) -> Result<Vec<Commit>> {
        let limit = limit.map(|n| n.to_string());
        let mut args = vec!["log", LOG_FORMAT];
        if let Some(limit) = limit.as_deref() {
            args.extend(["-n", limit]);
        }
        if !range.is_empty() {
            args.push(range);
        }
        Ok(parse_log(&self.run_checked(&args)?))
    }

    fn ref_diff(&self, git_ref: &str) -> Result<Diff> {
        let output = self.run_checked(&[
            "diff-tree",
            "--no-commit-id",
            "--name-status",
            "-r",
            "-M",
            "--root",
            git_ref,
        ])?;
        Ok(Diff::parse_name_status(&output))
    }

    fn last_modifying_commit(&self, path: &str) -> Result<Option<String>> {
        let output = self.run_checked(&["log", "-n", "1", "--format=%H", "--", path])?;
        let hash = output.trim();
        Ok((!hash.is_empty()).then(|| hash.to_string()))
    }

    fn list_remote_refs(&self, remote: &str, kind: RefKind) -> Result<Vec<String>> {
        let output = self.run_checked(&["ls-remote", kind.ls_remote_flag(), remote])?;
        Ok(parse_ls_remote(&output, kind))
    }

    fn add(&self, paths: &[String]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_checked(&args)?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "-m", message])?;
        info!(message, "committed");
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_checked(&["push", remote, branch])?;
        info!(remote, branch, "pushed");
        Ok(())
    }

    fn force_push_ref(&self, remote: &str, local: &str, remote_ref: &str) -> Result<()> {
        let refspec = format!("{}:{}", local, remote_ref);
        self.run_checked(&["push", "--force", remote, &refspec])?;
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.run_checked(&["tag", "-d", name])?;
        Ok(())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        self.run_checked(&["tag", name, target])?;
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}", name);
        self.run_checked(&["push", "--force", remote, &refspec])?;
        Ok(())
    }
}
