use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::boundary::BoundaryWarning;
use crate::conventional::{fold_increment, Attribution};
use crate::domain::commit::ParsedCommit;
use crate::domain::version::Increment;
use crate::error::Result;
use crate::git::{Commit, Repository};

/// What the history since the last changelog update amounts to
#[derive(Debug, Clone, Default)]
pub struct HistoryAnalysis {
    /// Commits considered, newest first, without duplicates
    pub commits: Vec<Commit>,
    pub attribution: Attribution,
    /// Aggregated increment, `None` when no commit is conventional
    pub increment: Option<Increment>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Analyzes the commits behind a changelog to propose the pending release
pub struct VersionAnalyzer<'a, R: Repository> {
    repo: &'a R,
}

impl<'a, R: Repository> VersionAnalyzer<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        VersionAnalyzer { repo }
    }

    /// Commits since `changelog_path` was last modified, that commit included.
    ///
    /// When the changelog was never committed, the whole history is used.
    pub fn commits_since_changelog(&self, changelog_path: &str) -> Result<Vec<Commit>> {
        let commits = match self.repo.last_modifying_commit(changelog_path)? {
            Some(last) => {
                debug!(commit = %last, "changelog last modified");
                let mut commits = self.repo.list_commits(&format!("{}..HEAD", last), None)?;
                commits.extend(self.repo.list_commits(&last, Some(1))?);
                commits
            }
            None => self.repo.list_commits("HEAD", None)?,
        };

        let mut seen = HashSet::new();
        Ok(commits
            .into_iter()
            .filter(|c| seen.insert(c.hash.clone()))
            .collect())
    }

    /// Classify the commits behind `changelog_path` and attribute their files.
    pub fn analyze(&self, changelog_path: &str) -> Result<HistoryAnalysis> {
        let commits = self.commits_since_changelog(changelog_path)?;
        Ok(self.analyze_commits(commits, changelog_dir(changelog_path).as_deref()))
    }

    /// Classify `commits`; file paths below `relative_dir` are re-keyed to it.
    pub fn analyze_commits(&self, commits: Vec<Commit>, relative_dir: Option<&str>) -> HistoryAnalysis {
        let mut analysis = HistoryAnalysis::default();

        for commit in &commits {
            let Some(parsed) = ParsedCommit::parse(&commit.message) else {
                analysis.warnings.push(BoundaryWarning::NonConventionalCommit {
                    commit: commit.hash.clone(),
                    subject: commit.subject().to_string(),
                });
                continue;
            };

            analysis.increment = fold_increment(analysis.increment, &parsed);

            match self.repo.ref_diff(&commit.hash) {
                Ok(diff) => {
                    let diff = match relative_dir {
                        Some(dir) => diff.relative_to(dir),
                        None => diff,
                    };
                    analysis
                        .attribution
                        .record(parsed.commit_type, &commit.hash, commit.subject(), &diff);
                }
                Err(e) => {
                    let warning = BoundaryWarning::DiffUnavailable {
                        commit: commit.hash.clone(),
                        reason: e.to_string(),
                    };
                    warn!("{}", warning);
                    analysis.warnings.push(warning);
                }
            }
        }

        debug!(
            commits = commits.len(),
            increment = ?analysis.increment,
            "analyzed history"
        );
        analysis.commits = commits;
        analysis
    }
}

/// Directory holding the changelog, relative to the repository root
fn changelog_dir(changelog_path: &str) -> Option<String> {
    let parent = Path::new(changelog_path).parent()?.to_str()?;
    let dir = parent.strip_prefix("./").unwrap_or(parent);
    (!dir.is_empty() && dir != ".").then(|| dir.to_string())
}
