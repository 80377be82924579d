//! Workflow orchestration for every changehelper operation
//!
//! Each workflow takes plain argument structs instead of the clap types so it
//! can be driven programmatically (and against a mock repository in tests).

use chrono::Local;
use semver::Version;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::analyzer::{HistoryAnalysis, VersionAnalyzer};
use crate::boundary::BoundaryWarning;
use crate::changelog::{ensure_changelog, parse_changelog_file, write_changelog, ParsedChangelog};
use crate::config::ReleaseConfig;
use crate::conventional::resolve_increment;
use crate::domain::change::{Category, Change};
use crate::domain::commit::ParsedCommit;
use crate::domain::version::{bump, Increment};
use crate::error::{ChangehelperError, Result};
use crate::git::{Commit, RefKind, Repository};
use crate::release::RefUpdater;
use crate::ui;
use crate::version::{latest_version, needs_release, next_version, PrereleaseRequest};

/// Where and how to use the git working copy
#[derive(Debug, Clone, PartialEq)]
pub struct GitOptions {
    pub workdir: PathBuf,
    /// Branch to check out before reading history
    pub branch: Option<String>,
    pub skip_checkout: bool,
}

impl Default for GitOptions {
    fn default() -> Self {
        GitOptions {
            workdir: PathBuf::from("./"),
            branch: None,
            skip_checkout: false,
        }
    }
}

impl GitOptions {
    /// Check out the configured branch, if any.
    fn checkout<R: Repository>(&self, repo: &R) -> Result<bool> {
        match &self.branch {
            Some(branch) if !self.skip_checkout => {
                repo.checkout(branch)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Path of `file` as git sees it from the working directory.
    pub fn repo_path(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.workdir).unwrap_or(file);
        relative.to_string_lossy().into_owned()
    }
}

/// Release ref lookup settings
#[derive(Debug, Clone, PartialEq)]
pub struct RefOptions {
    /// Merge versions found in release refs with the changelog ones
    pub evaluate: bool,
    pub prefix: String,
    pub use_tags: bool,
    pub skip_fetch: bool,
    pub scope: Option<String>,
}

impl Default for RefOptions {
    fn default() -> Self {
        RefOptions {
            evaluate: false,
            prefix: "release".to_string(),
            use_tags: false,
            skip_fetch: false,
            scope: None,
        }
    }
}

impl RefOptions {
    fn kind(&self) -> RefKind {
        RefKind::from_use_tags(self.use_tags)
    }

    fn scope_key(&self) -> &str {
        self.scope.as_deref().unwrap_or_default()
    }
}

/// Arguments for `new-version`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewVersionArgs {
    pub changelog: PathBuf,
    pub git: GitOptions,
    pub increment: Option<Increment>,
    /// Replace an existing pending block
    pub force: bool,
    /// Do not read git history
    pub manual: bool,
    pub non_interactive: bool,
    pub ignore_conventional_commits: bool,
    /// Entries given on the command line
    pub entries: Vec<(Category, String)>,
}

/// Arguments for `print-current`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrintCurrentArgs {
    pub changelog: PathBuf,
    pub refs: RefOptions,
}

/// Arguments for `print-unreleased`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrintUnreleasedArgs {
    pub changelog: PathBuf,
    /// Print the pending block instead of the version
    pub text: bool,
}

/// Arguments for `update`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateArgs {
    pub changelog: PathBuf,
    pub git: GitOptions,
    pub refs: RefOptions,
    pub prerelease: Option<PrereleaseRequest>,
    /// Bump build metadata only
    pub build: bool,
    /// Release date, today when `None`
    pub date: Option<String>,
}

/// Arguments for `release`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseArgs {
    pub changelog: PathBuf,
    pub git: GitOptions,
    pub refs: RefOptions,
    pub release: ReleaseConfig,
    pub non_interactive: bool,
}

/// Arguments for `enforce-conventional-commits`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnforceCommitsArgs {
    pub changelog: PathBuf,
    pub git: GitOptions,
    pub depth: usize,
    /// Check every commit since the changelog last changed instead of `depth`
    pub use_changelog: bool,
    /// Pass when at least one commit is conventional
    pub allow: bool,
}

/// Result of a successful `update`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub previous: Option<Version>,
    pub version: Version,
    pub change: Change,
}

/// Result of a successful `release`
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub version: Version,
    pub commit: String,
    /// Release refs moved to the commit; empty when the version was already released
    pub refs: Vec<String>,
}

fn report(warnings: &[BoundaryWarning]) {
    for warning in warnings {
        warn!("{}", warning);
        ui::display_boundary_warning(warning);
    }
}

fn analyze_history<R: Repository>(repo: &R, changelog: &Path, git: &GitOptions) -> Result<HistoryAnalysis> {
    let analysis = VersionAnalyzer::new(repo).analyze(&git.repo_path(changelog))?;
    report(&analysis.warnings);
    Ok(analysis)
}

/// Released versions known for the scope: the changelog ones, plus the
/// release refs on the remote when `refs.evaluate` is set.
fn known_versions<R: Repository>(
    repo: &R,
    parsed: &ParsedChangelog,
    refs: &RefOptions,
) -> Result<Vec<Version>> {
    let mut versions = parsed.released_versions();
    if refs.evaluate {
        let remote = repo.remote_name()?;
        if !refs.skip_fetch {
            repo.fetch(&remote)?;
        }
        let updater = RefUpdater::new(repo, remote, refs.kind(), refs.prefix.clone());
        let (mut scoped, warnings) = updater.released_versions()?;
        report(&warnings);
        versions.extend(scoped.remove(refs.scope_key()).unwrap_or_default());
    }
    Ok(versions)
}

/// Create a pending `[Unreleased]` block.
pub fn new_version<R: Repository>(repo: &R, args: &NewVersionArgs) -> Result<Change> {
    if ensure_changelog(&args.changelog)? {
        ui::display_status(&format!("Created {}", args.changelog.display()));
    }

    let parsed = parse_changelog_file(&args.changelog)?;
    if parsed.unreleased.is_some() && !args.force {
        return Err(ChangehelperError::changelog(
            "a pending unreleased change already exists",
        ));
    }

    let mut entries = Change::unreleased(None);
    for (category, entry) in &args.entries {
        entries.push_entry(*category, entry.as_str());
    }

    let mut increment = args.increment;
    if !args.manual {
        args.git.checkout(repo)?;
        let analysis = analyze_history(repo, &args.changelog, &args.git)?;
        if !args.non_interactive {
            ui::display_commit_analysis(&analysis.commits);
        }
        analysis.attribution.apply_to(&mut entries);
        if increment.is_none() && !args.ignore_conventional_commits {
            increment = analysis.increment;
        }
    }

    if !args.non_interactive {
        for category in Category::ALL {
            entries.extend_entries(category, ui::prompt_entries(category)?);
        }
        increment = ui::prompt_increment(increment)?;
    }

    let mut change = Change::unreleased(increment);
    change.merge(entries);
    write_changelog(&args.changelog, &change, &parsed.released)?;
    info!(header = change.header(), "pending release recorded");
    Ok(change)
}

/// Latest released version.
pub fn print_current<R: Repository>(repo: &R, args: &PrintCurrentArgs) -> Result<Version> {
    let parsed = parse_changelog_file(&args.changelog)?;
    let versions = known_versions(repo, &parsed, &args.refs)?;
    latest_version(&versions)
        .cloned()
        .ok_or_else(|| ChangehelperError::changelog("no releases found in changelog file"))
}

/// Next version from the pending block, or the rendered block with `text`.
pub fn print_unreleased(args: &PrintUnreleasedArgs) -> Result<String> {
    let parsed = parse_changelog_file(&args.changelog)?;
    let pending = parsed
        .unreleased
        .as_ref()
        .ok_or_else(|| ChangehelperError::no_changes("an unreleased change couldn't be found"))?;

    if args.text {
        return Ok(pending.render());
    }

    let increment = match parsed.explicit_increment()? {
        Some(increment) => increment,
        None => resolve_increment(pending.all_entries())?,
    };
    let latest = parsed.latest_version().unwrap_or_else(|| Version::new(0, 0, 0));
    Ok(bump(&latest, increment)?.to_string())
}

/// Turn the pending block (or one built from git history) into a release.
pub fn update<R: Repository>(repo: &R, args: &UpdateArgs) -> Result<UpdateOutcome> {
    args.git.checkout(repo)?;

    let parsed = parse_changelog_file(&args.changelog)?;
    let versions = known_versions(repo, &parsed, &args.refs)?;
    let previous = latest_version(&versions).cloned();
    let latest = previous.clone().unwrap_or_else(|| Version::new(0, 0, 0));

    let (pending, explicit) = match &parsed.unreleased {
        Some(change) => (change.clone(), parsed.explicit_increment()?),
        None => {
            info!("no pending release in changelog, reading git history");
            let analysis = analyze_history(repo, &args.changelog, &args.git)?;
            let mut change = Change::unreleased(analysis.increment);
            analysis.attribution.apply_to(&mut change);
            (change, analysis.increment)
        }
    };

    let increment = if args.build {
        Increment::Build
    } else {
        match explicit {
            Some(increment) => increment,
            None => resolve_increment(pending.all_entries())?,
        }
    };
    let version = next_version(&latest, increment, args.prerelease.as_ref())?;
    debug!(%latest, %increment, %version, "reconciled version");

    let date = args
        .date
        .clone()
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
    let mut change = Change::released(version.clone(), &date);
    change.merge(pending);
    write_changelog(&args.changelog, &change, &parsed.released)?;

    ui::display_version_change(previous.as_ref(), &version);
    Ok(UpdateOutcome {
        previous,
        version,
        change,
    })
}

/// Commit and push the changelog, then move the release refs.
///
/// Returns `None` when the user declined the confirmation.
pub fn release<R: Repository>(repo: &R, args: &ReleaseArgs) -> Result<Option<ReleaseOutcome>> {
    let parsed = parse_changelog_file(&args.changelog)?;
    let version = parsed
        .latest_version()
        .ok_or_else(|| ChangehelperError::changelog("no releases found in changelog file"))?;

    let remote = repo.remote_name()?;
    if args.git.checkout(repo)? {
        repo.pull()?;
    }
    let branch = match &args.git.branch {
        Some(branch) => branch.clone(),
        None => repo.current_branch()?,
    };

    if !args.non_interactive
        && !ui::confirm_action(&format!(
            "Release version {} from '{}' to '{}'?",
            version, branch, remote
        ))?
    {
        println!("Operation cancelled by user.");
        return Ok(None);
    }

    let mut files = vec![args.git.repo_path(&args.changelog)];
    files.extend(args.release.files.iter().cloned());
    repo.add(&files)?;
    repo.commit(&args.release.commit_message_for(&version.to_string()))?;
    repo.push(&remote, &branch)?;
    let commit = repo.head_commit()?;
    ui::display_success(&format!("Pushed release commit for {}", version));

    if !args.refs.skip_fetch {
        repo.fetch(&remote)?;
    }
    let updater = RefUpdater::new(repo, remote.clone(), args.refs.kind(), args.refs.prefix.clone());
    let (scoped, warnings) = updater.released_versions()?;
    report(&warnings);

    let latest_in_scope = scoped.get(args.refs.scope_key()).and_then(|v| v.first());
    let refs = if needs_release(latest_in_scope, &version) {
        let refs = updater.update(args.refs.scope.as_deref(), &version, &commit)?;
        ui::display_release_refs(&refs, &remote);
        refs
    } else {
        report(&[BoundaryWarning::AlreadyReleased {
            version: version.to_string(),
        }]);
        Vec::new()
    };

    Ok(Some(ReleaseOutcome {
        version,
        commit,
        refs,
    }))
}

/// `update` followed by `release`.
pub fn update_and_release<R: Repository>(
    repo: &R,
    update_args: &UpdateArgs,
    release_args: &ReleaseArgs,
) -> Result<(UpdateOutcome, Option<ReleaseOutcome>)> {
    let updated = update(repo, update_args)?;
    let released = release(repo, release_args)?;
    Ok((updated, released))
}

/// Fail unless the changelog has a pending block.
pub fn enforce_unreleased(changelog: &Path) -> Result<()> {
    let parsed = parse_changelog_file(changelog)?;
    if parsed.unreleased.is_none() {
        return Err(ChangehelperError::no_changes(
            "an unreleased change couldn't be found",
        ));
    }
    Ok(())
}

/// Check that recent commits are conventional.
///
/// Returns how many of the checked commits are.
pub fn enforce_conventional_commits<R: Repository>(repo: &R, args: &EnforceCommitsArgs) -> Result<usize> {
    args.git.checkout(repo)?;

    let commits: Vec<Commit> = if args.use_changelog {
        match repo.last_modifying_commit(&args.git.repo_path(&args.changelog))? {
            Some(last) => repo.list_commits(&format!("{}..HEAD", last), None)?,
            None => repo.list_commits("HEAD", None)?,
        }
    } else {
        repo.list_commits("HEAD", Some(args.depth))?
    };

    let (conventional, other): (Vec<&Commit>, Vec<&Commit>) = commits
        .iter()
        .partition(|commit| ParsedCommit::parse(&commit.message).is_some());
    debug!(
        checked = commits.len(),
        conventional = conventional.len(),
        "checked commits"
    );

    let failing = if args.allow {
        conventional.is_empty() && !other.is_empty()
    } else {
        !other.is_empty()
    };
    if failing {
        return Err(ChangehelperError::NonConventional {
            commits: other
                .iter()
                .map(|commit| {
                    let hash: String = commit.hash.chars().take(7).collect();
                    format!("{} {}", hash, commit.subject())
                })
                .collect(),
        });
    }
    Ok(conventional.len())
}
