//! Command line surface: clap definitions and their translation into the
//! plain workflow arguments of [`orchestration`].

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, ReleaseConfig};
use crate::domain::change::Category;
use crate::domain::version::Increment;
use crate::error::Result;
use crate::git::Repository;
use crate::ui;
use crate::version::PrereleaseRequest;

pub mod orchestration;

use orchestration::{
    EnforceCommitsArgs, GitOptions, NewVersionArgs, PrintCurrentArgs, PrintUnreleasedArgs,
    RefOptions, ReleaseArgs, UpdateArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "changehelper",
    version,
    about = "Maintain a Keep a Changelog file and release refs from conventional commits"
)]
pub struct Cli {
    /// Logging verbosity, repeat to increase (-l error ... -llll debug)
    #[arg(short = 'l', long = "log-level", action = ArgAction::Count, global = true)]
    pub log_level: u8,

    /// Location of the changelog file [default: ./CHANGELOG.md]
    #[arg(short = 'f', long = "changelog-file", global = true)]
    pub changelog_file: Option<String>,

    /// Custom configuration file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new pending version
    NewVersion(NewVersionCommand),
    /// Print the current version in the changelog file
    PrintCurrent(LookupArgs),
    /// Print the next version of the pending change
    PrintUnreleased {
        /// Print the pending change text instead of the version
        #[arg(long)]
        text: bool,
    },
    /// Turn the pending change into a release in the changelog file
    Update(UpdateCommand),
    /// Commit and push the changelog, then update the release refs
    Release(ReleaseCommand),
    /// Run update, followed by release
    UpdateAndRelease(ReleaseCommand),
    /// Fail unless there is a pending unreleased change
    EnforceUnreleased,
    /// Fail unless recent commits are conventional commits
    EnforceConventionalCommits(EnforceCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub struct GitArgs {
    /// Git branch to run against
    #[arg(short = 'b', long = "git-branch")]
    pub branch: Option<String>,

    /// Working directory of the git repository [default: ./]
    #[arg(short = 'w', long = "git-workdir")]
    pub workdir: Option<String>,

    /// Skip running git checkout
    #[arg(short = 's', long = "skip-git-checkout")]
    pub skip_checkout: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LookupArgs {
    /// Include release refs when looking for the most recent version
    #[arg(short = 'e', long = "git-evaluate")]
    pub evaluate: bool,

    /// Name prefix of release refs [default: release]
    #[arg(short = 'p', long = "git-prefix")]
    pub prefix: Option<String>,

    /// Use tags for releases instead of branches
    #[arg(short = 't', long = "use-tags")]
    pub use_tags: bool,

    /// Do not fetch before reading release refs
    #[arg(long)]
    pub skip_fetch: bool,

    /// Scope of the release refs, e.g. `api` for `release/api/1.2.0`
    #[arg(long)]
    pub scope: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct NewVersionCommand {
    /// Increment to record (MAJOR, MINOR, PATCH or BUILD)
    #[arg(short = 'i', long)]
    pub increment: Option<Increment>,

    /// Overwrite a pending release in the changelog
    #[arg(short = 'o', long)]
    pub force: bool,

    /// Do not evaluate any changes from git
    #[arg(short = 'm', long)]
    pub manual: bool,

    /// Do not prompt
    #[arg(short = 'n', long)]
    pub non_interactive: bool,

    /// Do not infer the increment from conventional commits
    #[arg(short = 'g', long = "ignore-conventional-commits")]
    pub ignore_conventional_commits: bool,

    #[arg(short = 'a', long)]
    pub added: Vec<String>,

    #[arg(short = 'c', long)]
    pub changed: Vec<String>,

    #[arg(short = 'd', long)]
    pub deprecated: Vec<String>,

    #[arg(short = 'r', long)]
    pub removed: Vec<String>,

    #[arg(short = 'x', long)]
    pub fixed: Vec<String>,

    #[arg(short = 'e', long)]
    pub security: Vec<String>,

    #[command(flatten)]
    pub git: GitArgs,
}

impl NewVersionCommand {
    /// Command line entries, in category order.
    pub fn entries(&self) -> Vec<(Category, String)> {
        let per_category = [
            (Category::Added, &self.added),
            (Category::Changed, &self.changed),
            (Category::Deprecated, &self.deprecated),
            (Category::Removed, &self.removed),
            (Category::Fixed, &self.fixed),
            (Category::Security, &self.security),
        ];
        per_category
            .into_iter()
            .flat_map(|(category, entries)| entries.iter().map(move |e| (category, e.clone())))
            .collect()
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpdateCommand {
    #[command(flatten)]
    pub lookup: LookupArgs,

    /// Git branch to run against
    #[arg(short = 'b', long = "git-branch")]
    pub branch: Option<String>,

    /// Working directory of the git repository [default: ./]
    #[arg(short = 'w', long = "git-workdir")]
    pub workdir: Option<String>,

    /// Release a pre-release, optionally with a new identifier label
    #[arg(long, num_args = 0..=1, require_equals = true, value_name = "LABEL")]
    pub prerelease: Option<Option<String>>,

    /// Bump build metadata instead of the version
    #[arg(long)]
    pub build: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReleaseCommand {
    #[command(flatten)]
    pub update: UpdateCommand,

    /// Skip running git checkout
    #[arg(short = 's', long = "skip-git-checkout")]
    pub skip_checkout: bool,

    /// Do not prompt
    #[arg(short = 'n', long)]
    pub non_interactive: bool,

    /// Commit message, `%s` is replaced with the version
    #[arg(short = 'm', long = "git-commit-message")]
    pub commit_message: Option<String>,

    /// Additional files to add to the release commit
    #[arg(short = 'r', long = "release-file")]
    pub release_files: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EnforceCommand {
    /// How many commits to check
    #[arg(short = 'd', long, default_value_t = 1)]
    pub depth: usize,

    /// Check every commit since the changelog last changed (overrides depth)
    #[arg(short = 'u', long = "use-changelog")]
    pub use_changelog: bool,

    /// Pass when at least one conventional commit is found
    #[arg(short = 'a', long)]
    pub allow: bool,

    #[command(flatten)]
    pub git: GitArgs,
}

impl Cli {
    /// Changelog path, from the flag or the configuration.
    pub fn changelog(&self, config: &Config) -> PathBuf {
        PathBuf::from(
            self.changelog_file
                .clone()
                .unwrap_or_else(|| config.changelog.file.clone()),
        )
    }

    /// Git working directory, from the flag or the configuration.
    pub fn workdir(&self, config: &Config) -> PathBuf {
        let flag = match &self.command {
            Command::NewVersion(cmd) => cmd.git.workdir.as_ref(),
            Command::EnforceConventionalCommits(cmd) => cmd.git.workdir.as_ref(),
            Command::Update(cmd) => cmd.workdir.as_ref(),
            Command::Release(cmd) | Command::UpdateAndRelease(cmd) => cmd.update.workdir.as_ref(),
            _ => None,
        };
        PathBuf::from(flag.cloned().unwrap_or_else(|| config.git.workdir.clone()))
    }
}

fn git_options(git: &GitArgs, config: &Config) -> GitOptions {
    GitOptions {
        workdir: PathBuf::from(git.workdir.clone().unwrap_or_else(|| config.git.workdir.clone())),
        branch: git.branch.clone(),
        skip_checkout: git.skip_checkout,
    }
}

fn ref_options(lookup: &LookupArgs, config: &Config) -> RefOptions {
    RefOptions {
        evaluate: lookup.evaluate || config.git.evaluate,
        prefix: lookup.prefix.clone().unwrap_or_else(|| config.git.prefix.clone()),
        use_tags: lookup.use_tags || config.git.use_tags,
        skip_fetch: lookup.skip_fetch || config.git.skip_fetch,
        scope: lookup.scope.clone(),
    }
}

impl NewVersionCommand {
    pub fn to_args(&self, changelog: PathBuf, config: &Config) -> NewVersionArgs {
        NewVersionArgs {
            changelog,
            git: git_options(&self.git, config),
            increment: self.increment,
            force: self.force,
            manual: self.manual,
            non_interactive: self.non_interactive,
            ignore_conventional_commits: self.ignore_conventional_commits,
            entries: self.entries(),
        }
    }
}

impl UpdateCommand {
    fn git(&self, skip_checkout: bool, config: &Config) -> GitOptions {
        let git = GitArgs {
            branch: self.branch.clone(),
            workdir: self.workdir.clone(),
            skip_checkout,
        };
        git_options(&git, config)
    }

    pub fn to_args(&self, changelog: PathBuf, config: &Config) -> UpdateArgs {
        UpdateArgs {
            changelog,
            git: self.git(false, config),
            refs: ref_options(&self.lookup, config),
            prerelease: self
                .prerelease
                .clone()
                .map(|label| PrereleaseRequest { label }),
            build: self.build,
            date: None,
        }
    }
}

impl ReleaseCommand {
    pub fn to_args(&self, changelog: PathBuf, config: &Config) -> ReleaseArgs {
        let mut files = config.release.files.clone();
        files.extend(self.release_files.iter().cloned());
        ReleaseArgs {
            changelog,
            git: self.update.git(self.skip_checkout, config),
            refs: ref_options(&self.update.lookup, config),
            release: ReleaseConfig {
                commit_message: self
                    .commit_message
                    .clone()
                    .unwrap_or_else(|| config.release.commit_message.clone()),
                files,
            },
            non_interactive: self.non_interactive,
        }
    }
}

impl EnforceCommand {
    pub fn to_args(&self, changelog: PathBuf, config: &Config) -> EnforceCommitsArgs {
        EnforceCommitsArgs {
            changelog,
            git: git_options(&self.git, config),
            depth: self.depth,
            use_changelog: self.use_changelog,
            allow: self.allow,
        }
    }
}

/// Run the parsed command against `repo`.
pub fn execute<R: Repository>(cli: &Cli, config: &Config, repo: &R) -> Result<()> {
    let changelog = cli.changelog(config);

    match &cli.command {
        Command::NewVersion(cmd) => {
            let change = orchestration::new_version(repo, &cmd.to_args(changelog, config))?;
            ui::display_success(&format!("Recorded {}", change.header()));
        }
        Command::PrintCurrent(lookup) => {
            let args = PrintCurrentArgs {
                changelog,
                refs: ref_options(lookup, config),
            };
            println!("{}", orchestration::print_current(repo, &args)?);
        }
        Command::PrintUnreleased { text } => {
            let args = PrintUnreleasedArgs {
                changelog,
                text: *text,
            };
            println!("{}", orchestration::print_unreleased(&args)?);
        }
        Command::Update(cmd) => {
            let outcome = orchestration::update(repo, &cmd.to_args(changelog, config))?;
            ui::display_success(&format!("Updated changelog to {}", outcome.version));
        }
        Command::Release(cmd) => {
            if let Some(outcome) = orchestration::release(repo, &cmd.to_args(changelog, config))? {
                ui::display_success(&format!("Released {}", outcome.version));
            }
        }
        Command::UpdateAndRelease(cmd) => {
            let update_args = cmd.update.to_args(changelog.clone(), config);
            let release_args = cmd.to_args(changelog, config);
            let (_, released) =
                orchestration::update_and_release(repo, &update_args, &release_args)?;
            if let Some(outcome) = released {
                ui::display_success(&format!("Released {}", outcome.version));
            }
        }
        Command::EnforceUnreleased => {
            orchestration::enforce_unreleased(&changelog)?;
            ui::display_success("Found a pending unreleased change");
        }
        Command::EnforceConventionalCommits(cmd) => {
            let count =
                orchestration::enforce_conventional_commits(repo, &cmd.to_args(changelog, config))?;
            ui::display_success(&format!("Found {} conventional commits", count));
        }
    }
    Ok(())
}
