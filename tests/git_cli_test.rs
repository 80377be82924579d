// tests/git_cli_test.rs
//
// Runs the `git` command line against fixture repositories built with git2.
use changehelper::analyzer::VersionAnalyzer;
use changehelper::cli::orchestration::{release, GitOptions, ReleaseArgs};
use changehelper::domain::Increment;
use changehelper::error::{ChangehelperError, ExitCode};
use changehelper::git::{GitCli, RefKind, Repository};
use changehelper::release::RefUpdater;
use semver::Version;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    repo: git2::Repository,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Release Bot").unwrap();
            config.set_str("user.email", "release@example.com").unwrap();
        }
        Fixture { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> GitCli {
        GitCli::new(self.path())
    }

    /// Write and remove files, then commit everything staged.
    fn commit(&self, write: &[(&str, &str)], remove: &[&str], message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        for (path, contents) in write {
            let full = self.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, contents).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        for path in remove {
            fs::remove_file(self.path().join(path)).unwrap();
            index.remove_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = git2::Signature::now("Release Bot", "release@example.com").unwrap();
        let parent = self.repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    /// Four commits; the second one introduces the changelog.
    fn with_history(&self) -> [String; 4] {
        let c1 = self.commit(
            &[("README.md", "# demo\n"), ("legacy.rs", "fn old() {}\n")],
            &[],
            "docs: start the project",
        );
        let c2 = self.commit(&[("CHANGELOG.md", "# Changelog\n")], &[], "chore: add changelog");
        let c3 = self.commit(
            &[("src/search.rs", "pub fn search() {}\n"), ("README.md", "# demo\n\nsearch\n")],
            &[],
            "feat(search): add search\n\nLonger description.",
        );
        let c4 = self.commit(&[], &["legacy.rs"], "fix: drop legacy loader");
        [c1, c2, c3, c4]
    }

    /// Bare repository registered as `origin`.
    fn with_remote(&self) -> TempDir {
        let remote = TempDir::new().unwrap();
        git2::Repository::init_bare(remote.path()).unwrap();
        self.repo
            .remote("origin", remote.path().to_str().unwrap())
            .unwrap();
        remote
    }
}

#[test]
fn test_list_commits_newest_first() {
    let fixture = Fixture::new();
    let [c1, c2, c3, c4] = fixture.with_history();
    let git = fixture.git();

    let all = git.list_commits("HEAD", None).unwrap();
    let hashes: Vec<&str> = all.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(hashes, [c4.as_str(), c3.as_str(), c2.as_str(), c1.as_str()]);
    assert_eq!(all[1].message, "feat(search): add search\n\nLonger description.");
    assert_eq!(all[1].subject(), "feat(search): add search");

    assert_eq!(git.list_commits("HEAD", Some(2)).unwrap().len(), 2);

    let since: Vec<String> = git
        .list_commits(&format!("{}..HEAD", c2), None)
        .unwrap()
        .into_iter()
        .map(|c| c.hash)
        .collect();
    assert_eq!(since, [c4.clone(), c3]);

    assert_eq!(git.head_commit().unwrap(), c4);
}

#[test]
fn test_last_modifying_commit() {
    let fixture = Fixture::new();
    let [_, c2, _, _] = fixture.with_history();
    let git = fixture.git();

    assert_eq!(git.last_modifying_commit("CHANGELOG.md").unwrap(), Some(c2));
    assert_eq!(git.last_modifying_commit("missing.md").unwrap(), None);
}

#[test]
fn test_ref_diff() {
    let fixture = Fixture::new();
    let [c1, _, c3, c4] = fixture.with_history();
    let git = fixture.git();

    let root = git.ref_diff(&c1).unwrap();
    assert!(root.added.contains("README.md"));
    assert!(root.added.contains("legacy.rs"));

    let feature = git.ref_diff(&c3).unwrap();
    assert!(feature.added.contains("src/search.rs"));
    assert!(feature.changed.contains("README.md"));
    assert!(feature.removed.is_empty());

    let fix = git.ref_diff(&c4).unwrap();
    assert!(fix.removed.contains("legacy.rs"));
    assert!(fix.added.is_empty() && fix.changed.is_empty());
}

#[test]
fn test_analyze_real_history() {
    let fixture = Fixture::new();
    fixture.with_history();
    let git = fixture.git();

    let analysis = VersionAnalyzer::new(&git).analyze("CHANGELOG.md").unwrap();
    assert_eq!(analysis.commits.len(), 3);
    assert_eq!(analysis.increment, Some(Increment::Minor));
    assert!(analysis.warnings.is_empty());
}

#[test]
fn test_failed_command_is_git_error() {
    let fixture = Fixture::new();
    fixture.with_history();

    let err = fixture.git().checkout("no-such-branch").unwrap_err();
    match &err {
        ChangehelperError::Git { command, code, .. } => {
            assert_eq!(command, "git checkout no-such-branch");
            assert_ne!(*code, 0);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(err.exit_code(), ExitCode::Exec);
}

#[test]
fn test_missing_remote() {
    let fixture = Fixture::new();
    fixture.with_history();

    let err = fixture.git().remote_name().unwrap_err();
    assert!(matches!(err, ChangehelperError::MissingRemote));
}

#[test]
fn test_release_refs_on_bare_remote() {
    let fixture = Fixture::new();
    fixture.with_history();
    let _remote = fixture.with_remote();
    let git = fixture.git();

    assert_eq!(git.remote_name().unwrap(), "origin");
    let head = git.head_commit().unwrap();

    let branches = RefUpdater::new(&git, "origin", RefKind::Branch, "release");
    branches.update(None, &Version::new(1, 2, 0), &head).unwrap();
    let (versions, warnings) = branches.released_versions().unwrap();
    assert!(warnings.is_empty());
    // `release/1` reads as 1.0.0, `release/1.2` and `release/1.2.0` as 1.2.0
    assert_eq!(versions[""], vec![Version::new(1, 2, 0), Version::new(1, 0, 0)]);

    let tags = RefUpdater::new(&git, "origin", RefKind::Tag, "release");
    tags.update(Some("api"), &Version::new(0, 3, 1), &head).unwrap();
    // updating again moves the existing tags
    tags.update(Some("api"), &Version::new(0, 3, 1), &head).unwrap();
    let mut names = tags.list().unwrap();
    names.sort();
    assert_eq!(names, ["api/0", "api/0.3", "api/0.3.1"]);
}

#[test]
fn test_release_workflow_against_git() {
    let fixture = Fixture::new();
    fixture.with_history();
    let _remote = fixture.with_remote();
    let git = fixture.git();

    let changelog = fixture.path().join("CHANGELOG.md");
    fs::write(
        &changelog,
        "# Changelog\n\n## [0.2.0] - 2024-06-01\n### Added\n- search\n",
    )
    .unwrap();

    let args = ReleaseArgs {
        changelog: changelog.clone(),
        git: GitOptions {
            workdir: fixture.path().to_path_buf(),
            ..GitOptions::default()
        },
        non_interactive: true,
        ..ReleaseArgs::default()
    };
    let outcome = release(&git, &args).unwrap().unwrap();

    assert_eq!(outcome.version, Version::new(0, 2, 0));
    assert_eq!(outcome.refs, ["release/0", "release/0.2", "release/0.2.0"]);
    let head = git.list_commits("HEAD", Some(1)).unwrap();
    assert_eq!(head[0].message, "[skip ci] Release version 0.2.0");
    assert_eq!(head[0].hash, outcome.commit);

    let remote_branches = git.list_remote_refs("origin", RefKind::Branch).unwrap();
    assert!(remote_branches.contains(&"release/0.2.0".to_string()));
    assert!(remote_branches.contains(&git.current_branch().unwrap()));
}
