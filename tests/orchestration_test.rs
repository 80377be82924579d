// tests/orchestration_test.rs
use changehelper::changelog::parse_changelog_file;
use changehelper::cli::orchestration::{
    enforce_conventional_commits, enforce_unreleased, new_version, print_current,
    print_unreleased, release, update, update_and_release, EnforceCommitsArgs, GitOptions,
    NewVersionArgs, PrintCurrentArgs, PrintUnreleasedArgs, RefOptions, ReleaseArgs, UpdateArgs,
};
use changehelper::domain::{Category, Increment};
use changehelper::error::{ChangehelperError, ExitCode};
use changehelper::git::{Commit, Diff, MockRepository, RefKind};
use changehelper::version::PrereleaseRequest;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RELEASED_ONLY: &str = "# Changelog

## [1.2.3] - 2024-01-15
### Fixed
- entry
";

fn changelog(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("CHANGELOG.md");
    fs::write(&path, contents).unwrap();
    path
}

fn git_for(dir: &TempDir) -> GitOptions {
    GitOptions {
        workdir: dir.path().to_path_buf(),
        ..GitOptions::default()
    }
}

fn diff(added: &[&str], changed: &[&str]) -> Diff {
    Diff {
        added: added.iter().map(|p| p.to_string()).collect(),
        changed: changed.iter().map(|p| p.to_string()).collect(),
        ..Diff::default()
    }
}

/// History where `c2` is the last release commit touching the changelog
fn history() -> MockRepository {
    let mut repo = MockRepository::new();
    repo.add_commit(Commit::new("c1", "feat: initial"), diff(&["src/lib.rs"], &[]));
    repo.add_commit(
        Commit::new("c2", "[skip ci] Release version 1.2.3"),
        diff(&[], &["CHANGELOG.md"]),
    );
    repo.add_commit(Commit::new("c3", "feat(search): add search"), diff(&["src/search.rs"], &[]));
    repo.add_commit(Commit::new("c4", "fix: crash on empty input"), diff(&[], &["src/lib.rs"]));
    repo.set_last_modified("CHANGELOG.md", "c2");
    repo
}

fn update_args(path: &Path, dir: &TempDir) -> UpdateArgs {
    UpdateArgs {
        changelog: path.to_path_buf(),
        git: git_for(dir),
        date: Some("2024-06-01".to_string()),
        ..UpdateArgs::default()
    }
}

fn release_args(path: &Path, dir: &TempDir) -> ReleaseArgs {
    ReleaseArgs {
        changelog: path.to_path_buf(),
        git: git_for(dir),
        non_interactive: true,
        ..ReleaseArgs::default()
    }
}

#[test]
fn test_new_version_from_history() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let repo = history();

    let args = NewVersionArgs {
        changelog: path.clone(),
        git: git_for(&dir),
        non_interactive: true,
        entries: vec![(Category::Security, "audit dependencies".to_string())],
        ..NewVersionArgs::default()
    };
    let change = new_version(&repo, &args).unwrap();
    assert_eq!(change.header(), "## [Unreleased] - MINOR");

    let parsed = parse_changelog_file(&path).unwrap();
    assert_eq!(parsed.explicit_increment().unwrap(), Some(Increment::Minor));
    let pending = parsed.unreleased.as_ref().unwrap();
    assert_eq!(pending.entries(Category::Added), ["src/search.rs; feat(search): add search"]);
    assert_eq!(pending.entries(Category::Fixed), ["src/lib.rs; fix: crash on empty input"]);
    assert_eq!(pending.entries(Category::Security), ["audit dependencies"]);
    // the release commit is not conventional and only touched the changelog
    assert!(pending.entries(Category::Changed).is_empty());
    assert_eq!(parsed.released_versions(), vec![Version::new(1, 2, 3)]);
}

#[test]
fn test_new_version_refuses_existing_pending_change() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, "## [Unreleased]\n### Added\n- x\n");
    let repo = MockRepository::new();

    let args = NewVersionArgs {
        changelog: path.clone(),
        manual: true,
        non_interactive: true,
        entries: vec![(Category::Added, "y".to_string())],
        ..NewVersionArgs::default()
    };
    let err = new_version(&repo, &args).unwrap_err();
    assert!(err.to_string().contains("a pending unreleased change already exists"));

    let forced = NewVersionArgs { force: true, increment: Some(Increment::Patch), ..args };
    new_version(&repo, &forced).unwrap();
    let pending = parse_changelog_file(&path).unwrap().unreleased.unwrap();
    assert_eq!(pending.entries(Category::Added), ["y"]);
    assert_eq!(pending.header(), "## [Unreleased] - PATCH");
}

#[test]
fn test_new_version_creates_missing_changelog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docs/CHANGELOG.md");
    let repo = MockRepository::new();

    let args = NewVersionArgs {
        changelog: path.clone(),
        manual: true,
        non_interactive: true,
        ignore_conventional_commits: true,
        entries: vec![(Category::Changed, "first entry".to_string())],
        ..NewVersionArgs::default()
    };
    let change = new_version(&repo, &args).unwrap();
    assert_eq!(change.header(), "## [Unreleased]");
    assert!(repo.calls().is_empty());
    assert!(fs::read_to_string(&path).unwrap().starts_with("# Changelog"));
}

#[test]
fn test_new_version_without_changes_fails() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let repo = MockRepository::new();

    let args = NewVersionArgs {
        changelog: path.clone(),
        manual: true,
        non_interactive: true,
        ..NewVersionArgs::default()
    };
    let err = new_version(&repo, &args).unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::NoChanges);
    assert_eq!(fs::read_to_string(&path).unwrap(), RELEASED_ONLY);
}

#[test]
fn test_print_current() {
    let dir = TempDir::new().unwrap();
    let repo = MockRepository::new();

    let args = PrintCurrentArgs {
        changelog: changelog(&dir, RELEASED_ONLY),
        refs: RefOptions::default(),
    };
    assert_eq!(print_current(&repo, &args).unwrap(), Version::new(1, 2, 3));

    let empty = PrintCurrentArgs {
        changelog: changelog(&dir, "# Changelog\n"),
        refs: RefOptions::default(),
    };
    let err = print_current(&repo, &empty).unwrap_err();
    assert!(err.to_string().contains("no releases found in changelog file"));
}

#[test]
fn test_print_current_with_release_refs() {
    let dir = TempDir::new().unwrap();
    let mut repo = MockRepository::new();
    repo.add_remote_ref(RefKind::Branch, "release/1.3.0");
    repo.add_remote_ref(RefKind::Branch, "release/api/4.0.0");

    let args = PrintCurrentArgs {
        changelog: changelog(&dir, RELEASED_ONLY),
        refs: RefOptions {
            evaluate: true,
            ..RefOptions::default()
        },
    };
    assert_eq!(print_current(&repo, &args).unwrap(), Version::new(1, 3, 0));
    assert_eq!(repo.calls(), ["fetch origin"]);
}

#[test]
fn test_print_unreleased() {
    let dir = TempDir::new().unwrap();
    let explicit = changelog(&dir, &format!("## [Unreleased] - MAJOR\n### Added\n- a\n\n{}", RELEASED_ONLY));
    let args = PrintUnreleasedArgs {
        changelog: explicit,
        text: false,
    };
    assert_eq!(print_unreleased(&args).unwrap(), "2.0.0");

    let inferred = changelog(&dir, &format!("## [Unreleased]\n### Fixed\n- src/a.rs; fix: a\n\n{}", RELEASED_ONLY));
    let args = PrintUnreleasedArgs {
        changelog: inferred,
        text: false,
    };
    assert_eq!(print_unreleased(&args).unwrap(), "1.2.4");

    let text = PrintUnreleasedArgs { text: true, ..args };
    assert_eq!(
        print_unreleased(&text).unwrap(),
        "## [Unreleased]\n### Fixed\n- src/a.rs; fix: a\n"
    );
}

#[test]
fn test_print_unreleased_without_pending_change() {
    let dir = TempDir::new().unwrap();
    let args = PrintUnreleasedArgs {
        changelog: changelog(&dir, RELEASED_ONLY),
        text: false,
    };
    let err = print_unreleased(&args).unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::NoChanges);
}

#[test]
fn test_update_pending_change() {
    let dir = TempDir::new().unwrap();
    let path = changelog(
        &dir,
        &format!("## [Unreleased] - MINOR\n### Added\n- search\n\n{}", RELEASED_ONLY),
    );
    let repo = MockRepository::new();

    let outcome = update(&repo, &update_args(&path, &dir)).unwrap();
    assert_eq!(outcome.previous, Some(Version::new(1, 2, 3)));
    assert_eq!(outcome.version, Version::new(1, 3, 0));
    assert_eq!(outcome.change.header(), "## [1.3.0] - 2024-06-01");

    let parsed = parse_changelog_file(&path).unwrap();
    assert!(parsed.unreleased.is_none());
    assert_eq!(
        parsed.released_versions(),
        vec![Version::new(1, 3, 0), Version::new(1, 2, 3)]
    );
    assert_eq!(parsed.released[0].entries(Category::Added), ["search"]);
    assert_eq!(parsed.released[1].entries(Category::Fixed), ["entry"]);
    assert!(repo.calls().is_empty());
}

#[test]
fn test_update_from_history_without_pending_change() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let repo = history();

    let outcome = update(&repo, &update_args(&path, &dir)).unwrap();
    assert_eq!(outcome.version, Version::new(1, 3, 0));
    assert_eq!(
        outcome.change.entries(Category::Added),
        ["src/search.rs; feat(search): add search"]
    );
}

#[test]
fn test_update_without_increment_fails() {
    let dir = TempDir::new().unwrap();
    let path = changelog(
        &dir,
        &format!("## [Unreleased]\n### Changed\n- tidy things up\n\n{}", RELEASED_ONLY),
    );
    let repo = MockRepository::new();

    let err = update(&repo, &update_args(&path, &dir)).unwrap_err();
    assert!(err.to_string().contains("failed to find an increment for a change"));
    assert!(fs::read_to_string(&path).unwrap().contains("## [Unreleased]"));
}

#[test]
fn test_update_prerelease_counts_up() {
    let dir = TempDir::new().unwrap();
    let path = changelog(
        &dir,
        "## [Unreleased] - PATCH\n### Fixed\n- b\n\n## [1.0.0-rc-3] - 2024-01-01\n### Fixed\n- a\n",
    );
    let repo = MockRepository::new();

    let args = UpdateArgs {
        prerelease: Some(PrereleaseRequest::default()),
        ..update_args(&path, &dir)
    };
    let outcome = update(&repo, &args).unwrap();
    assert_eq!(outcome.version, Version::parse("1.0.0-rc-4").unwrap());
}

#[test]
fn test_update_build_counts_up_across_runs() {
    let dir = TempDir::new().unwrap();
    let path = changelog(
        &dir,
        "## [Unreleased]\n### Fixed\n- a\n\n## [1.0.0] - 2024-01-01\n### Fixed\n- first\n",
    );
    let repo = MockRepository::new();
    let args = UpdateArgs {
        build: true,
        ..update_args(&path, &dir)
    };

    let first = update(&repo, &args).unwrap();
    assert_eq!(first.version, Version::parse("1.0.0+build.1").unwrap());

    let written = fs::read_to_string(&path).unwrap();
    let pending = written.replacen(
        "## [1.0.0+build.1]",
        "## [Unreleased]\n### Fixed\n- b\n\n## [1.0.0+build.1]",
        1,
    );
    fs::write(&path, pending).unwrap();

    let second = update(&repo, &args).unwrap();
    assert_eq!(second.previous, Some(Version::parse("1.0.0+build.1").unwrap()));
    assert_eq!(second.version, Version::parse("1.0.0+build.2").unwrap());

    let parsed = parse_changelog_file(&path).unwrap();
    assert_eq!(parsed.latest_version(), Some(Version::parse("1.0.0+build.2").unwrap()));
    assert_eq!(parsed.released.len(), 3);
}

#[test]
fn test_update_merges_release_refs_of_scope() {
    let dir = TempDir::new().unwrap();
    let path = changelog(
        &dir,
        &format!("## [Unreleased] - PATCH\n### Fixed\n- b\n\n{}", RELEASED_ONLY),
    );
    let mut repo = MockRepository::new();
    repo.add_remote_ref(RefKind::Tag, "release/api/2.0.0");
    repo.add_remote_ref(RefKind::Tag, "release/1.2.9");

    let args = UpdateArgs {
        refs: RefOptions {
            evaluate: true,
            use_tags: true,
            skip_fetch: true,
            scope: Some("api".to_string()),
            ..RefOptions::default()
        },
        ..update_args(&path, &dir)
    };
    let outcome = update(&repo, &args).unwrap();
    assert_eq!(outcome.version, Version::new(2, 0, 1));
    assert!(repo.calls().is_empty());
}

#[test]
fn test_release_commits_pushes_and_moves_refs() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let repo = history();

    let mut args = release_args(&path, &dir);
    args.release.files = vec!["Cargo.toml".to_string()];
    let outcome = release(&repo, &args).unwrap().unwrap();

    assert_eq!(outcome.version, Version::new(1, 2, 3));
    assert_eq!(outcome.commit, "c4");
    assert_eq!(outcome.refs, ["release/1", "release/1.2", "release/1.2.3"]);
    assert_eq!(
        repo.calls(),
        [
            "add CHANGELOG.md Cargo.toml",
            "commit [skip ci] Release version 1.2.3",
            "push origin main",
            "fetch origin",
            "force-push origin c4:refs/heads/release/1",
            "force-push origin c4:refs/heads/release/1.2",
            "force-push origin c4:refs/heads/release/1.2.3",
        ]
    );
}

#[test]
fn test_release_skips_refs_when_already_released() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let mut repo = MockRepository::new();
    repo.add_remote_ref(RefKind::Branch, "release/1.2.3");

    let mut args = release_args(&path, &dir);
    args.refs.skip_fetch = true;
    let outcome = release(&repo, &args).unwrap().unwrap();
    assert!(outcome.refs.is_empty());
    assert!(!repo.calls().iter().any(|c| c.starts_with("force-push")));
}

#[test]
fn test_release_with_branch_checks_out_and_pulls() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let repo = MockRepository::new();

    let mut args = release_args(&path, &dir);
    args.git.branch = Some("stable".to_string());
    args.refs.skip_fetch = true;
    release(&repo, &args).unwrap();

    let calls = repo.calls();
    assert_eq!(calls[0], "checkout stable");
    assert_eq!(calls[1], "pull");
    assert!(calls.contains(&"push origin stable".to_string()));
}

#[test]
fn test_release_reports_every_failed_ref() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let mut repo = MockRepository::new();
    repo.fail_ref("release/1");
    repo.fail_ref("release/1.2.3");

    let mut args = release_args(&path, &dir);
    args.refs.skip_fetch = true;
    let err = release(&repo, &args).unwrap_err();
    match &err {
        ChangehelperError::RefUpdate { failures } => assert_eq!(failures.len(), 2),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(err.exit_code(), ExitCode::Exec);
    assert!(repo
        .calls()
        .contains(&"force-push origin HEAD:refs/heads/release/1.2".to_string()));
}

#[test]
fn test_release_without_remote() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let mut repo = MockRepository::new();
    repo.set_remotes(&[]);

    let err = release(&repo, &release_args(&path, &dir)).unwrap_err();
    assert!(matches!(err, ChangehelperError::MissingRemote));
    assert!(repo.calls().is_empty());
}

#[test]
fn test_update_and_release() {
    let dir = TempDir::new().unwrap();
    let path = changelog(
        &dir,
        &format!("## [Unreleased]\n### Removed\n- src/old.rs; feat!: drop old api\n\n{}", RELEASED_ONLY),
    );
    let mut repo = MockRepository::new();
    repo.add_remote_ref(RefKind::Tag, "release/1.2.3");

    let mut release = release_args(&path, &dir);
    release.refs.use_tags = true;
    release.refs.skip_fetch = true;
    let (updated, released) = update_and_release(&repo, &update_args(&path, &dir), &release).unwrap();

    assert_eq!(updated.version, Version::new(2, 0, 0));
    let released = released.unwrap();
    assert_eq!(released.version, Version::new(2, 0, 0));
    assert_eq!(released.refs, ["release/2", "release/2.0", "release/2.0.0"]);
    assert!(repo.calls().contains(&"push-tag origin release/2.0.0".to_string()));
}

#[test]
fn test_enforce_unreleased() {
    let dir = TempDir::new().unwrap();
    let err = enforce_unreleased(&changelog(&dir, RELEASED_ONLY)).unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::NoChanges);

    let pending = changelog(&dir, "## [Unreleased]\n### Added\n- x\n");
    assert!(enforce_unreleased(&pending).is_ok());
}

#[test]
fn test_enforce_conventional_commits() {
    let dir = TempDir::new().unwrap();
    let path = changelog(&dir, RELEASED_ONLY);
    let repo = history();

    let args = EnforceCommitsArgs {
        changelog: path.clone(),
        git: git_for(&dir),
        depth: 2,
        ..EnforceCommitsArgs::default()
    };
    assert_eq!(enforce_conventional_commits(&repo, &args).unwrap(), 2);

    let deeper = EnforceCommitsArgs { depth: 3, ..args.clone() };
    let err = enforce_conventional_commits(&repo, &deeper).unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::Parse);
    assert!(err.to_string().contains("c2 [skip ci] Release version 1.2.3"));

    let allowed = EnforceCommitsArgs { allow: true, ..deeper };
    assert_eq!(enforce_conventional_commits(&repo, &allowed).unwrap(), 2);

    let since_changelog = EnforceCommitsArgs {
        use_changelog: true,
        depth: 1,
        ..args
    };
    assert_eq!(enforce_conventional_commits(&repo, &since_changelog).unwrap(), 2);
}

#[test]
fn test_enforce_allow_needs_one_conventional_commit() {
    let dir = TempDir::new().unwrap();
    let mut repo = MockRepository::new();
    repo.add_commit(Commit::new("a1", "Update README"), Diff::default());

    let args = EnforceCommitsArgs {
        changelog: changelog(&dir, RELEASED_ONLY),
        git: git_for(&dir),
        depth: 5,
        allow: true,
        ..EnforceCommitsArgs::default()
    };
    assert!(enforce_conventional_commits(&repo, &args).is_err());
}
