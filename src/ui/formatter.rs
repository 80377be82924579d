//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Functions here have no side effects beyond printing.

use console::style;
use semver::Version;

use crate::boundary::BoundaryWarning;
use crate::git::Commit;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Shorten a commit subject for one-line display.
pub fn short_subject(subject: &str, max: usize) -> String {
    if subject.chars().count() > max {
        let cut: String = subject.chars().take(max).collect();
        format!("{}…", cut)
    } else {
        subject.to_string()
    }
}

/// Display the commits a pending release is derived from.
///
/// Shows up to 10 commits; the remainder is summarized as a count.
pub fn display_commit_analysis(commits: &[Commit]) {
    println!(
        "\n{}",
        style(format!("Commits since the last changelog update: {}", commits.len())).bold()
    );

    for (i, commit) in commits.iter().take(10).enumerate() {
        let hash: String = commit.hash.chars().take(7).collect();
        println!(
            "  {}. {} {}",
            i + 1,
            style(hash).dim(),
            short_subject(commit.subject(), 60)
        );
    }

    if commits.len() > 10 {
        println!("  ... and {} more commits", commits.len() - 10);
    }
}

/// Display the proposed version change (or the first version).
pub fn display_version_change(previous: Option<&Version>, next: &Version) {
    match previous {
        Some(previous) => {
            println!("\n{}", style("Proposed version change:").bold());
            println!("  From: {}", style(previous).red());
            println!("  To:   {}", style(next).green());
        }
        None => {
            println!("\n{}", style("Initial version:").bold());
            println!("  New version: {}", style(next).green());
        }
    }
}

/// Display the release refs that now point at the release commit.
pub fn display_release_refs(refs: &[String], remote: &str) {
    println!("{}", style(format!("Release refs on '{}':", remote)).bold());
    for name in refs {
        println!("  - {}", style(name).cyan());
    }
}
