use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::change::Change;
use crate::error::{ChangehelperError, Result};

/// Boilerplate written at the top of every changelog
pub const HEADER: &str = "# Changelog
All notable changes to this project will be documented in this file.

The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.0.0/),
and this project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).

";

/// Render a release block that must carry at least one entry.
pub fn render_release(change: &Change) -> Result<String> {
    if change.body().is_empty() {
        return Err(ChangehelperError::no_changes(
            "no changes are recorded under the release",
        ));
    }
    Ok(change.render())
}

/// Render the whole document: boilerplate, the new or updated block, then
/// the previously released blocks in their original order.
pub fn render_document(current: &Change, released: &[Change]) -> Result<String> {
    let mut document = String::from(HEADER);
    document.push_str(&render_release(current)?);
    for change in released {
        document.push('\n');
        document.push_str(&change.render());
    }
    Ok(document)
}

/// Rewrite the changelog file at `path`.
pub fn write_changelog(path: &Path, current: &Change, released: &[Change]) -> Result<()> {
    let document = render_document(current, released)?;
    fs::write(path, document)?;
    info!(path = %path.display(), header = current.header(), "changelog written");
    Ok(())
}

/// Create a changelog holding only the boilerplate, unless one exists.
///
/// Returns whether a file was created.
pub fn ensure_changelog(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, HEADER)?;
    info!(path = %path.display(), "created changelog");
    Ok(true)
}
