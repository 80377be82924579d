//! Keep a Changelog documents: parsing into changes and writing them back

pub mod parser;
pub mod writer;

use semver::Version;
use std::fs;
use std::path::Path;

use crate::domain::version::Increment;
use crate::error::{ChangehelperError, Result};
use crate::version::latest_version;

pub use parser::{Block, ParsedChangelog, WalkError};
pub use writer::{ensure_changelog, render_document, render_release, write_changelog, HEADER};

/// Parse changelog text.
pub fn parse_changelog(source: &str) -> Result<ParsedChangelog> {
    parser::walk(source).map_err(|e| match e {
        WalkError::DuplicateUnreleased => {
            ChangehelperError::changelog("duplicate pending unreleased changes found")
        }
        WalkError::Structural(reason) => ChangehelperError::changelog(reason),
    })
}

/// Read and parse the changelog at `path`. A missing or unreadable file is an error.
pub fn parse_changelog_file(path: &Path) -> Result<ParsedChangelog> {
    let source = fs::read_to_string(path)?;
    parse_changelog(&source)
}

impl ParsedChangelog {
    /// Versions of all released blocks, in document order
    pub fn released_versions(&self) -> Vec<Version> {
        self.released
            .iter()
            .filter_map(|change| change.version.clone())
            .collect()
    }

    /// The highest released version
    pub fn latest_version(&self) -> Option<Version> {
        latest_version(self.released.iter().filter_map(|c| c.version.as_ref())).cloned()
    }

    /// The explicit increment of the pending block, if it has one.
    pub fn explicit_increment(&self) -> Result<Option<Increment>> {
        self.increment.as_deref().map(|s| s.parse::<Increment>()).transpose()
    }
}
