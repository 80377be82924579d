//! Release blocks of a Keep a Changelog document

use semver::Version;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::version::Increment;
use crate::error::ChangehelperError;

pub const RELEASE_PREFIX: &str = "## ";
pub const CATEGORY_PREFIX: &str = "### ";
pub const ENTRY_PREFIX: &str = "- ";

/// Change categories, declared in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Added,
    Changed,
    Deprecated,
    Removed,
    Fixed,
    Security,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Added,
        Category::Changed,
        Category::Deprecated,
        Category::Removed,
        Category::Fixed,
        Category::Security,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Added => "Added",
            Category::Changed => "Changed",
            Category::Deprecated => "Deprecated",
            Category::Removed => "Removed",
            Category::Fixed => "Fixed",
            Category::Security => "Security",
        }
    }

    /// Match a heading against the category names, ignoring case and whitespace.
    pub fn from_heading(text: &str) -> Option<Self> {
        let normalized: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.name().to_lowercase() == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = ChangehelperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_heading(s)
            .ok_or_else(|| ChangehelperError::changelog(format!("Unknown change category: '{}'", s)))
    }
}

/// One release block, either pending (`[Unreleased]`) or released.
///
/// Entries are stored as raw text; the `- ` list marker and category
/// sub-headers are only added when the body is rendered.
#[derive(Debug, Clone)]
pub struct Change {
    pub version: Option<Version>,
    header: String,
    entries: BTreeMap<Category, Vec<String>>,
    rendered: OnceCell<String>,
}

impl Change {
    /// Create a change whose header line is re-emitted as given.
    pub fn with_header(version: Option<Version>, header: impl Into<String>) -> Self {
        Change {
            version,
            header: header.into(),
            entries: BTreeMap::new(),
            rendered: OnceCell::new(),
        }
    }

    /// A pending block, `## [Unreleased]` or `## [Unreleased] - MINOR`.
    pub fn unreleased(increment: Option<Increment>) -> Self {
        let header = match increment {
            Some(increment) => format!("{}[Unreleased] - {}", RELEASE_PREFIX, increment),
            None => format!("{}[Unreleased]", RELEASE_PREFIX),
        };
        Change::with_header(None, header)
    }

    /// A released block dated `date` (`yyyy-mm-dd`).
    pub fn released(version: Version, date: &str) -> Self {
        let header = format!("{}[{}] - {}", RELEASE_PREFIX, version, date);
        Change::with_header(Some(version), header)
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Replace the header line, keeping the entries.
    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    pub fn push_entry(&mut self, category: Category, entry: impl Into<String>) {
        self.rendered.take();
        self.entries.entry(category).or_default().push(entry.into());
    }

    pub fn extend_entries<I, S>(&mut self, category: Category, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for entry in entries {
            self.push_entry(category, entry);
        }
    }

    /// Move every entry of `other` into this change, category by category.
    pub fn merge(&mut self, other: Change) {
        for (category, entries) in other.entries {
            self.extend_entries(category, entries);
        }
    }

    pub fn entries(&self, category: Category) -> &[String] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries in emission order.
    pub fn all_entries(&self) -> impl Iterator<Item = &str> {
        self.entries.values().flatten().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Category sections as Markdown, rendered once and cached.
    pub fn body(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut body = String::new();
            for (category, entries) in &self.entries {
                if entries.is_empty() {
                    continue;
                }
                body.push_str(CATEGORY_PREFIX);
                body.push_str(category.name());
                body.push('\n');
                for entry in entries {
                    body.push_str(ENTRY_PREFIX);
                    body.push_str(entry);
                    body.push('\n');
                }
            }
            body
        })
    }

    /// Header line followed by the body.
    pub fn render(&self) -> String {
        format!("{}\n{}", self.header, self.body())
    }
}

impl PartialEq for Change {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.header == other.header
            && self.entries == other.entries
    }
}
