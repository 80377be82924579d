//! Conventional commit classification and change attribution

use std::collections::BTreeMap;

use crate::domain::change::{Category, Change};
use crate::domain::commit::{CommitType, ParsedCommit};
use crate::domain::version::Increment;
use crate::error::{ChangehelperError, Result};
use crate::git::Diff;

/// Increment a single classified commit asks for
pub fn commit_increment(commit: &ParsedCommit) -> Increment {
    if commit.is_breaking_change {
        Increment::Major
    } else if commit.commit_type == CommitType::Feat {
        Increment::Minor
    } else {
        Increment::Patch
    }
}

/// Raise `current` to what `commit` asks for; never lowers it.
pub fn fold_increment(current: Option<Increment>, commit: &ParsedCommit) -> Option<Increment> {
    let requested = commit_increment(commit);
    Some(current.map_or(requested, |current| current.max(requested)))
}

/// Aggregate increment over messages, `None` when none of them classifies.
pub fn aggregate_increment<'a, I>(messages: I) -> Option<Increment>
where
    I: IntoIterator<Item = &'a str>,
{
    messages
        .into_iter()
        .filter_map(ParsedCommit::parse)
        .fold(None, |current, commit| fold_increment(current, &commit))
}

/// Aggregate increment over messages; no classifiable message is an error.
pub fn resolve_increment<'a, I>(messages: I) -> Result<Increment>
where
    I: IntoIterator<Item = &'a str>,
{
    aggregate_increment(messages)
        .ok_or_else(|| ChangehelperError::no_changes("failed to find an increment for a change"))
}

/// Commits (hash and subject) per file path, split by change category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    buckets: BTreeMap<Category, BTreeMap<String, Vec<(String, String)>>>,
}

impl Attribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route the files of one commit into their categories.
    ///
    /// Files changed by a `fix` commit are recorded as fixed only; its added
    /// and removed files are routed as usual. A commit is mentioned once per
    /// path, distinct commits with the same subject each are.
    pub fn record(&mut self, commit_type: CommitType, hash: &str, subject: &str, diff: &Diff) {
        let changed_category = if commit_type == CommitType::Fix {
            Category::Fixed
        } else {
            Category::Changed
        };

        for path in &diff.added {
            self.insert(Category::Added, path, hash, subject);
        }
        for path in &diff.changed {
            self.insert(changed_category, path, hash, subject);
        }
        for path in &diff.removed {
            self.insert(Category::Removed, path, hash, subject);
        }
    }

    fn insert(&mut self, category: Category, path: &str, hash: &str, subject: &str) {
        let commits = self
            .buckets
            .entry(category)
            .or_default()
            .entry(path.to_string())
            .or_default();
        if !commits.iter().any(|(seen, _)| seen == hash) {
            commits.push((hash.to_string(), subject.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(BTreeMap::is_empty)
    }

    /// Entries of one category as `<path>; <subject>, <subject>`, sorted by path
    pub fn entries(&self, category: Category) -> Vec<String> {
        self.buckets
            .get(&category)
            .map(|files| {
                files
                    .iter()
                    .map(|(path, commits)| {
                        let subjects: Vec<&str> = commits.iter().map(|(_, s)| s.as_str()).collect();
                        format!("{}; {}", path, subjects.join(", "))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append every attributed entry to `change`.
    pub fn apply_to(&self, change: &mut Change) {
        for category in self.buckets.keys() {
            change.extend_entries(*category, self.entries(*category));
        }
    }
}
