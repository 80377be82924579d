use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Recognized conventional commit types, in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitType {
    Fix,
    Feat,
    Build,
    Chore,
    Ci,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
}

impl CommitType {
    pub const ALL: [CommitType; 10] = [
        CommitType::Fix,
        CommitType::Feat,
        CommitType::Build,
        CommitType::Chore,
        CommitType::Ci,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommitType::Fix => "fix",
            CommitType::Feat => "feat",
            CommitType::Build => "build",
            CommitType::Chore => "chore",
            CommitType::Ci => "ci",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
        }
    }

    /// Find the first type (in list order) whose marker occurs anywhere in
    /// the message: `type:`, `type!:`, `type(scope):` or `type(scope)!:`.
    ///
    /// Returns the type and the byte offset where its marker starts.
    pub fn detect(message: &str) -> Option<(CommitType, usize)> {
        markers().iter().find_map(|(commit_type, re)| {
            re.find(message).map(|m| (*commit_type, m.start()))
        })
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn markers() -> &'static [(CommitType, Regex)] {
    static MARKERS: OnceLock<Vec<(CommitType, Regex)>> = OnceLock::new();
    MARKERS.get_or_init(|| {
        CommitType::ALL
            .iter()
            .filter_map(|t| {
                Regex::new(&format!(r"{}(\([^)]*\))?!?:", regex::escape(t.as_str())))
                    .ok()
                    .map(|re| (*t, re))
            })
            .collect()
    })
}

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

impl ParsedCommit {
    /// Classify a commit message.
    ///
    /// The message must carry a recognized type marker and parse as a
    /// conventional commit. Parsing is best effort: when the full message is
    /// rejected, it is retried from the type marker onwards and finally with
    /// the subject line alone. Returns `None` for unclassifiable messages.
    pub fn parse(message: &str) -> Option<Self> {
        let (commit_type, offset) = CommitType::detect(message)?;
        let from_marker = message[offset..].trim();
        let subject = from_marker.lines().next().unwrap_or_default();

        let parsed = git_conventional::Commit::parse(message.trim())
            .or_else(|_| git_conventional::Commit::parse(from_marker))
            .or_else(|_| git_conventional::Commit::parse(subject))
            .ok()?;

        let is_breaking_change = parsed.breaking()
            || message.contains("BREAKING CHANGE:")
            || message.contains("BREAKING-CHANGE:");

        Some(ParsedCommit {
            commit_type,
            scope: parsed.scope().map(|s| s.to_string()),
            description: parsed.description().to_string(),
            is_breaking_change,
        })
    }
}
