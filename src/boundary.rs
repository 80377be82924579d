use std::fmt;

/// Non-fatal issues met while reading history, refs and remotes.
/// These are reported to the user and processing continues.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// A release heading or ref carries something that is not a version
    UnparsableVersion { source: String, reason: String },
    /// The file list of a commit could not be read
    DiffUnavailable { commit: String, reason: String },
    /// More than one remote is configured; the last one listed is used
    MultipleRemotes { chosen: String, remotes: Vec<String> },
    /// A commit does not follow the conventional commit format
    NonConventionalCommit { commit: String, subject: String },
    /// The version already has release refs
    AlreadyReleased { version: String },
}

fn short_hash(hash: &str) -> &str {
    if hash.len() > 7 {
        &hash[..7]
    } else {
        hash
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::UnparsableVersion { source, reason } => {
                write!(f, "Cannot parse a version from '{}': {}", source, reason)
            }
            BoundaryWarning::DiffUnavailable { commit, reason } => {
                write!(
                    f,
                    "Cannot list files changed by {}: {}",
                    short_hash(commit),
                    reason
                )
            }
            BoundaryWarning::MultipleRemotes { chosen, remotes } => {
                write!(
                    f,
                    "Found {} remotes ({}), using '{}'",
                    remotes.len(),
                    remotes.join(", "),
                    chosen
                )
            }
            BoundaryWarning::NonConventionalCommit { commit, subject } => {
                write!(
                    f,
                    "Commit {} is not a conventional commit: {}",
                    short_hash(commit),
                    subject
                )
            }
            BoundaryWarning::AlreadyReleased { version } => {
                write!(f, "Release refs for {} already exist, nothing to update", version)
            }
        }
    }
}
