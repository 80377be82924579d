use thiserror::Error;

/// Process exit codes reported by the `changehelper` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    General = 1,
    NoChanges = 2,
    Io = 3,
    Exec = 4,
    Parse = 5,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Unified error type for changehelper operations
#[derive(Error, Debug)]
pub enum ChangehelperError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Changelog error: {0}")]
    Changelog(String),

    #[error("No changes: {0}")]
    NoChanges(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Git command `{command}` failed with exit code {code}: {stderr}")]
    Git {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to run `{command}`: {reason}")]
    Exec { command: String, reason: String },

    #[error("No git remote is configured for the repository")]
    MissingRemote,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Failed to update release refs: {}", failures.join("; "))]
    RefUpdate { failures: Vec<String> },

    #[error("Commits are not conventional: {}", commits.join(", "))]
    NonConventional { commits: Vec<String> },
}

/// Convenience type alias for Results in changehelper
pub type Result<T> = std::result::Result<T, ChangehelperError>;

impl ChangehelperError {
    /// Create a changelog format error
    pub fn changelog(msg: impl Into<String>) -> Self {
        ChangehelperError::Changelog(msg.into())
    }

    /// Create an error for a release that carries nothing to record
    pub fn no_changes(msg: impl Into<String>) -> Self {
        ChangehelperError::NoChanges(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ChangehelperError::Version(msg.into())
    }

    /// Create an error for a git command that exited with a non-zero code
    pub fn git(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        ChangehelperError::Git {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ChangehelperError::Config(msg.into())
    }

    /// Create a prompt error with context
    pub fn prompt(msg: impl Into<String>) -> Self {
        ChangehelperError::Prompt(msg.into())
    }

    /// Exit code the binary reports for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ChangehelperError::Io(_) => ExitCode::Io,
            ChangehelperError::NoChanges(_) => ExitCode::NoChanges,
            ChangehelperError::Changelog(_) | ChangehelperError::Version(_) => ExitCode::Parse,
            ChangehelperError::Git { .. }
            | ChangehelperError::Exec { .. }
            | ChangehelperError::MissingRemote
            | ChangehelperError::RefUpdate { .. } => ExitCode::Exec,
            ChangehelperError::Config(_) | ChangehelperError::NonConventional { .. } => {
                ExitCode::Parse
            }
            ChangehelperError::Prompt(_) => ExitCode::General,
        }
    }
}

impl From<toml::de::Error> for ChangehelperError {
    fn from(err: toml::de::Error) -> Self {
        ChangehelperError::Config(err.to_string())
    }
}

impl From<semver::Error> for ChangehelperError {
    fn from(err: semver::Error) -> Self {
        ChangehelperError::Version(err.to_string())
    }
}
