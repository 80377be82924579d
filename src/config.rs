use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

const CONFIG_FILE_NAME: &str = "changehelper.toml";

/// Represents the complete configuration for changehelper.
///
/// Every value can be overridden from the command line; the file only moves
/// the defaults.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

fn default_changelog_file() -> String {
    "./CHANGELOG.md".to_string()
}

fn default_workdir() -> String {
    "./".to_string()
}

fn default_prefix() -> String {
    "release".to_string()
}

fn default_commit_message() -> String {
    "[skip ci] Release version %s".to_string()
}

/// Location of the changelog file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    #[serde(default = "default_changelog_file")]
    pub file: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            file: default_changelog_file(),
        }
    }
}

/// How release refs are looked up and written.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Ref name prefix for release branches or tags, e.g. `release`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub use_tags: bool,

    /// Merge versions found in release refs into the changelog history
    #[serde(default)]
    pub evaluate: bool,

    #[serde(default)]
    pub skip_fetch: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            workdir: default_workdir(),
            prefix: default_prefix(),
            use_tags: false,
            evaluate: false,
            skip_fetch: false,
        }
    }
}

/// Release commit settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Commit message template; `%s` is replaced with the released version
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Additional files staged with the changelog
    #[serde(default)]
    pub files: Vec<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            commit_message: default_commit_message(),
            files: Vec::new(),
        }
    }
}

impl ReleaseConfig {
    /// Renders the commit message for a released version.
    pub fn commit_message_for(&self, version: &str) -> String {
        if self.commit_message.contains("%s") {
            self.commit_message.replace("%s", version)
        } else {
            format!("{} {}", self.commit_message, version)
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `changehelper.toml` in current directory
/// 3. `changehelper.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.changelog.file, "./CHANGELOG.md");
        assert_eq!(config.git.prefix, "release");
        assert!(!config.git.use_tags);
        assert_eq!(config.release.commit_message, "[skip ci] Release version %s");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[git]\nuse_tags = true\n").unwrap();
        assert!(config.git.use_tags);
        assert_eq!(config.git.prefix, "release");
        assert_eq!(config.changelog.file, "./CHANGELOG.md");
    }

    #[test]
    fn test_commit_message_template() {
        let release = ReleaseConfig::default();
        assert_eq!(
            release.commit_message_for("1.2.3"),
            "[skip ci] Release version 1.2.3"
        );

        let plain = ReleaseConfig {
            commit_message: "chore: release".to_string(),
            files: Vec::new(),
        };
        assert_eq!(plain.commit_message_for("2.0.0"), "chore: release 2.0.0");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = toml::from_str::<Config>("[git\nprefix = 1").unwrap_err();
        let err: crate::error::ChangehelperError = err.into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
