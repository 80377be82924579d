//! Pre-release and build metadata counters
//!
//! Both identifiers are treated as a free-form stem followed by an optional
//! numeric counter: `rc.3`, `rc-3`, `beta7` and plain `4` all carry a counter,
//! `alpha` does not. Counting up keeps the stem and separator as written.
//! According to semver.org: https://semver.org/#spec-item-9

use semver::Prerelease;
use std::fmt;

use crate::error::{ChangehelperError, Result};

const SEPARATORS: [char; 3] = ['.', '-', '_'];

/// An identifier split into its stem and trailing counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    /// Everything before the counter, separator included (`rc-`)
    pub stem: String,
    pub iteration: Option<u64>,
}

impl Counter {
    /// Split `identifier` into stem and counter.
    ///
    /// An empty identifier takes `default_label` as its stem.
    pub fn parse(identifier: &str, default_label: Option<&str>) -> Self {
        if identifier.is_empty() {
            return Counter::start(default_label);
        }

        let stem = identifier.trim_end_matches(|c: char| c.is_ascii_digit());
        let iteration = identifier[stem.len()..].parse::<u64>().ok();
        match iteration {
            Some(n) => Counter {
                stem: stem.to_string(),
                iteration: Some(n),
            },
            None => Counter {
                stem: identifier.to_string(),
                iteration: None,
            },
        }
    }

    fn start(label: Option<&str>) -> Self {
        Counter {
            stem: label.map(|l| format!("{}.", l)).unwrap_or_default(),
            iteration: None,
        }
    }

    /// The stem without its trailing separator
    pub fn label(&self) -> &str {
        self.stem.trim_end_matches(SEPARATORS)
    }

    /// Count up by one.
    ///
    /// A `label` different from the current one starts a fresh `label.1`.
    pub fn next(&self, label: Option<&str>) -> Result<Self> {
        if let Some(label) = label {
            if label != self.label() {
                return Ok(Counter {
                    stem: format!("{}.", label),
                    iteration: Some(1),
                });
            }
        }

        let next = match self.iteration {
            Some(n) => Counter {
                stem: self.stem.clone(),
                iteration: Some(n.checked_add(1).ok_or_else(|| {
                    ChangehelperError::version(format!("counter of '{}' cannot be incremented", self))
                })?),
            },
            None => {
                let mut stem = self.stem.clone();
                if !stem.is_empty() && !stem.ends_with(SEPARATORS) {
                    stem.push('.');
                }
                Counter {
                    stem,
                    iteration: Some(1),
                }
            }
        };
        Ok(next)
    }

    /// Restart the counter at 1, keeping the stem unless `label` overrides it.
    pub fn restart(&self, label: Option<&str>) -> Result<Self> {
        let base = match label {
            Some(label) => Counter::start(Some(label)),
            None => Counter {
                stem: self.stem.clone(),
                iteration: None,
            },
        };
        base.next(None)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem)?;
        if let Some(n) = self.iteration {
            write!(f, "{}", n)?;
        }
        Ok(())
    }
}

/// Compute the pre-release identifier of the next version.
///
/// When the core version moved (`restart`), the counter starts again at 1.
/// Otherwise the existing counter is incremented.
pub fn next_prerelease(current: &Prerelease, restart: bool, label: Option<&str>) -> Result<Prerelease> {
    let counter = Counter::parse(current.as_str(), None);
    let next = if restart {
        counter.restart(label)?
    } else {
        counter.next(label)?
    };
    Ok(Prerelease::new(&next.to_string())?)
}
