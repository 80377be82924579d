use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::str::FromStr;

use crate::domain::prerelease::Counter;
use crate::error::{ChangehelperError, Result};

/// Version increment level, ordered by priority.
///
/// `Build` only touches build metadata and ranks below `Patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Increment {
    Build,
    Patch,
    Minor,
    Major,
}

impl Increment {
    pub fn name(self) -> &'static str {
        match self {
            Increment::Build => "BUILD",
            Increment::Patch => "PATCH",
            Increment::Minor => "MINOR",
            Increment::Major => "MAJOR",
        }
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Increment {
    type Err = ChangehelperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUILD" => Ok(Increment::Build),
            "PATCH" => Ok(Increment::Patch),
            "MINOR" => Ok(Increment::Minor),
            "MAJOR" => Ok(Increment::Major),
            _ => Err(ChangehelperError::version(format!(
                "Unknown increment '{}', expected one of MAJOR, MINOR, PATCH or BUILD",
                s
            ))),
        }
    }
}

/// Parse a version leniently: surrounding whitespace, a `v`/`V` prefix and
/// missing minor/patch components are accepted (`v1.2` -> `1.2.0`).
pub fn parse_tolerant(text: &str) -> Result<Version> {
    let trimmed = text.trim();
    let clean = trimmed.trim_start_matches(['v', 'V']);

    let core_end = clean.find(['-', '+']).unwrap_or(clean.len());
    let (core, rest) = clean.split_at(core_end);

    let mut parts: Vec<String> = core
        .split('.')
        .map(|part| {
            let digits = part.trim_start_matches('0');
            if digits.is_empty() && !part.is_empty() {
                "0".to_string()
            } else {
                digits.to_string()
            }
        })
        .collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(String::is_empty) {
        return Err(ChangehelperError::version(format!(
            "Invalid version format: '{}'",
            text
        )));
    }
    while parts.len() < 3 {
        parts.push("0".to_string());
    }

    Version::parse(&format!("{}{}", parts.join("."), rest)).map_err(|e| {
        ChangehelperError::version(format!("Invalid version '{}': {}", text, e))
    })
}

/// Apply an increment to the core of `version`.
///
/// Core bumps reset the lower components and drop pre-release and build
/// metadata. `Build` keeps the core and counts up the build metadata.
pub fn bump(version: &Version, increment: Increment) -> Result<Version> {
    let overflow = || ChangehelperError::version(format!("Cannot apply {} to {}", increment, version));
    let mut next = version.clone();
    match increment {
        Increment::Major => {
            next.major = next.major.checked_add(1).ok_or_else(overflow)?;
            next.minor = 0;
            next.patch = 0;
        }
        Increment::Minor => {
            next.minor = next.minor.checked_add(1).ok_or_else(overflow)?;
            next.patch = 0;
        }
        Increment::Patch => {
            next.patch = next.patch.checked_add(1).ok_or_else(overflow)?;
        }
        Increment::Build => {
            let counter = Counter::parse(version.build.as_str(), Some("build"));
            next.build = BuildMetadata::new(&counter.next(None)?.to_string())?;
            return Ok(next);
        }
    }
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}
