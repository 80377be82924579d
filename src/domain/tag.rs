use semver::Version;

use crate::domain::version::parse_tolerant;
use crate::error::Result;

/// A release branch or tag, e.g. `release/api/1.2.3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRef {
    /// Ref name with the release prefix removed (`api/1.2.3`)
    pub name: String,
    /// Everything before the last path segment (`api`), if any
    pub scope: Option<String>,
    pub version: Version,
}

impl ReleaseRef {
    /// Parse a ref name whose release prefix was already removed.
    ///
    /// The last `/`-separated segment is the version; it may be partial
    /// (`release/2` yields 2.0.0).
    pub fn parse(name: &str) -> Result<Self> {
        let (scope, version_text) = match name.rsplit_once('/') {
            Some((scope, last)) if !scope.is_empty() => (Some(scope.to_string()), last),
            Some((_, last)) => (None, last),
            None => (None, name),
        };
        Ok(ReleaseRef {
            name: name.to_string(),
            scope,
            version: parse_tolerant(version_text)?,
        })
    }
}

/// Remove `<prefix>/` from a ref name.
///
/// The prefix may occur after other path segments (`refs/heads/release/1.2.3`);
/// names without it yield `None`. An empty prefix keeps the name as is.
pub fn strip_release_prefix<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(name);
    }
    let marker = format!("{}/", prefix);
    name.find(&marker).map(|idx| &name[idx + marker.len()..])
}

/// The ref names updated for a release: `major`, `major.minor` and the full
/// version, all under `<prefix>[/<scope>]/`.
///
/// A pre-release or build only gets its full-version ref; the `major` and
/// `major.minor` refs keep pointing at the last plain release.
pub fn release_ref_names(prefix: &str, scope: Option<&str>, version: &Version) -> Vec<String> {
    let base: Vec<&str> = [Some(prefix), scope]
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .collect();
    let base = if base.is_empty() {
        String::new()
    } else {
        format!("{}/", base.join("/"))
    };

    let full = format!("{}{}", base, version);
    if !version.pre.is_empty() || !version.build.is_empty() {
        return vec![full];
    }
    vec![
        format!("{}{}", base, version.major),
        format!("{}{}.{}", base, version.major, version.minor),
        full,
    ]
}
