//! Version reconciliation across the changelog and release refs.

use semver::Version;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::boundary::BoundaryWarning;
use crate::domain::prerelease::{next_prerelease, Counter};
use crate::domain::tag::ReleaseRef;
use crate::domain::version::{bump, Increment};
use crate::error::Result;

/// Released versions per scope, newest first. Unscoped refs use the empty key.
pub type ScopedVersions = BTreeMap<String, Vec<Version>>;

/// Requested pre-release for the next version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrereleaseRequest {
    /// Identifier label such as `rc`; keeps the current one when `None`
    pub label: Option<String>,
}

/// Compare by semver precedence: build metadata does not take part.
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

fn build_iteration(version: &Version) -> Option<u64> {
    if version.build.is_empty() {
        return None;
    }
    Counter::parse(version.build.as_str(), None).iteration
}

/// Compare by precedence, breaking ties on the build counter.
///
/// `1.0.0+build.2` is newer than `1.0.0+build.1`, which is newer than `1.0.0`.
pub fn cmp_release(a: &Version, b: &Version) -> Ordering {
    cmp_precedence(a, b)
        .then_with(|| build_iteration(a).cmp(&build_iteration(b)))
        .then_with(|| a.build.cmp(&b.build))
}

/// Sort versions newest first.
pub fn sort_descending(versions: &mut [Version]) {
    versions.sort_by(|a, b| cmp_release(b, a));
}

/// Newest version, see [`cmp_release`].
pub fn latest_version<'a, I>(versions: I) -> Option<&'a Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions.into_iter().max_by(|a, b| cmp_release(a, b))
}

/// Group ref names (release prefix already removed) by scope.
///
/// Refs whose last segment is not a version are skipped with a warning.
pub fn scoped_versions<S: AsRef<str>>(names: &[S]) -> (ScopedVersions, Vec<BoundaryWarning>) {
    let mut grouped = ScopedVersions::new();
    let mut warnings = Vec::new();

    for name in names {
        let name = name.as_ref();
        match ReleaseRef::parse(name) {
            Ok(release_ref) => grouped
                .entry(release_ref.scope.unwrap_or_default())
                .or_default()
                .push(release_ref.version),
            Err(e) => warnings.push(BoundaryWarning::UnparsableVersion {
                source: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    for versions in grouped.values_mut() {
        sort_descending(versions);
        versions.dedup();
    }
    (grouped, warnings)
}

/// Compute the next version from the latest released one.
///
/// Without a pre-release request, `increment` is applied as is. With one,
/// a latest version that is already a pre-release keeps its core and counts
/// its identifier up (`1.0.0-rc-3` -> `1.0.0-rc-4`); otherwise the core is
/// bumped and the counter starts at 1. `Build` ignores the pre-release request.
pub fn next_version(
    latest: &Version,
    increment: Increment,
    prerelease: Option<&PrereleaseRequest>,
) -> Result<Version> {
    let request = match prerelease {
        Some(request) if increment != Increment::Build => request,
        _ => return bump(latest, increment),
    };
    let label = request.label.as_deref();

    if !latest.pre.is_empty() {
        let mut next = latest.clone();
        next.pre = next_prerelease(&latest.pre, false, label)?;
        next.build = semver::BuildMetadata::EMPTY;
        return Ok(next);
    }

    let mut next = bump(latest, increment)?;
    next.pre = next_prerelease(&latest.pre, true, label)?;
    Ok(next)
}

/// Whether `version` still needs release refs, given the newest version
/// already released in its scope.
pub fn needs_release(latest_in_scope: Option<&Version>, version: &Version) -> bool {
    latest_in_scope != Some(version)
}
