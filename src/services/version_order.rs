//! Semantic version ordering for version listings.

use semver::Version as SemVer;

use crate::error::{AppError, Result};
use crate::models::package::Version;

/// Sort versions newest-first by semantic version precedence (major, minor,
/// patch, then pre-release rules).
///
/// Fails if any stored version string does not parse; the publish pipeline
/// validates version strings, so a failure here indicates corrupted state.
pub fn sort_versions_desc(versions: Vec<Version>) -> Result<Vec<Version>> {
    let mut parsed = versions
        .into_iter()
        .map(|v| {
            let semver = SemVer::parse(&v.version).map_err(|e| {
                AppError::Validation(format!("Invalid version format {}: {}", v.version, e))
            })?;
            Ok((semver, v))
        })
        .collect::<Result<Vec<_>>>()?;

    parsed.sort_by(|(a, _), (b, _)| b.cmp(a));
    Ok(parsed.into_iter().map(|(_, v)| v).collect())
}

/// Validate that a version string is a parseable semantic version.
pub fn validate_version(version: &str) -> Result<()> {
    SemVer::parse(version).map_err(|_| {
        AppError::Validation(
            "Given version is not valid. Assure it is a valid semantic version.".into(),
        )
    })?;
    Ok(())
}
