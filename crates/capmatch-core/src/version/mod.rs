//! Versions and version ranges used as attribute values.
//!
//! Versions are `semver::Version` values parsed leniently: missing minor and
//! micro components default to zero and a fourth dot-separated qualifier is
//! kept as build metadata, so `1.2.3.SNAPSHOT` orders after `1.2.3`.

mod range;

pub use range::VersionRange;
pub use semver::Version;

use semver::BuildMetadata;

use crate::error::VersionError;

/// Parse a version string, accepting `1`, `1.2`, `1.2.3` and `1.2.3.qualifier`.
pub fn parse_version(text: &str) -> Result<Version, VersionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty);
    }

    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    let mut parts = trimmed.splitn(4, '.');
    let mut numbers = [0u64; 3];
    for slot in numbers.iter_mut() {
        let Some(part) = parts.next() else { break };
        *slot = part.parse().map_err(|_| VersionError::Malformed {
            text: trimmed.to_string(),
            reason: format!("'{}' is not a number", part),
        })?;
    }

    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(qualifier) = parts.next() {
        version.build = BuildMetadata::new(qualifier).map_err(|e| VersionError::Malformed {
            text: trimmed.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(version)
}

/// The version used when a descriptor declares none.
pub fn empty_version() -> Version {
    Version::new(0, 0, 0)
}
