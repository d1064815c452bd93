//! Interpreter versions and the fixed universe of released interpreters.

use crate::error::{PypiError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A `major.minor` interpreter version such as `3.10`.
///
/// Ordering is numeric per component, so `3.9 < 3.10`.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::PythonVersion;
///
/// let v: PythonVersion = "3.10".parse().unwrap();
/// assert_eq!(v, PythonVersion::new(3, 10));
/// assert!(PythonVersion::new(3, 9) < v);
/// assert_eq!(v.to_string(), "3.10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct PythonVersion {
    major: u8,
    minor: u8,
}

/// Interpreter versions the requires-python evaluator enumerates.
pub const RELEASED_PYTHON_VERSIONS: [PythonVersion; 8] = [
    PythonVersion::new(2, 7),
    PythonVersion::new(3, 6),
    PythonVersion::new(3, 7),
    PythonVersion::new(3, 8),
    PythonVersion::new(3, 9),
    PythonVersion::new(3, 10),
    PythonVersion::new(3, 11),
    PythonVersion::new(3, 12),
];

/// Returns [`RELEASED_PYTHON_VERSIONS`] as an ordered set.
pub fn released_python_versions() -> BTreeSet<PythonVersion> {
    RELEASED_PYTHON_VERSIONS.into_iter().collect()
}

impl PythonVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub const fn major(self) -> u8 {
        self.major
    }

    pub const fn minor(self) -> u8 {
        self.minor
    }

    /// Returns `major.(minor + 1)`, or `None` on overflow.
    pub fn next_minor(self) -> Option<Self> {
        self.minor.checked_add(1).map(|minor| Self::new(self.major, minor))
    }

    /// Returns `true` if this is one of [`RELEASED_PYTHON_VERSIONS`].
    pub fn is_released(self) -> bool {
        RELEASED_PYTHON_VERSIONS.contains(&self)
    }

    /// Truncates a PEP 440 version to its first two release components.
    ///
    /// A bare major (`3`) is read as `3.0`. Returns `None` when a component
    /// does not fit.
    pub fn from_pep440(version: &pep440_rs::Version) -> Option<Self> {
        let release = version.release();
        let major = u8::try_from(*release.first()?).ok()?;
        let minor = u8::try_from(release.get(1).copied().unwrap_or(0)).ok()?;
        Some(Self::new(major, minor))
    }
}

/// Parses a `major.minor` interpreter version.
///
/// # Errors
///
/// Returns `PypiError::MalformedVersion` unless the input is exactly two
/// dot-separated decimal components.
pub fn parse_version(s: &str) -> Result<PythonVersion> {
    let Some((major, minor)) = s.split_once('.') else {
        return Err(PypiError::malformed_version(s, "expected MAJOR.MINOR"));
    };

    let component = |part: &str| -> Result<u8> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PypiError::malformed_version(s, "components must be decimal"));
        }
        part.parse::<u8>()
            .map_err(|e| PypiError::malformed_version(s, e.to_string()))
    };

    Ok(PythonVersion::new(component(major)?, component(minor)?))
}

impl FromStr for PythonVersion {
    type Err = PypiError;

    fn from_str(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

impl TryFrom<String> for PythonVersion {
    type Error = PypiError;

    fn try_from(value: String) -> Result<Self> {
        parse_version(&value)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_versions_round_trip() {
        for version in RELEASED_PYTHON_VERSIONS {
            let parsed = parse_version(&version.to_string()).unwrap();
            assert_eq!(parsed, version);
        }
    }

    #[test]
    fn test_released_versions_are_ordered() {
        for pair in RELEASED_PYTHON_VERSIONS.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_numeric_minor_ordering() {
        assert!(parse_version("3.9").unwrap() < parse_version("3.10").unwrap());
        assert!(parse_version("2.7").unwrap() < parse_version("3.0").unwrap());
    }

    #[test]
    fn test_parse_version_rejects_malformed() {
        for input in ["", "3", "3.", ".7", "3.x", "3.10.1", "a.b", "3.-1", "3.1000"] {
            assert!(
                matches!(parse_version(input), Err(PypiError::MalformedVersion { .. })),
                "expected failure for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_next_minor() {
        assert_eq!(
            PythonVersion::new(3, 6).next_minor(),
            Some(PythonVersion::new(3, 7))
        );
        assert_eq!(PythonVersion::new(3, 255).next_minor(), None);
    }

    #[test]
    fn test_is_released() {
        assert!(PythonVersion::new(3, 8).is_released());
        assert!(!PythonVersion::new(3, 5).is_released());
        assert!(!PythonVersion::new(3, 13).is_released());
    }

    #[test]
    fn test_from_pep440() {
        let v = pep440_rs::Version::from_str("3.6").unwrap();
        assert_eq!(PythonVersion::from_pep440(&v), Some(PythonVersion::new(3, 6)));

        let v = pep440_rs::Version::from_str("3").unwrap();
        assert_eq!(PythonVersion::from_pep440(&v), Some(PythonVersion::new(3, 0)));

        let v = pep440_rs::Version::from_str("2.7.18").unwrap();
        assert_eq!(PythonVersion::from_pep440(&v), Some(PythonVersion::new(2, 7)));
    }

    #[test]
    fn test_deserialize_from_string() {
        let v: PythonVersion = serde_json::from_str("\"3.11\"").unwrap();
        assert_eq!(v, PythonVersion::new(3, 11));
        assert!(serde_json::from_str::<PythonVersion>("\"three\"").is_err());
    }
}
