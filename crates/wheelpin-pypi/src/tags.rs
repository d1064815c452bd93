//! Interpreter families, compact python tags, and wheel filename tags.

use crate::error::{PypiError, Result};
use crate::version::PythonVersion;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Interpreter implementation a wheel is built for.
///
/// Each family owns its ABI compatibility rule, see [`PythonFamily::abi_rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum PythonFamily {
    CPython,
    PyPy,
}

/// Decides whether an ABI tag can be loaded by an interpreter of a given version.
pub type AbiRule = fn(&str, PythonVersion) -> Result<bool>;

impl PythonFamily {
    /// Two-letter tag prefix used in wheel filenames (`cp`, `pp`).
    pub fn tag(self) -> &'static str {
        match self {
            Self::CPython => "cp",
            Self::PyPy => "pp",
        }
    }

    /// Returns the ABI compatibility rule for this family.
    pub fn abi_rule(self) -> AbiRule {
        match self {
            Self::CPython => cpython_abi_rule,
            Self::PyPy => pypy_abi_rule,
        }
    }

    /// Checks `abi_tag` against this family's ABI rule.
    ///
    /// # Errors
    ///
    /// Returns `PypiError::UnsupportedFamily` for families without a rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheelpin_pypi::{PythonFamily, PythonVersion};
    ///
    /// let py310 = PythonVersion::new(3, 10);
    /// assert!(PythonFamily::CPython.is_compatible_abi_tag("abi3", py310).unwrap());
    /// assert!(PythonFamily::CPython.is_compatible_abi_tag("cp310", py310).unwrap());
    /// assert!(!PythonFamily::CPython.is_compatible_abi_tag("cp39", py310).unwrap());
    /// assert!(PythonFamily::PyPy.is_compatible_abi_tag("pypy39_pp73", py310).is_err());
    /// ```
    pub fn is_compatible_abi_tag(self, abi_tag: &str, version: PythonVersion) -> Result<bool> {
        (self.abi_rule())(abi_tag, version)
    }
}

fn cpython_abi_rule(abi_tag: &str, version: PythonVersion) -> Result<bool> {
    if abi_tag == "abi3" {
        return Ok(true);
    }

    let exact = format!("cp{}{}", version.major(), version.minor());
    if abi_tag == exact {
        return Ok(true);
    }

    // pymalloc builds carry an `m` suffix up to 3.7
    let pymalloc = version <= PythonVersion::new(3, 7)
        && abi_tag.strip_suffix('m') == Some(exact.as_str());
    Ok(pymalloc)
}

fn pypy_abi_rule(_abi_tag: &str, _version: PythonVersion) -> Result<bool> {
    Err(PypiError::UnsupportedFamily {
        family: PythonFamily::PyPy.to_string(),
    })
}

impl FromStr for PythonFamily {
    type Err = PypiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cp" | "cpython" => Ok(Self::CPython),
            "pp" | "pypy" => Ok(Self::PyPy),
            other => Err(PypiError::malformed_tag(other)),
        }
    }
}

impl TryFrom<String> for PythonFamily {
    type Error = PypiError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for PythonFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CPython => f.write_str("CPython"),
            Self::PyPy => f.write_str("PyPy"),
        }
    }
}

static DISTRIBUTION_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<family>\w\w)(?P<major>\d)(?P<minor>\d+)$").expect("valid regex")
});

/// Splits a compact python tag such as `cp310` into family and version.
///
/// The grammar is a two-letter family, a one-digit major, and a
/// variable-length minor.
///
/// # Errors
///
/// Returns `PypiError::MalformedTag` if the tag does not match the grammar or
/// names a family other than `cp`/`pp`.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::{PythonFamily, PythonVersion, parse_distribution_tag};
///
/// let (family, version) = parse_distribution_tag("cp310").unwrap();
/// assert_eq!(family, PythonFamily::CPython);
/// assert_eq!(version, PythonVersion::new(3, 10));
///
/// assert!(parse_distribution_tag("py3").is_err());
/// ```
pub fn parse_distribution_tag(tag: &str) -> Result<(PythonFamily, PythonVersion)> {
    let caps = DISTRIBUTION_TAG_REGEX
        .captures(tag)
        .ok_or_else(|| PypiError::malformed_tag(tag))?;

    let family = match &caps["family"] {
        "cp" => PythonFamily::CPython,
        "pp" => PythonFamily::PyPy,
        _ => return Err(PypiError::malformed_tag(tag)),
    };

    let major = caps["major"]
        .parse::<u8>()
        .map_err(|_| PypiError::malformed_tag(tag))?;
    let minor = caps["minor"]
        .parse::<u8>()
        .map_err(|_| PypiError::malformed_tag(tag))?;

    Ok((family, PythonVersion::new(major, minor)))
}

/// The three tag groups encoded in a wheel filename.
///
/// Each group may be a dot-separated union in the filename (`py2.py3`);
/// here every group is split into its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTags {
    pub python: Vec<String>,
    pub abi: Vec<String>,
    pub platform: Vec<String>,
}

impl WheelTags {
    /// Extracts the tag groups from
    /// `{distribution}-{version}(-{build})?-{python}-{abi}-{platform}.whl`.
    ///
    /// # Errors
    ///
    /// Returns `PypiError::MalformedFilename` when the name lacks the `.whl`
    /// extension, has the wrong number of components, or has an empty component.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheelpin_pypi::WheelTags;
    ///
    /// let tags = WheelTags::from_filename("six-1.16.0-py2.py3-none-any.whl").unwrap();
    /// assert_eq!(tags.python, vec!["py2", "py3"]);
    /// assert_eq!(tags.abi, vec!["none"]);
    /// assert_eq!(tags.platform, vec!["any"]);
    /// ```
    pub fn from_filename(filename: &str) -> Result<Self> {
        let malformed = || PypiError::MalformedFilename {
            filename: filename.to_string(),
        };

        let stem = filename.strip_suffix(".whl").ok_or_else(malformed)?;
        let parts: Vec<&str> = stem.split('-').collect();
        if !(5..=6).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(malformed());
        }

        let split = |group: &str| -> Vec<String> { group.split('.').map(String::from).collect() };
        let n = parts.len();

        let tags = Self {
            python: split(parts[n - 3]),
            abi: split(parts[n - 2]),
            platform: split(parts[n - 1]),
        };

        let any_empty = [&tags.python, &tags.abi, &tags.platform]
            .iter()
            .any(|group| group.iter().any(|t| t.is_empty()));
        if any_empty {
            return Err(malformed());
        }

        Ok(tags)
    }

    /// Returns the wheel's only ABI tag.
    ///
    /// # Errors
    ///
    /// Returns `PypiError::MultipleAbiTags` if the filename declares more than one.
    pub fn single_abi_tag(&self, filename: &str) -> Result<&str> {
        match self.abi.as_slice() {
            [tag] => Ok(tag.as_str()),
            _ => Err(PypiError::MultipleAbiTags {
                filename: filename.to_string(),
                tags: self.abi.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_distribution_tag() {
        assert_eq!(
            parse_distribution_tag("cp27").unwrap(),
            (PythonFamily::CPython, PythonVersion::new(2, 7))
        );
        assert_eq!(
            parse_distribution_tag("cp312").unwrap(),
            (PythonFamily::CPython, PythonVersion::new(3, 12))
        );
        assert_eq!(
            parse_distribution_tag("pp39").unwrap(),
            (PythonFamily::PyPy, PythonVersion::new(3, 9))
        );
    }

    #[test]
    fn test_parse_distribution_tag_rejects_malformed() {
        for tag in ["py3", "py36", "cp3", "cp", "c310", "cp3x", "cp310m", "ip38", ""] {
            assert!(
                matches!(parse_distribution_tag(tag), Err(PypiError::MalformedTag { .. })),
                "expected failure for {:?}",
                tag
            );
        }
    }

    #[test]
    fn test_cpython_abi_rule() {
        let py38 = PythonVersion::new(3, 8);
        let cp = PythonFamily::CPython;

        assert!(cp.is_compatible_abi_tag("abi3", py38).unwrap());
        assert!(cp.is_compatible_abi_tag("cp38", py38).unwrap());
        assert!(!cp.is_compatible_abi_tag("cp37", py38).unwrap());
        assert!(!cp.is_compatible_abi_tag("cp38m", py38).unwrap());
        assert!(!cp.is_compatible_abi_tag("pypy38_pp73", py38).unwrap());
    }

    #[test]
    fn test_cpython_pymalloc_suffix() {
        let cp = PythonFamily::CPython;

        assert!(cp.is_compatible_abi_tag("cp37m", PythonVersion::new(3, 7)).unwrap());
        assert!(cp.is_compatible_abi_tag("cp27m", PythonVersion::new(2, 7)).unwrap());
        assert!(!cp.is_compatible_abi_tag("cp36m", PythonVersion::new(3, 7)).unwrap());
    }

    #[test]
    fn test_pypy_abi_rule_unsupported() {
        let result = PythonFamily::PyPy.is_compatible_abi_tag("abi3", PythonVersion::new(3, 9));
        assert!(matches!(result, Err(PypiError::UnsupportedFamily { .. })));
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("cp".parse::<PythonFamily>().unwrap(), PythonFamily::CPython);
        assert_eq!("pp".parse::<PythonFamily>().unwrap(), PythonFamily::PyPy);
        assert!("jy".parse::<PythonFamily>().is_err());
    }

    #[test]
    fn test_wheel_tags_binary() {
        let tags = WheelTags::from_filename(
            "numpy-1.26.4-cp312-cp312-manylinux_2_17_x86_64.manylinux2014_x86_64.whl",
        )
        .unwrap();

        assert_eq!(tags.python, vec!["cp312"]);
        assert_eq!(tags.abi, vec!["cp312"]);
        assert_eq!(
            tags.platform,
            vec!["manylinux_2_17_x86_64", "manylinux2014_x86_64"]
        );
    }

    #[test]
    fn test_wheel_tags_with_build_tag() {
        let tags = WheelTags::from_filename("pkg-1.0-1-cp38-abi3-win_amd64.whl").unwrap();
        assert_eq!(tags.python, vec!["cp38"]);
        assert_eq!(tags.abi, vec!["abi3"]);
        assert_eq!(tags.platform, vec!["win_amd64"]);
    }

    #[test]
    fn test_wheel_tags_malformed() {
        for filename in [
            "pkg-1.0.tar.gz",
            "pkg-1.0-py3-none.whl",
            "pkg-1.0-1-2-py3-none-any.whl",
            "pkg-1.0--none-any.whl",
            "pkg-1.0-py3.-none-any.whl",
        ] {
            assert!(
                matches!(
                    WheelTags::from_filename(filename),
                    Err(PypiError::MalformedFilename { .. })
                ),
                "expected failure for {:?}",
                filename
            );
        }
    }

    #[test]
    fn test_single_abi_tag() {
        let filename = "pkg-1.0-cp38-cp38.abi3-win32.whl";
        let tags = WheelTags::from_filename(filename).unwrap();
        assert!(matches!(
            tags.single_abi_tag(filename),
            Err(PypiError::MultipleAbiTags { .. })
        ));

        let filename = "pkg-1.0-cp38-abi3-win32.whl";
        let tags = WheelTags::from_filename(filename).unwrap();
        assert_eq!(tags.single_abi_tag(filename).unwrap(), "abi3");
    }
}
