use crate::error::{PypiError, Result};
use crate::tags::{PythonFamily, parse_distribution_tag};
use crate::version::PythonVersion;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Kind of distributed file, from the `packagetype` field.
///
/// Only wheels are ever installable as far as the matcher is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    Source,
    Wheel,
    Egg,
    WindowsInstaller,
    Msi,
}

impl DistributionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "sdist",
            Self::Wheel => "bdist_wheel",
            Self::Egg => "bdist_egg",
            Self::WindowsInstaller => "bdist_wininst",
            Self::Msi => "bdist_msi",
        }
    }
}

impl FromStr for DistributionKind {
    type Err = PypiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sdist" => Ok(Self::Source),
            "bdist_wheel" => Ok(Self::Wheel),
            "bdist_egg" => Ok(Self::Egg),
            "bdist_wininst" => Ok(Self::WindowsInstaller),
            "bdist_msi" => Ok(Self::Msi),
            other => Err(PypiError::UnknownDistributionKind(other.to_string())),
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse interpreter applicability from a release file's `python_version` field.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::{DeclaredPythonVersion, PythonFamily, PythonVersion};
///
/// let declared: DeclaredPythonVersion = "py3".parse().unwrap();
/// assert!(declared.is_compatible(PythonVersion::new(3, 11), PythonFamily::CPython));
/// assert!(!declared.is_compatible(PythonVersion::new(2, 7), PythonFamily::CPython));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredPythonVersion {
    /// A compact tag such as `cp38`
    FullySpecified {
        family: PythonFamily,
        version: PythonVersion,
    },
    /// A bare version such as `3.8`
    VersionOnly(PythonVersion),
    /// A bare version with a non-zero micro part such as `2.7.18`
    ///
    /// Targets are `major.minor` only, so this never matches.
    MicroRelease(PythonVersion),
    AnyPython2,
    AnyPython3,
    AnyPython2Or3,
    Source,
}

impl FromStr for DeclaredPythonVersion {
    type Err = PypiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "source" => return Ok(Self::Source),
            "py2" => return Ok(Self::AnyPython2),
            "py3" => return Ok(Self::AnyPython3),
            // old azure packages use "sdk"
            "py2.py3" | "any" | "sdk" => return Ok(Self::AnyPython2Or3),
            _ => {}
        }

        if let Ok(version) = pep440_rs::Version::from_str(s) {
            let python = PythonVersion::from_pep440(&version)
                .ok_or_else(|| PypiError::malformed_tag(s))?;
            // "3.8.0" still equals 3.8
            if version.release().iter().skip(2).any(|part| *part != 0) {
                return Ok(Self::MicroRelease(python));
            }
            return Ok(Self::VersionOnly(python));
        }

        let (family, version) = parse_distribution_tag(s)?;
        Ok(Self::FullySpecified { family, version })
    }
}

impl DeclaredPythonVersion {
    /// Returns `true` if files declared this way can run on `version` of `family`.
    pub fn is_compatible(self, version: PythonVersion, family: PythonFamily) -> bool {
        match self {
            Self::Source | Self::AnyPython2Or3 => true,
            Self::AnyPython2 => version.major() == 2,
            Self::AnyPython3 => version.major() == 3,
            Self::VersionOnly(declared) => declared == version,
            Self::MicroRelease(_) => false,
            Self::FullySpecified {
                family: declared_family,
                version: declared,
            } => declared == version && declared_family == family,
        }
    }
}

/// Operating system and architecture an upgrade is computed for.
///
/// Each target owns a fixed allow-list of wheel platform tags, see
/// [`OperatingSystem::platform_tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum OperatingSystem {
    LinuxX86_64,
    LinuxX86,
    MacOs,
    WindowsX64,
    WindowsX86,
}

const LINUX_X86_64_TAGS: &[&str] = &[
    "manylinux1_x86_64",
    "manylinux2010_x86_64",
    "manylinux2014_x86_64",
    "manylinux_2_5_x86_64",
    "manylinux_2_12_x86_64",
    "manylinux_2_17_x86_64",
];

const LINUX_X86_TAGS: &[&str] = &[
    "manylinux1_i686",
    "manylinux2010_i686",
    "manylinux2014_i686",
    "manylinux_2_5_i686",
    "manylinux_2_12_i686",
    "manylinux_2_17_i686",
];

// Intel host: x86_64 slices and fat binaries that contain one
const MACOS_TAGS: &[&str] = &[
    "macosx_10_6_x86_64", "macosx_10_6_intel", "macosx_10_6_universal", "macosx_10_6_universal2",
    "macosx_10_7_x86_64", "macosx_10_7_intel", "macosx_10_7_universal", "macosx_10_7_universal2",
    "macosx_10_8_x86_64", "macosx_10_8_intel", "macosx_10_8_universal", "macosx_10_8_universal2",
    "macosx_10_9_x86_64", "macosx_10_9_intel", "macosx_10_9_universal", "macosx_10_9_universal2",
    "macosx_10_10_x86_64", "macosx_10_10_intel", "macosx_10_10_universal", "macosx_10_10_universal2",
    "macosx_10_11_x86_64", "macosx_10_11_intel", "macosx_10_11_universal", "macosx_10_11_universal2",
    "macosx_10_12_x86_64", "macosx_10_12_intel", "macosx_10_12_universal", "macosx_10_12_universal2",
    "macosx_10_13_x86_64", "macosx_10_13_intel", "macosx_10_13_universal", "macosx_10_13_universal2",
    "macosx_10_14_x86_64", "macosx_10_14_intel", "macosx_10_14_universal", "macosx_10_14_universal2",
    "macosx_10_15_x86_64", "macosx_10_15_intel", "macosx_10_15_universal", "macosx_10_15_universal2",
    "macosx_11_0_x86_64", "macosx_11_0_universal2",
    "macosx_12_0_x86_64", "macosx_12_0_universal2",
    "macosx_13_0_x86_64", "macosx_13_0_universal2",
    "macosx_14_0_x86_64", "macosx_14_0_universal2",
];

const WINDOWS_X64_TAGS: &[&str] = &["win_amd64"];

const WINDOWS_X86_TAGS: &[&str] = &["win32"];

impl OperatingSystem {
    pub const ALL: [Self; 5] = [
        Self::LinuxX86_64,
        Self::LinuxX86,
        Self::MacOs,
        Self::WindowsX64,
        Self::WindowsX86,
    ];

    /// Canonical command-line name.
    pub fn name(self) -> &'static str {
        match self {
            Self::LinuxX86_64 => "linux-x86_64",
            Self::LinuxX86 => "linux-x86_32",
            Self::MacOs => "macos",
            Self::WindowsX64 => "windows-x64",
            Self::WindowsX86 => "windows-x86",
        }
    }

    /// Wheel platform tags installable on this target.
    pub fn platform_tags(self) -> &'static [&'static str] {
        match self {
            Self::LinuxX86_64 => LINUX_X86_64_TAGS,
            Self::LinuxX86 => LINUX_X86_TAGS,
            Self::MacOs => MACOS_TAGS,
            Self::WindowsX64 => WINDOWS_X64_TAGS,
            Self::WindowsX86 => WINDOWS_X86_TAGS,
        }
    }

    pub fn is_platform_tag_compatible(self, platform_tag: &str) -> bool {
        self.platform_tags().contains(&platform_tag)
    }
}

impl FromStr for OperatingSystem {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "linux-x86_64" | "linux_86_64" => Ok(Self::LinuxX86_64),
            "linux-x86_32" | "linux_32_64" => Ok(Self::LinuxX86),
            "macos" | "mac" => Ok(Self::MacOs),
            "windows-x64" | "windows_64" => Ok(Self::WindowsX64),
            "windows-x86" | "windows_32" => Ok(Self::WindowsX86),
            other => Err(format!(
                "unknown target OS '{}', expected one of: {}",
                other,
                Self::ALL.map(Self::name).join(", ")
            )),
        }
    }
}

impl TryFrom<String> for OperatingSystem {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The interpreter and platform an upgrade must run on.
///
/// Constant for the duration of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityTarget {
    pub family: PythonFamily,
    pub version: PythonVersion,
    pub os: OperatingSystem,
}

impl CompatibilityTarget {
    pub fn new(family: PythonFamily, version: PythonVersion, os: OperatingSystem) -> Self {
        Self {
            family,
            version,
            os,
        }
    }
}

impl fmt::Display for CompatibilityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {}", self.family.tag(), self.version, self.os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_kind_from_str() {
        assert_eq!(
            "bdist_wheel".parse::<DistributionKind>().unwrap(),
            DistributionKind::Wheel
        );
        assert_eq!(
            "sdist".parse::<DistributionKind>().unwrap(),
            DistributionKind::Source
        );
        assert_eq!(
            "bdist_msi".parse::<DistributionKind>().unwrap(),
            DistributionKind::Msi
        );
        assert!(matches!(
            "bdist_rpm".parse::<DistributionKind>(),
            Err(PypiError::UnknownDistributionKind(_))
        ));
    }

    #[test]
    fn test_declared_python_version_parsing() {
        assert_eq!(
            "source".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::Source
        );
        assert_eq!(
            "py2.py3".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::AnyPython2Or3
        );
        assert_eq!(
            "sdk".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::AnyPython2Or3
        );
        assert_eq!(
            "3.6".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::VersionOnly(PythonVersion::new(3, 6))
        );
        assert_eq!(
            "3.8.0".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::VersionOnly(PythonVersion::new(3, 8))
        );
        assert_eq!(
            "2.7.18".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::MicroRelease(PythonVersion::new(2, 7))
        );
        assert_eq!(
            "cp310".parse::<DeclaredPythonVersion>().unwrap(),
            DeclaredPythonVersion::FullySpecified {
                family: PythonFamily::CPython,
                version: PythonVersion::new(3, 10),
            }
        );
        assert!(matches!(
            "py35".parse::<DeclaredPythonVersion>(),
            Err(PypiError::MalformedTag { .. })
        ));
    }

    #[test]
    fn test_declared_python_version_compatibility() {
        let py27 = PythonVersion::new(2, 7);
        let py38 = PythonVersion::new(3, 8);
        let cp = PythonFamily::CPython;

        assert!(DeclaredPythonVersion::Source.is_compatible(py27, cp));
        assert!(DeclaredPythonVersion::AnyPython2Or3.is_compatible(py38, cp));
        assert!(DeclaredPythonVersion::AnyPython2.is_compatible(py27, cp));
        assert!(!DeclaredPythonVersion::AnyPython2.is_compatible(py38, cp));
        assert!(DeclaredPythonVersion::AnyPython3.is_compatible(py38, cp));
        assert!(DeclaredPythonVersion::VersionOnly(py38).is_compatible(py38, cp));
        assert!(!DeclaredPythonVersion::VersionOnly(py27).is_compatible(py38, cp));
    }

    #[test]
    fn test_micro_release_is_not_truncated() {
        let py27 = PythonVersion::new(2, 7);
        let py38 = PythonVersion::new(3, 8);
        let cp = PythonFamily::CPython;

        let declared: DeclaredPythonVersion = "2.7.18".parse().unwrap();
        assert!(!declared.is_compatible(py27, cp));

        let declared: DeclaredPythonVersion = "3.8.0".parse().unwrap();
        assert!(declared.is_compatible(py38, cp));
    }

    #[test]
    fn test_fully_specified_requires_family_match() {
        let py39 = PythonVersion::new(3, 9);
        let declared = DeclaredPythonVersion::FullySpecified {
            family: PythonFamily::CPython,
            version: py39,
        };

        assert!(declared.is_compatible(py39, PythonFamily::CPython));
        assert!(!declared.is_compatible(py39, PythonFamily::PyPy));
        assert!(!declared.is_compatible(PythonVersion::new(3, 10), PythonFamily::CPython));
    }

    #[test]
    fn test_operating_system_names() {
        for os in OperatingSystem::ALL {
            assert_eq!(os.name().parse::<OperatingSystem>().unwrap(), os);
        }
        assert_eq!(
            "linux_86_64".parse::<OperatingSystem>().unwrap(),
            OperatingSystem::LinuxX86_64
        );
        assert_eq!(
            "windows_32".parse::<OperatingSystem>().unwrap(),
            OperatingSystem::WindowsX86
        );
        assert!("solaris".parse::<OperatingSystem>().is_err());
    }

    #[test]
    fn test_platform_allow_lists() {
        assert!(OperatingSystem::LinuxX86_64.is_platform_tag_compatible("manylinux2014_x86_64"));
        assert!(OperatingSystem::LinuxX86_64.is_platform_tag_compatible("manylinux_2_17_x86_64"));
        assert!(!OperatingSystem::LinuxX86_64.is_platform_tag_compatible("manylinux2014_i686"));
        assert!(!OperatingSystem::LinuxX86_64.is_platform_tag_compatible("musllinux_1_1_x86_64"));
        assert!(OperatingSystem::LinuxX86.is_platform_tag_compatible("manylinux_2_5_i686"));
        assert!(OperatingSystem::WindowsX64.is_platform_tag_compatible("win_amd64"));
        assert!(!OperatingSystem::WindowsX64.is_platform_tag_compatible("win32"));
        assert!(OperatingSystem::WindowsX86.is_platform_tag_compatible("win32"));
        assert!(OperatingSystem::MacOs.is_platform_tag_compatible("macosx_10_9_x86_64"));
        assert!(OperatingSystem::MacOs.is_platform_tag_compatible("macosx_11_0_universal2"));
        assert!(!OperatingSystem::MacOs.is_platform_tag_compatible("macosx_11_0_arm64"));
    }

    #[test]
    fn test_target_display() {
        let target = CompatibilityTarget::new(
            PythonFamily::CPython,
            PythonVersion::new(3, 10),
            OperatingSystem::LinuxX86_64,
        );
        assert_eq!(target.to_string(), "cp3.10 linux-x86_64");
    }
}
