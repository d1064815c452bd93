//! Decides whether one distributed file can be installed on a target.

use crate::catalog::Artifact;
use crate::error::Result;
use crate::tags::{WheelTags, parse_distribution_tag};
use crate::types::{CompatibilityTarget, DistributionKind};
use std::fmt;

/// Why an artifact was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Yanked,
    NotAWheel(DistributionKind),
    /// Neither `requires_python` nor the declared python version admits the target
    PythonVersionExcluded,
    AbiMismatch(String),
    PlatformMismatch,
    /// No python tag of the target family at or below the target version
    PythonTagMismatch,
    /// ABI is `none` but the wheel is not tagged for the `any` platform
    NotPlatformIndependent,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yanked => f.write_str("yanked"),
            Self::NotAWheel(kind) => write!(f, "not a wheel ({})", kind),
            Self::PythonVersionExcluded => f.write_str("python version excluded"),
            Self::AbiMismatch(tag) => write!(f, "ABI tag {} does not match", tag),
            Self::PlatformMismatch => f.write_str("no matching platform tag"),
            Self::PythonTagMismatch => f.write_str("no matching python tag"),
            Self::NotPlatformIndependent => f.write_str("pure wheel is not tagged 'any'"),
        }
    }
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Compatible,
    Incompatible(Rejection),
}

impl Verdict {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible)
    }
}

/// Runs the ordered compatibility checks for `artifact` against `target`.
///
/// The checks short-circuit in this order: yanked status, distribution kind,
/// interpreter applicability, ABI tag, then either the binary path (platform
/// tag and python tag) or, for ABI `none`, the pure-Python path.
///
/// # Errors
///
/// Malformed filenames and tags, multiple ABI tags, and ABI checks against an
/// interpreter family without an ABI rule are reported as errors, never as an
/// incompatible verdict. The caller decides whether to skip the artifact.
pub fn evaluate(artifact: &Artifact, target: &CompatibilityTarget) -> Result<Verdict> {
    use Verdict::{Compatible, Incompatible};

    if artifact.yanked {
        return Ok(Incompatible(Rejection::Yanked));
    }

    if artifact.kind != DistributionKind::Wheel {
        return Ok(Incompatible(Rejection::NotAWheel(artifact.kind)));
    }

    let applicable = match &artifact.requires_python {
        Some(admitted) => admitted.contains(&target.version),
        None => artifact
            .python_version
            .is_compatible(target.version, target.family),
    };
    if !applicable {
        return Ok(Incompatible(Rejection::PythonVersionExcluded));
    }

    let tags = WheelTags::from_filename(&artifact.filename)?;
    let abi_tag = tags.single_abi_tag(&artifact.filename)?;

    if abi_tag == "none" {
        if !tags.platform.iter().any(|p| p == "any") {
            return Ok(Incompatible(Rejection::NotPlatformIndependent));
        }
        if !artifact
            .python_version
            .is_compatible(target.version, target.family)
        {
            return Ok(Incompatible(Rejection::PythonVersionExcluded));
        }
        return Ok(Compatible);
    }

    if !target.family.is_compatible_abi_tag(abi_tag, target.version)? {
        return Ok(Incompatible(Rejection::AbiMismatch(abi_tag.to_string())));
    }

    if !tags
        .platform
        .iter()
        .any(|p| target.os.is_platform_tag_compatible(p))
    {
        return Ok(Incompatible(Rejection::PlatformMismatch));
    }

    let python_tags = tags
        .python
        .iter()
        .map(|t| parse_distribution_tag(t))
        .collect::<Result<Vec<_>>>()?;
    let python_ok = python_tags
        .iter()
        .any(|(family, version)| *family == target.family && *version <= target.version);
    if !python_ok {
        return Ok(Incompatible(Rejection::PythonTagMismatch));
    }

    Ok(Compatible)
}

/// Returns `true` if `artifact` can be installed on `target`.
///
/// See [`evaluate`] for the checks performed and the errors returned.
pub fn is_compatible(artifact: &Artifact, target: &CompatibilityTarget) -> Result<bool> {
    evaluate(artifact, target).map(|verdict| verdict.is_compatible())
}
