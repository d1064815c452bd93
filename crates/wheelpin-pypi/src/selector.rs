//! Picks the lowest release at or above a floor that has a compatible file.

use crate::catalog::{PackageCatalog, Release};
use crate::error::{PypiError, Result};
use crate::matcher::{Verdict, evaluate};
use crate::types::CompatibilityTarget;
use pep440_rs::Version;
use serde::Deserialize;

/// What to do when one file's metadata cannot be interpreted.
///
/// Applies to errors scoped to a single artifact (see
/// [`PypiError::is_artifact_error`]). An interpreter family without an ABI
/// rule always stops the package's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactErrorPolicy {
    /// Log a warning and move on to the next file
    #[default]
    Skip,
    /// Fail the whole package
    Abort,
}

/// Knobs for [`select_release`].
///
/// # Defaults
///
/// - `artifact_errors`: `Skip`
/// - `include_prereleases`: `true` (every release at or above the floor is a candidate)
#[derive(Debug, Clone, Copy)]
pub struct SelectOptions {
    pub artifact_errors: ArtifactErrorPolicy,
    /// When `false`, pre-releases and dev releases are passed over unless the
    /// floor is itself one
    pub include_prereleases: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            artifact_errors: ArtifactErrorPolicy::default(),
            include_prereleases: true,
        }
    }
}

/// The release chosen for a pinned requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub version: Version,
    /// Filename of the first compatible artifact
    pub filename: String,
}

fn is_prerelease(version: &Version) -> bool {
    version.is_pre() || version.is_dev()
}

/// Finds the first compatible artifact within one release, in listed order.
///
/// # Errors
///
/// Propagates artifact errors under [`ArtifactErrorPolicy::Abort`] and
/// unsupported interpreter families under either policy.
pub fn find_compatible_artifact<'a>(
    release: &'a Release,
    target: &CompatibilityTarget,
    policy: ArtifactErrorPolicy,
) -> Result<Option<&'a str>> {
    for artifact in &release.artifacts {
        match evaluate(artifact, target) {
            Ok(Verdict::Compatible) => return Ok(Some(artifact.filename.as_str())),
            Ok(Verdict::Incompatible(reason)) => {
                tracing::trace!("{}: {}", artifact.filename, reason);
            }
            Err(e) if e.is_artifact_error() && policy == ArtifactErrorPolicy::Skip => {
                tracing::warn!("skipping {}: {}", artifact.filename, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Selects the lowest release `>= floor` with at least one compatible artifact.
///
/// Every release at or above the floor is a candidate. With
/// `options.include_prereleases` off, pre-releases are passed over unless the
/// floor itself is a pre-release.
///
/// # Errors
///
/// Returns `PypiError::NoCompatibleRelease` when no release qualifies, or the
/// first error that the artifact policy does not absorb.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use pep440_rs::Version;
/// use wheelpin_pypi::{
///     ArtifactErrorPolicy, CompatibilityTarget, OperatingSystem, PackageCatalog, PythonFamily,
///     PythonVersion, SelectOptions, select_release,
/// };
///
/// let json = r#"{
///     "info": {},
///     "releases": {
///         "1.0": [{"filename": "demo-1.0.tar.gz", "packagetype": "sdist",
///                  "python_version": "source", "requires_python": null}],
///         "1.1": [{"filename": "demo-1.1-py3-none-any.whl", "packagetype": "bdist_wheel",
///                  "python_version": "py3", "requires_python": ">=3.6"}]
///     }
/// }"#;
/// let catalog = PackageCatalog::from_json("demo", json.as_bytes(), ArtifactErrorPolicy::Skip).unwrap();
/// let target = CompatibilityTarget::new(
///     PythonFamily::CPython,
///     PythonVersion::new(3, 8),
///     OperatingSystem::LinuxX86_64,
/// );
///
/// let floor = Version::from_str("1.0").unwrap();
/// let selection = select_release(&catalog, &floor, &target, SelectOptions::default()).unwrap();
/// assert_eq!(selection.version.to_string(), "1.1");
/// ```
pub fn select_release(
    catalog: &PackageCatalog,
    floor: &Version,
    target: &CompatibilityTarget,
    options: SelectOptions,
) -> Result<Selection> {
    let allow_prereleases = options.include_prereleases || is_prerelease(floor);

    for release in catalog.releases_from(floor) {
        if !allow_prereleases && is_prerelease(&release.version) {
            tracing::debug!("{} {}: pre-release, skipping", catalog.name(), release.version);
            continue;
        }

        match find_compatible_artifact(release, target, options.artifact_errors)? {
            Some(filename) => {
                tracing::debug!(
                    "{} {}: compatible artifact {}",
                    catalog.name(),
                    release.version,
                    filename
                );
                return Ok(Selection {
                    version: release.version.clone(),
                    filename: filename.to_string(),
                });
            }
            None => {
                tracing::debug!(
                    "{} {}: no compatible artifact for {}",
                    catalog.name(),
                    release.version,
                    target
                );
            }
        }
    }

    Err(PypiError::NoCompatibleRelease {
        package: catalog.name().to_string(),
        floor: floor.to_string(),
        target: target.to_string(),
    })
}
