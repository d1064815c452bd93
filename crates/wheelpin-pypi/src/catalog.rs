//! Ingestion of the PyPI JSON document into an ordered release catalog.

use crate::error::{PypiError, Result};
use crate::requires::compatible_python_versions;
use crate::selector::ArtifactErrorPolicy;
use crate::types::{DeclaredPythonVersion, DistributionKind};
use crate::version::{PythonVersion, parse_version};
use once_cell::sync::Lazy;
use pep440_rs::Version;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

static PYTHON_CLASSIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Programming Language :: Python :: (?P<version>\d\.\d+)$").expect("valid regex")
});

// pytz published year+letter releases such as "2013a"
static YEAR_LETTER_RELEASE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^20[01]\d[a-z]$").expect("valid regex"));

/// Returns `true` for historical release keys that are not installable versions.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::catalog::is_legacy_malformed_version;
///
/// assert!(is_legacy_malformed_version("2.0.0-final"));
/// assert!(is_legacy_malformed_version("2013a"));
/// assert!(!is_legacy_malformed_version("2013.1"));
/// ```
pub fn is_legacy_malformed_version(key: &str) -> bool {
    key == "2.0.0-final" || YEAR_LETTER_RELEASE_REGEX.is_match(key)
}

// JSON response types

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    releases: HashMap<String, Vec<PypiReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    #[serde(default)]
    classifiers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PypiReleaseFile {
    filename: String,
    packagetype: String,
    python_version: String,
    #[serde(default)]
    requires_python: Option<String>,
    #[serde(default)]
    yanked: bool,
}

/// One distributed file of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub kind: DistributionKind,
    pub python_version: DeclaredPythonVersion,
    /// Released interpreters admitted by `requires_python`, when one was given
    pub requires_python: Option<BTreeSet<PythonVersion>>,
    pub yanked: bool,
}

impl Artifact {
    fn from_release_file(file: PypiReleaseFile) -> Result<Self> {
        let kind = file.packagetype.parse::<DistributionKind>()?;
        let python_version = file.python_version.parse::<DeclaredPythonVersion>()?;

        let requires_python = match file.requires_python.as_deref().map(str::trim) {
            Some(expr) if !expr.is_empty() => Some(compatible_python_versions(expr)?),
            _ => None,
        };

        Ok(Self {
            filename: file.filename,
            kind,
            python_version,
            requires_python,
            yanked: file.yanked,
        })
    }
}

/// All files published under one version, in index order.
#[derive(Debug, Clone)]
pub struct Release {
    pub version: Version,
    pub artifacts: Vec<Artifact>,
}

/// One package's releases in ascending version order.
///
/// Built once from a metadata document and read-only afterwards.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::{ArtifactErrorPolicy, PackageCatalog};
///
/// let json = r#"{
///     "info": {"classifiers": ["Programming Language :: Python :: 3.8"]},
///     "releases": {
///         "1.1": [],
///         "1.0": [],
///         "2013a": []
///     }
/// }"#;
///
/// let catalog = PackageCatalog::from_json("demo", json.as_bytes(), ArtifactErrorPolicy::Skip).unwrap();
/// let versions: Vec<String> = catalog.releases().map(|r| r.version.to_string()).collect();
/// assert_eq!(versions, vec!["1.0", "1.1"]);
/// ```
#[derive(Debug, Clone)]
pub struct PackageCatalog {
    name: String,
    classifier_versions: BTreeSet<PythonVersion>,
    releases: BTreeMap<Version, Release>,
}

impl PackageCatalog {
    /// Parses a PyPI JSON document.
    ///
    /// Legacy malformed release keys are dropped silently. Other release keys
    /// that are not PEP 440 versions, and files whose metadata does not parse,
    /// are dropped with a warning under [`ArtifactErrorPolicy::Skip`] and fail
    /// ingestion under [`ArtifactErrorPolicy::Abort`].
    ///
    /// # Errors
    ///
    /// Returns `PypiError::ApiResponseError` if the document is not valid JSON
    /// of the expected shape.
    pub fn from_json(name: &str, data: &[u8], policy: ArtifactErrorPolicy) -> Result<Self> {
        let response: PypiResponse =
            serde_json::from_slice(data).map_err(|e| PypiError::api_response_error(name, e))?;

        let classifier_versions = response
            .info
            .classifiers
            .unwrap_or_default()
            .iter()
            .filter_map(|c| PYTHON_CLASSIFIER_REGEX.captures(c))
            .filter_map(|caps| parse_version(&caps["version"]).ok())
            .collect();

        // Equivalent keys ("1.0", "1.0.0") merge under the first key in sorted order
        let mut entries: Vec<(String, Vec<PypiReleaseFile>)> =
            response.releases.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut releases: BTreeMap<Version, Release> = BTreeMap::new();

        for (key, files) in entries {
            if is_legacy_malformed_version(&key) {
                tracing::debug!("{}: ignoring legacy release key {}", name, key);
                continue;
            }

            let version = match Version::from_str(&key) {
                Ok(version) => version,
                Err(e) => {
                    let err = PypiError::malformed_version(&key, e.to_string());
                    match policy {
                        ArtifactErrorPolicy::Skip => {
                            tracing::warn!("{}: skipping release: {}", name, err);
                            continue;
                        }
                        ArtifactErrorPolicy::Abort => return Err(err),
                    }
                }
            };

            let mut artifacts = Vec::with_capacity(files.len());
            for file in files {
                let filename = file.filename.clone();
                match Artifact::from_release_file(file) {
                    Ok(artifact) => artifacts.push(artifact),
                    Err(e) if policy == ArtifactErrorPolicy::Skip && e.is_artifact_error() => {
                        tracing::warn!("{} {}: skipping {}: {}", name, key, filename, e);
                    }
                    Err(e) => return Err(e),
                }
            }

            releases
                .entry(version.clone())
                .or_insert_with(|| Release {
                    version,
                    artifacts: Vec::new(),
                })
                .artifacts
                .extend(artifacts);
        }

        Ok(Self {
            name: name.to_string(),
            classifier_versions,
            releases,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All releases, oldest first.
    pub fn releases(&self) -> impl Iterator<Item = &Release> {
        self.releases.values()
    }

    /// Releases at or above `floor`, oldest first.
    pub fn releases_from<'a>(&'a self, floor: &'a Version) -> impl Iterator<Item = &'a Release> {
        self.releases.range::<Version, _>(floor..).map(|(_, release)| release)
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Interpreter versions named by `Programming Language :: Python :: X.Y` classifiers.
    pub fn classifier_versions(&self) -> &BTreeSet<PythonVersion> {
        &self.classifier_versions
    }

    /// Returns `true` if the package's classifiers list `version`.
    pub fn declares_support(&self, version: PythonVersion) -> bool {
        self.classifier_versions.contains(&version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(filename: &str, packagetype: &str, python_version: &str) -> serde_json::Value {
        serde_json::json!({
            "filename": filename,
            "packagetype": packagetype,
            "python_version": python_version,
            "requires_python": null,
            "yanked": false
        })
    }

    fn document(releases: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "info": {
                "classifiers": [
                    "Programming Language :: Python :: 3",
                    "Programming Language :: Python :: 3.8",
                    "Programming Language :: Python :: 3.10",
                    "License :: OSI Approved :: MIT License"
                ]
            },
            "releases": releases
        }))
        .unwrap()
    }

    #[test]
    fn test_releases_sorted_ascending() {
        let data = document(serde_json::json!({
            "1.10": [],
            "1.2": [],
            "1.9.1": [],
            "0.9": []
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
        let versions: Vec<String> = catalog.releases().map(|r| r.version.to_string()).collect();

        assert_eq!(versions, vec!["0.9", "1.2", "1.9.1", "1.10"]);
    }

    #[test]
    fn test_legacy_keys_dropped() {
        let data = document(serde_json::json!({
            "2.0.0-final": [file("pkg-2.0.0-final.tar.gz", "sdist", "source")],
            "2013a": [],
            "2019z": [],
            "2023.3": []
        }));

        for policy in [ArtifactErrorPolicy::Skip, ArtifactErrorPolicy::Abort] {
            let catalog = PackageCatalog::from_json("pytz", &data, policy).unwrap();
            let versions: Vec<String> =
                catalog.releases().map(|r| r.version.to_string()).collect();
            assert_eq!(versions, vec!["2023.3"]);
        }
    }

    #[test]
    fn test_invalid_release_key_policy() {
        let data = document(serde_json::json!({
            "1.0": [],
            "not-a-version!": []
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
        assert_eq!(catalog.len(), 1);

        let result = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Abort);
        assert!(matches!(result, Err(PypiError::MalformedVersion { .. })));
    }

    #[test]
    fn test_artifacts_parsed() {
        let data = document(serde_json::json!({
            "1.0": [
                {
                    "filename": "pkg-1.0-cp38-abi3-win_amd64.whl",
                    "packagetype": "bdist_wheel",
                    "python_version": "cp38",
                    "requires_python": ">=3.8",
                    "yanked": true
                },
                file("pkg-1.0.tar.gz", "sdist", "source")
            ]
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
        let release = catalog.releases().next().unwrap();

        assert_eq!(release.artifacts.len(), 2);
        let wheel = &release.artifacts[0];
        assert_eq!(wheel.kind, DistributionKind::Wheel);
        assert!(wheel.yanked);
        assert!(
            wheel
                .requires_python
                .as_ref()
                .unwrap()
                .contains(&PythonVersion::new(3, 12))
        );
        assert_eq!(release.artifacts[1].kind, DistributionKind::Source);
        assert_eq!(release.artifacts[1].requires_python, None);
    }

    #[test]
    fn test_empty_requires_python_is_absent() {
        let data = document(serde_json::json!({
            "1.0": [{
                "filename": "pkg-1.0-py3-none-any.whl",
                "packagetype": "bdist_wheel",
                "python_version": "py3",
                "requires_python": "",
                "yanked": false
            }]
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Abort).unwrap();
        let release = catalog.releases().next().unwrap();
        assert_eq!(release.artifacts[0].requires_python, None);
    }

    #[test]
    fn test_malformed_artifact_policy() {
        let data = document(serde_json::json!({
            "1.0": [
                file("pkg-1.0-py35-none-any.whl", "bdist_wheel", "py35"),
                file("pkg-1.0-py3-none-any.whl", "bdist_wheel", "py3"),
                file("pkg-1.0.noarch.rpm", "bdist_rpm", "source")
            ]
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
        let release = catalog.releases().next().unwrap();
        assert_eq!(release.artifacts.len(), 1);
        assert_eq!(release.artifacts[0].filename, "pkg-1.0-py3-none-any.whl");

        assert!(PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Abort).is_err());
    }

    #[test]
    fn test_equivalent_keys_merged() {
        let data = document(serde_json::json!({
            "1.0": [file("pkg-1.0-py3-none-any.whl", "bdist_wheel", "py3")],
            "1.0.0": [file("pkg-1.0.0.tar.gz", "sdist", "source")]
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.releases().next().unwrap().artifacts.len(), 2);
    }

    #[test]
    fn test_equivalent_keys_merge_deterministically() {
        let data = document(serde_json::json!({
            "1.0.0": [file("pkg-1.0.0-py3-none-any.whl", "bdist_wheel", "py3")],
            "1.0": [file("pkg-1.0-py3-none-any.whl", "bdist_wheel", "py3")]
        }));

        for _ in 0..100 {
            let catalog =
                PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
            let release = catalog.releases().next().unwrap();
            let filenames: Vec<&str> =
                release.artifacts.iter().map(|a| a.filename.as_str()).collect();

            assert_eq!(release.version.to_string(), "1.0");
            assert_eq!(
                filenames,
                vec!["pkg-1.0-py3-none-any.whl", "pkg-1.0.0-py3-none-any.whl"]
            );
        }
    }

    #[test]
    fn test_releases_from_floor() {
        let data = document(serde_json::json!({
            "1.0": [],
            "1.1": [],
            "2.0": []
        }));

        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();
        let floor = Version::from_str("1.1").unwrap();
        let versions: Vec<String> = catalog
            .releases_from(&floor)
            .map(|r| r.version.to_string())
            .collect();

        assert_eq!(versions, vec!["1.1", "2.0"]);
    }

    #[test]
    fn test_classifiers() {
        let data = document(serde_json::json!({}));
        let catalog = PackageCatalog::from_json("pkg", &data, ArtifactErrorPolicy::Skip).unwrap();

        assert!(catalog.is_empty());
        assert!(catalog.declares_support(PythonVersion::new(3, 8)));
        assert!(catalog.declares_support(PythonVersion::new(3, 10)));
        assert!(!catalog.declares_support(PythonVersion::new(3, 9)));
        assert_eq!(catalog.classifier_versions().len(), 2);
    }

    #[test]
    fn test_invalid_json() {
        let result = PackageCatalog::from_json("pkg", b"{\"info\": {}}", ArtifactErrorPolicy::Skip);
        assert!(matches!(result, Err(PypiError::ApiResponseError { .. })));
    }
}
