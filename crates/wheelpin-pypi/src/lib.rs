//! Wheel compatibility resolution for wheelpin.
//!
//! Given a package's PyPI JSON metadata and a [`CompatibilityTarget`]
//! (interpreter family, interpreter version, operating system), this crate
//! decides which distributed files can be installed on the target and picks
//! the lowest qualifying release at or above a floor version.
//!
//! # Pipeline
//!
//! 1. [`PypiRegistry`] fetches the metadata document through the shared
//!    [`wheelpin_core::HttpCache`]
//! 2. [`PackageCatalog::from_json`] ingests it, dropping legacy malformed
//!    release keys and parsing each file's declared interpreter support
//! 3. [`select_release`] walks releases in ascending order and asks
//!    [`evaluate`] about each file in listed order
//!
//! # Examples
//!
//! ```
//! use std::str::FromStr;
//! use pep440_rs::Version;
//! use wheelpin_pypi::{
//!     ArtifactErrorPolicy, CompatibilityTarget, OperatingSystem, PackageCatalog, PythonFamily,
//!     PythonVersion, SelectOptions, select_release,
//! };
//!
//! let json = r#"{"info": {}, "releases": {
//!     "2.0": [{"filename": "demo-2.0-cp310-cp310-win_amd64.whl", "packagetype": "bdist_wheel",
//!              "python_version": "cp310", "requires_python": ">=3.8"}]
//! }}"#;
//! let catalog = PackageCatalog::from_json("demo", json.as_bytes(), ArtifactErrorPolicy::Skip).unwrap();
//! let target = CompatibilityTarget::new(
//!     PythonFamily::CPython,
//!     PythonVersion::new(3, 10),
//!     OperatingSystem::WindowsX64,
//! );
//!
//! let floor = Version::from_str("1.0").unwrap();
//! let selection = select_release(&catalog, &floor, &target, SelectOptions::default()).unwrap();
//! assert_eq!(selection.filename, "demo-2.0-cp310-cp310-win_amd64.whl");
//! ```

pub mod catalog;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod requirements;
pub mod requires;
pub mod selector;
pub mod tags;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use catalog::{Artifact, PackageCatalog, Release};
pub use error::{PypiError, Result};
pub use matcher::{Rejection, Verdict, evaluate, is_compatible};
pub use registry::{PypiRegistry, fetch_catalog, normalize_package_name};
pub use requirements::{PinnedRequirement, RequirementLine, RequirementsFile, parse_pin};
pub use requires::{compatible_python_versions, compatible_python_versions_in};
pub use selector::{
    ArtifactErrorPolicy, SelectOptions, Selection, find_compatible_artifact, select_release,
};
pub use tags::{PythonFamily, WheelTags, parse_distribution_tag};
pub use types::{CompatibilityTarget, DeclaredPythonVersion, DistributionKind, OperatingSystem};
pub use version::{PythonVersion, RELEASED_PYTHON_VERSIONS, parse_version, released_python_versions};
