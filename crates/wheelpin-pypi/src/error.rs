//! Errors specific to wheel compatibility resolution.

use thiserror::Error;

/// Errors that can occur while resolving a compatible release.
#[derive(Error, Debug)]
pub enum PypiError {
    /// A version string (release key, pin, or interpreter version) could not be parsed
    #[error("Malformed version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    /// A python tag or declared python version does not match the tag grammar
    #[error("Malformed tag '{tag}'")]
    MalformedTag { tag: String },

    /// A wheel filename does not follow `{dist}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
    #[error("Malformed wheel filename '{filename}'")]
    MalformedFilename { filename: String },

    /// A wheel carries a compressed ABI tag set; only a single ABI tag is supported
    #[error("Wheel '{filename}' declares {} ABI tags, expected one", tags.len())]
    MultipleAbiTags { filename: String, tags: Vec<String> },

    /// `packagetype` is not one of the known distribution kinds
    #[error("Unknown distribution kind '{0}'")]
    UnknownDistributionKind(String),

    /// The target interpreter family has no ABI compatibility rule
    #[error("ABI matching is not supported for {family}")]
    UnsupportedFamily { family: String },

    /// A `requires_python` clause matches none of the supported shapes
    #[error("Malformed requirement '{clause}' in '{expression}'")]
    MalformedRequirement { expression: String, clause: String },

    /// A requirements file line is neither a comment nor `package==version`
    #[error("Malformed requirement line '{line}': {reason}")]
    MalformedRequirementLine { line: String, reason: String },

    /// No release at or above the floor ships an artifact for the target
    #[error("No compatible release for {package} >= {floor} on {target}")]
    NoCompatibleRelease {
        package: String,
        floor: String,
        target: String,
    },

    /// Package not found in the index
    #[error("Package '{package}' not found")]
    PackageNotFound { package: String },

    /// Index request failed
    #[error("Registry request failed for '{package}': {source}")]
    RegistryError {
        package: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to deserialize the PyPI JSON document
    #[error("Failed to parse PyPI API response for '{package}': {source}")]
    ApiResponseError {
        package: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, PypiError>;

impl PypiError {
    /// Helper for creating registry errors
    pub fn registry_error(
        package: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RegistryError {
            package: package.into(),
            source: Box::new(error),
        }
    }

    /// Helper for creating API response errors
    pub fn api_response_error(package: impl Into<String>, error: serde_json::Error) -> Self {
        Self::ApiResponseError {
            package: package.into(),
            source: error,
        }
    }

    /// Helper for creating malformed version errors
    pub fn malformed_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Helper for creating malformed tag errors
    pub fn malformed_tag(tag: impl Into<String>) -> Self {
        Self::MalformedTag { tag: tag.into() }
    }

    /// Helper for creating malformed requirement errors
    pub fn malformed_requirement(expression: impl Into<String>, clause: impl Into<String>) -> Self {
        Self::MalformedRequirement {
            expression: expression.into(),
            clause: clause.into(),
        }
    }

    /// Returns `true` when the error concerns the metadata of a single artifact.
    ///
    /// These are the errors an artifact error policy may choose to skip over.
    /// Everything else ends the resolution of the whole package.
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedTag { .. }
                | Self::MalformedFilename { .. }
                | Self::MultipleAbiTags { .. }
                | Self::UnknownDistributionKind(_)
                | Self::MalformedRequirement { .. }
        )
    }
}
