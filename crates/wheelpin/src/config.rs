use crate::error::{AppError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use wheelpin_core::CacheOptions;
use wheelpin_pypi::registry::PYPI_BASE;
use wheelpin_pypi::{
    ArtifactErrorPolicy, CompatibilityTarget, OperatingSystem, PythonFamily, PythonVersion,
    SelectOptions,
};

/// Root configuration for an upgrade or inspect run.
///
/// Read from a JSON file with `--config`; command-line flags override the
/// file. Every field has a default, so `{}` is a valid config.
///
/// # Examples
///
/// ```
/// use wheelpin::config::UpgradeConfig;
/// use wheelpin_pypi::{OperatingSystem, PythonVersion};
///
/// let json = r#"{
///     "target": { "os": "windows_64", "python_version": "3.11" },
///     "policy": { "artifact_errors": "abort" }
/// }"#;
///
/// let config = UpgradeConfig::from_json_str(json).unwrap();
/// assert_eq!(config.target.os, OperatingSystem::WindowsX64);
/// assert_eq!(config.target.python_version, PythonVersion::new(3, 11));
/// assert_eq!(config.index.retries, 2);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpgradeConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub verbosity: Verbosity,
}

/// The interpreter and platform upgrades must install on.
///
/// # Defaults
///
/// - `os`: `linux-x86_64`
/// - `python_version`: `3.8`
/// - `python_family`: `cp`
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_os")]
    pub os: OperatingSystem,
    #[serde(default = "default_python_version")]
    pub python_version: PythonVersion,
    #[serde(default = "default_python_family")]
    pub python_family: PythonFamily,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            os: default_os(),
            python_version: default_python_version(),
            python_family: default_python_family(),
        }
    }
}

/// Package index transport settings.
///
/// # Defaults
///
/// - `url`: `https://pypi.org/pypi`
/// - `timeout_secs`: `30`
/// - `retries`: `2`
/// - `retry_backoff_ms`: `500`
/// - `require_https`: `true`
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_true")]
    pub require_https: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            require_https: true,
        }
    }
}

/// How failures are handled.
///
/// # Defaults
///
/// - `artifact_errors`: `skip`
/// - `fail_fast`: `false`
/// - `include_prereleases`: `true`
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub artifact_errors: ArtifactErrorPolicy,
    /// Stop the batch at the first requirement that cannot be resolved
    #[serde(default)]
    pub fail_fast: bool,
    /// When `false`, pre-releases are skipped unless the pin is itself one
    #[serde(default = "default_true")]
    pub include_prereleases: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            artifact_errors: ArtifactErrorPolicy::default(),
            fail_fast: false,
            include_prereleases: true,
        }
    }
}

/// Diagnostic verbosity on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    /// `tracing_subscriber::EnvFilter` directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Trace => "trace",
        }
    }
}

fn default_os() -> OperatingSystem {
    OperatingSystem::LinuxX86_64
}

fn default_python_version() -> PythonVersion {
    PythonVersion::new(3, 8)
}

fn default_python_family() -> PythonFamily {
    PythonFamily::CPython
}

fn default_index_url() -> String {
    PYPI_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl UpgradeConfig {
    /// Parses a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for malformed JSON or invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Loads a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ReadFile` if the file cannot be read, or
    /// `AppError::ConfigParse` if it is not a valid config document.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the python version is not a released
    /// interpreter or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if !self.target.python_version.is_released() {
            return Err(AppError::Config(format!(
                "python version {} is not a released interpreter",
                self.target.python_version
            )));
        }

        if self.index.timeout_secs == 0 {
            return Err(AppError::Config("index.timeout_secs must be positive".into()));
        }

        Ok(())
    }

    pub fn compatibility_target(&self) -> CompatibilityTarget {
        CompatibilityTarget::new(
            self.target.python_family,
            self.target.python_version,
            self.target.os,
        )
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            timeout: Duration::from_secs(self.index.timeout_secs),
            retries: self.index.retries,
            retry_backoff: Duration::from_millis(self.index.retry_backoff_ms),
            require_https: self.index.require_https,
            ..CacheOptions::default()
        }
    }

    pub fn select_options(&self) -> SelectOptions {
        SelectOptions {
            artifact_errors: self.policy.artifact_errors,
            include_prereleases: self.policy.include_prereleases,
        }
    }
}
