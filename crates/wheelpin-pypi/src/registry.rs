//! PyPI JSON API client.
//!
//! Fetches `https://pypi.org/pypi/{package}/json` through the shared
//! [`HttpCache`] and turns the document into a [`PackageCatalog`].

use crate::catalog::PackageCatalog;
use crate::error::{PypiError, Result};
use crate::selector::ArtifactErrorPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use wheelpin_core::{CoreError, HttpCache, PackageIndex};

/// Default JSON API root.
pub const PYPI_BASE: &str = "https://pypi.org/pypi";

/// Normalize package name according to PEP 503.
///
/// Lowercases the name and collapses runs of `-`, `_` and `.` into a single
/// hyphen.
///
/// # Examples
///
/// ```
/// # use wheelpin_pypi::registry::normalize_package_name;
/// assert_eq!(normalize_package_name("Flask"), "flask");
/// assert_eq!(normalize_package_name("django_rest_framework"), "django-rest-framework");
/// assert_eq!(normalize_package_name("zope.interface"), "zope-interface");
/// assert_eq!(normalize_package_name("my__package"), "my-package");
/// ```
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase()
        .replace(&['_', '.'][..], "-")
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Builds the JSON document URL for `name` under `base_url`.
///
/// Package names are normalized and URL-encoded to prevent path traversal.
pub fn package_json_url(base_url: &str, name: &str) -> String {
    let normalized = normalize_package_name(name);
    format!(
        "{}/{}/json",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&normalized)
    )
}

/// Network-backed [`PackageIndex`] for PyPI and PyPI-compatible mirrors.
///
/// # Examples
///
/// ```no_run
/// # use wheelpin_pypi::PypiRegistry;
/// # use wheelpin_core::{HttpCache, PackageIndex};
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() {
/// let cache = Arc::new(HttpCache::new().unwrap());
/// let registry = PypiRegistry::new(cache);
///
/// let document = registry.package_json("requests").await.unwrap();
/// assert!(!document.is_empty());
/// # }
/// ```
#[derive(Clone)]
pub struct PypiRegistry {
    cache: Arc<HttpCache>,
    base_url: String,
}

impl PypiRegistry {
    /// Creates a client for pypi.org.
    pub fn new(cache: Arc<HttpCache>) -> Self {
        Self::with_base_url(cache, PYPI_BASE)
    }

    /// Creates a client for a mirror serving the same JSON API.
    pub fn with_base_url(cache: Arc<HttpCache>, base_url: impl Into<String>) -> Self {
        Self {
            cache,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PackageIndex for PypiRegistry {
    async fn package_json(&self, name: &str) -> wheelpin_core::Result<Arc<Vec<u8>>> {
        let url = package_json_url(&self.base_url, name);
        self.cache.get_cached(&url).await
    }
}

/// Fetches and ingests the catalog for `name` from any index.
///
/// # Errors
///
/// - `PypiError::PackageNotFound` if the index has no such package
/// - `PypiError::RegistryError` for transport failures
/// - ingestion errors from [`PackageCatalog::from_json`]
pub async fn fetch_catalog(
    index: &dyn PackageIndex,
    name: &str,
    policy: ArtifactErrorPolicy,
) -> Result<PackageCatalog> {
    let document = index.package_json(name).await.map_err(|e| match e {
        CoreError::NotFound { .. } => PypiError::PackageNotFound {
            package: name.to_string(),
        },
        other => PypiError::registry_error(name, other),
    })?;

    PackageCatalog::from_json(name, &document, policy)
}
