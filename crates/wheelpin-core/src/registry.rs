use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of raw per-package metadata documents.
///
/// Implementors fetch the JSON document describing every release of one
/// package. The upgrade pipeline only depends on this trait, so tests can
/// substitute an in-memory index for the network-backed one.
///
/// # Examples
///
/// ```
/// use wheelpin_core::{CoreError, PackageIndex};
/// use async_trait::async_trait;
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// struct StaticIndex {
///     documents: HashMap<String, Arc<Vec<u8>>>,
/// }
///
/// #[async_trait]
/// impl PackageIndex for StaticIndex {
///     async fn package_json(&self, name: &str) -> wheelpin_core::Result<Arc<Vec<u8>>> {
///         self.documents
///             .get(name)
///             .cloned()
///             .ok_or_else(|| CoreError::NotFound { url: name.into() })
///     }
/// }
/// ```
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Fetches the metadata document for `name`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the package does not exist, or a
    /// transport error if the index cannot be reached.
    async fn package_json(&self, name: &str) -> Result<Arc<Vec<u8>>>;
}
