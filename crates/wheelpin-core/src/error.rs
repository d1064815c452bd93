use thiserror::Error;

/// Core error types for wheelpin.
///
/// Covers transport and cache failures that are independent of the package
/// ecosystem. Ecosystem crates wrap these in their own error enums.
///
/// # Examples
///
/// ```
/// use wheelpin_core::error::{CoreError, Result};
///
/// fn require_https(url: &str) -> Result<()> {
///     if !url.starts_with("https://") {
///         return Err(CoreError::InsecureUrl(url.into()));
///     }
///     Ok(())
/// }
///
/// assert!(require_https("http://pypi.org").is_err());
/// ```
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("registry request failed for {url}: {source}")]
    RegistryError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("URL must use HTTPS: {0}")]
    InsecureUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns `true` for failures worth retrying: transport errors and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RegistryError { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Convenience type alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;
