use std::path::PathBuf;
use thiserror::Error;
use wheelpin_core::CoreError;
use wheelpin_pypi::PypiError;

/// Errors surfaced by the `wheelpin` binary.
///
/// Per-line resolution failures are not errors at this level; they are
/// collected into the batch report and summarized as [`AppError::BatchFailed`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Pypi(#[from] PypiError),

    #[error("{failed} of {total} requirements could not be resolved")]
    BatchFailed { failed: usize, total: usize },
}

impl AppError {
    /// Process exit code for this error.
    ///
    /// Unresolvable requirements exit with 1, everything else with 2.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::BatchFailed { .. } => 1,
            _ => 2,
        }
    }
}

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;
