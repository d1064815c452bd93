//! wheelpin: upgrade pinned Python requirements to the lowest release that
//! ships a compatible wheel for a chosen interpreter and platform.
//!
//! The binary is a thin shell over [`execute`]; everything it does is
//! reachable from here for tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod inspect;
pub mod upgrade;

pub use cli::{Cli, Command};
pub use config::{UpgradeConfig, Verbosity};
pub use error::{AppError, Result};
pub use upgrade::{BatchReport, LineOutcome, run_upgrade};

use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wheelpin_core::HttpCache;
use wheelpin_pypi::PypiRegistry;

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins over `verbosity` when set. Calling this twice is harmless.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Builds the PyPI client described by `config`.
///
/// # Errors
///
/// Returns `AppError::Core` if the HTTP client cannot be constructed.
pub fn build_index(config: &UpgradeConfig) -> Result<PypiRegistry> {
    let cache = HttpCache::with_options(config.cache_options())?;
    Ok(PypiRegistry::with_base_url(
        Arc::new(cache),
        config.index.url.clone(),
    ))
}

/// Runs `command` against the configured index, writing results to stdout.
///
/// # Errors
///
/// Returns `AppError::BatchFailed` when any requirement could not be
/// resolved, after all output has been written.
pub async fn execute(command: &Command, config: &UpgradeConfig) -> Result<()> {
    let path = &command.args().requirements;
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ReadFile {
        path: path.clone(),
        source,
    })?;

    let index = build_index(config)?;
    let mut out = std::io::stdout();

    match command {
        Command::Upgrade(_) => {
            let report = run_upgrade(&index, &content, config, &mut out).await?;
            if report.is_success() {
                return Ok(());
            }

            let mut stderr = std::io::stderr().lock();
            writeln!(stderr, "Could not upgrade:")?;
            for (line, error) in report.failures() {
                writeln!(stderr, "  {}: {}", line, error)?;
            }
            if report.stopped_early {
                writeln!(stderr, "Stopped at the first failure (--fail-fast)")?;
            }

            Err(AppError::BatchFailed {
                failed: report.failure_count(),
                total: report.requirement_count(),
            })
        }
        Command::Inspect(_) => {
            let report = inspect::run_inspect(&index, &content, config, &mut out).await?;
            if report.failures == 0 {
                Ok(())
            } else {
                Err(AppError::BatchFailed {
                    failed: report.failures,
                    total: report.requirements,
                })
            }
        }
    }
}
