//! The upgrade batch: one requirements file in, one requirements file out.

use crate::config::UpgradeConfig;
use crate::error::Result;
use pep440_rs::Version;
use std::io::Write;
use wheelpin_core::PackageIndex;
use wheelpin_pypi::{
    CompatibilityTarget, PinnedRequirement, PypiError, RequirementLine, RequirementsFile,
    SelectOptions, Selection, fetch_catalog, select_release,
};

/// Result of processing one requirements line.
#[derive(Debug)]
pub enum LineOutcome {
    Comment(String),
    Blank,
    Upgraded {
        name: String,
        from: Version,
        to: Version,
        artifact: String,
    },
    Failed {
        line: String,
        error: PypiError,
    },
}

impl LineOutcome {
    /// The line written to the upgraded requirements file.
    ///
    /// Failed lines are echoed unchanged so the output stays installable.
    pub fn render(&self) -> String {
        match self {
            Self::Comment(line) => line.clone(),
            Self::Blank => String::new(),
            Self::Upgraded { name, from, to, .. } => {
                format!("{}=={}  # Upgraded from {}", name, to, from)
            }
            Self::Failed { line, .. } => line.clone(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Everything a batch produced, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<LineOutcome>,
    /// Set when `fail_fast` ended the batch before the last line
    pub stopped_early: bool,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &PypiError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            LineOutcome::Failed { line, error } => Some((line.as_str(), error)),
            _ => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Number of lines that named a requirement, resolved or not.
    pub fn requirement_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, LineOutcome::Upgraded { .. } | LineOutcome::Failed { .. }))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Fetches the catalog for one pin and selects its upgrade.
///
/// # Errors
///
/// Returns the fetch, ingestion, or selection error for this package.
pub async fn resolve_pin(
    index: &dyn PackageIndex,
    pin: &PinnedRequirement,
    target: &CompatibilityTarget,
    options: SelectOptions,
) -> std::result::Result<Selection, PypiError> {
    let catalog = fetch_catalog(index, &pin.name, options.artifact_errors).await?;
    tracing::debug!("{}: {} releases", pin.name, catalog.len());

    if !catalog.classifier_versions().is_empty() && !catalog.declares_support(target.version) {
        tracing::debug!(
            "{}: classifiers do not list Python {}",
            pin.name,
            target.version
        );
    }

    select_release(&catalog, &pin.version, target, options)
}

/// Runs the upgrade batch over `content`, writing each output line to `out`
/// as soon as it is known.
///
/// Lines are processed strictly in order. Unresolvable requirements are
/// recorded in the report; with `policy.fail_fast` the batch stops at the
/// first one and its line is not written.
///
/// # Errors
///
/// Only write failures on `out` are errors; resolution failures are part of
/// the returned report.
pub async fn run_upgrade<W: Write>(
    index: &dyn PackageIndex,
    content: &str,
    config: &UpgradeConfig,
    out: &mut W,
) -> Result<BatchReport> {
    let target = config.compatibility_target();
    let options = config.select_options();
    let mut report = BatchReport::default();

    tracing::info!("resolving for {}", target);

    for line in RequirementsFile::parse(content).into_lines() {
        let outcome = match line {
            RequirementLine::Comment(text) => LineOutcome::Comment(text),
            RequirementLine::Blank => LineOutcome::Blank,
            RequirementLine::Invalid { raw, error } => {
                tracing::warn!("{}", error);
                LineOutcome::Failed { line: raw, error }
            }
            RequirementLine::Pin(pin) => match resolve_pin(index, &pin, &target, options).await {
                Ok(selection) => {
                    if selection.version == pin.version {
                        tracing::info!("{}: {} is already compatible", pin.name, pin.version);
                    } else {
                        tracing::info!("{}: {} -> {}", pin.name, pin.version, selection.version);
                    }
                    LineOutcome::Upgraded {
                        name: pin.name,
                        from: pin.version,
                        to: selection.version,
                        artifact: selection.filename,
                    }
                }
                Err(error) => {
                    tracing::warn!("{}", error);
                    LineOutcome::Failed {
                        line: pin.raw,
                        error,
                    }
                }
            },
        };

        if outcome.is_failed() && config.policy.fail_fast {
            report.outcomes.push(outcome);
            report.stopped_early = true;
            break;
        }

        writeln!(out, "{}", outcome.render())?;
        report.outcomes.push(outcome);
    }

    out.flush()?;
    Ok(report)
}
