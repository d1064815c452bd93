//! Per-artifact compatibility report for each pinned requirement.

use crate::config::UpgradeConfig;
use crate::error::Result;
use std::io::Write;
use wheelpin_core::PackageIndex;
use wheelpin_pypi::{RequirementLine, RequirementsFile, Verdict, evaluate, fetch_catalog};

/// Counts from one inspect run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectReport {
    /// Non-comment, non-blank lines seen
    pub requirements: usize,
    /// Invalid lines and packages whose catalog could not be fetched
    pub failures: usize,
}

/// Writes, for every pin in `content`, each release at or above the pin with
/// the verdict for each of its artifacts.
///
/// Comments and blank lines are skipped.
///
/// # Errors
///
/// Only write failures on `out` are errors.
pub async fn run_inspect<W: Write>(
    index: &dyn PackageIndex,
    content: &str,
    config: &UpgradeConfig,
    out: &mut W,
) -> Result<InspectReport> {
    let target = config.compatibility_target();
    let policy = config.policy.artifact_errors;
    let mut report = InspectReport::default();

    for line in RequirementsFile::parse(content).into_lines() {
        let pin = match line {
            RequirementLine::Comment(_) | RequirementLine::Blank => continue,
            RequirementLine::Pin(pin) => {
                report.requirements += 1;
                pin
            }
            RequirementLine::Invalid { raw, error } => {
                report.requirements += 1;
                report.failures += 1;
                writeln!(out, "{}: {}", raw, error)?;
                continue;
            }
        };

        writeln!(out, "{} >= {} on {}", pin.name, pin.version, target)?;

        let catalog = match fetch_catalog(index, &pin.name, policy).await {
            Ok(catalog) => catalog,
            Err(e) => {
                writeln!(out, "  error: {}", e)?;
                report.failures += 1;
                continue;
            }
        };

        let mut listed = 0;
        for release in catalog.releases_from(&pin.version) {
            listed += 1;
            writeln!(out, "  {}", release.version)?;
            if release.artifacts.is_empty() {
                writeln!(out, "    (no files)")?;
            }
            for artifact in &release.artifacts {
                let verdict = match evaluate(artifact, &target) {
                    Ok(Verdict::Compatible) => "compatible".to_string(),
                    Ok(Verdict::Incompatible(reason)) => format!("incompatible ({})", reason),
                    Err(e) => format!("error: {}", e),
                };
                writeln!(out, "    {}: {}", artifact.filename, verdict)?;
            }
        }

        if listed == 0 {
            writeln!(out, "  (no releases at or above {})", pin.version)?;
        }
    }

    out.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrade::tests::demo_index;

    #[tokio::test]
    async fn test_inspect_report() {
        let mut out = Vec::new();
        let summary = run_inspect(
            &demo_index(),
            "# header\ndemo==1.0\n",
            &UpgradeConfig::default(),
            &mut out,
        )
        .await
        .unwrap();

        let report = String::from_utf8(out).unwrap();
        assert_eq!(summary, InspectReport { requirements: 1, failures: 0 });
        assert_eq!(
            report,
            "demo >= 1.0 on cp3.8 linux-x86_64\n  \
             1.0\n    demo-1.0-cp37-cp37m-manylinux1_x86_64.whl: incompatible (python version excluded)\n  \
             1.1\n    demo-1.1-cp38-cp38-manylinux1_x86_64.whl: compatible\n"
        );
    }

    #[tokio::test]
    async fn test_inspect_failures_counted() {
        let mut out = Vec::new();
        let summary = run_inspect(
            &demo_index(),
            "missing==1.0\nbad line\npure==3.0\n",
            &UpgradeConfig::default(),
            &mut out,
        )
        .await
        .unwrap();

        let report = String::from_utf8(out).unwrap();
        assert_eq!(summary.requirements, 3);
        assert_eq!(summary.failures, 2);
        assert!(report.contains("missing >= 1.0 on cp3.8 linux-x86_64\n  error: Package 'missing' not found"));
        assert!(report.contains("bad line: Malformed requirement line"));
        assert!(report.contains("(no releases at or above 3.0)"));
    }
}
