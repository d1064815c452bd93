//! Evaluation of `requires_python` expressions against released interpreters.
//!
//! The grammar is deliberately narrow. Each comma-separated clause is one of:
//!
//! - `<4`, a no-op kept for historical "not Python 4" markers
//! - `>=X.Y`, `>X.Y`, `<=X.Y`, `<X.Y`, `!=X.Y`, optionally followed by `.0`, `.*` or `*`
//! - `>=X.Y.Z`, read as `>=X.(Y+1)` since only minor lines are tracked
//!
//! Anything else is rejected rather than guessed at.

use crate::error::{PypiError, Result};
use crate::version::{PythonVersion, released_python_versions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static CLAUSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<op>>=|!=|>|<=|<)(?P<major>\d)\.(?P<minor>\d+)(?:\.0|\.\*|\*)?$")
        .expect("valid regex")
});

static PATCH_CLAUSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^>=(?P<major>\d)\.(?P<minor>\d+)\.\d+$").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    NotEqual,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            ">=" => Some(Self::GreaterEqual),
            ">" => Some(Self::Greater),
            "<=" => Some(Self::LessEqual),
            "<" => Some(Self::Less),
            "!=" => Some(Self::NotEqual),
            _ => None,
        }
    }

    fn admits(self, candidate: PythonVersion, bound: PythonVersion) -> bool {
        match self {
            Self::GreaterEqual => candidate >= bound,
            Self::Greater => candidate > bound,
            Self::LessEqual => candidate <= bound,
            Self::Less => candidate < bound,
            Self::NotEqual => candidate != bound,
        }
    }
}

/// One parsed clause; at most one shape ever matches a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    NotPython4,
    Compare(Operator, PythonVersion),
}

impl Clause {
    fn parse(expression: &str, part: &str) -> Result<Self> {
        let malformed = || PypiError::malformed_requirement(expression, part);

        if part == "<4" {
            return Ok(Self::NotPython4);
        }

        if let Some(caps) = CLAUSE_REGEX.captures(part) {
            let op = Operator::parse(&caps["op"]).ok_or_else(malformed)?;
            let version = clause_version(&caps["major"], &caps["minor"]).ok_or_else(malformed)?;
            return Ok(Self::Compare(op, version));
        }

        if let Some(caps) = PATCH_CLAUSE_REGEX.captures(part) {
            let version = clause_version(&caps["major"], &caps["minor"])
                .and_then(PythonVersion::next_minor)
                .ok_or_else(malformed)?;
            return Ok(Self::Compare(Operator::GreaterEqual, version));
        }

        Err(malformed())
    }

    fn admits(self, candidate: PythonVersion) -> bool {
        match self {
            Self::NotPython4 => true,
            Self::Compare(op, bound) => op.admits(candidate, bound),
        }
    }
}

fn clause_version(major: &str, minor: &str) -> Option<PythonVersion> {
    Some(PythonVersion::new(major.parse().ok()?, minor.parse().ok()?))
}

/// Returns the released interpreter versions admitted by `requires`.
///
/// Clauses are applied left to right, each narrowing the running set.
///
/// # Errors
///
/// Returns `PypiError::MalformedRequirement` for the first clause that matches
/// none of the supported shapes.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::{PythonVersion, compatible_python_versions};
///
/// let versions = compatible_python_versions(">=3.7, !=3.9.*").unwrap();
/// assert!(versions.contains(&PythonVersion::new(3, 8)));
/// assert!(!versions.contains(&PythonVersion::new(3, 9)));
/// assert!(!versions.contains(&PythonVersion::new(2, 7)));
/// ```
pub fn compatible_python_versions(requires: &str) -> Result<BTreeSet<PythonVersion>> {
    compatible_python_versions_in(requires, released_python_versions())
}

/// Like [`compatible_python_versions`], starting from an explicit universe.
pub fn compatible_python_versions_in(
    requires: &str,
    universe: BTreeSet<PythonVersion>,
) -> Result<BTreeSet<PythonVersion>> {
    let mut remaining = universe;

    for part in requires.split(',') {
        let clause = Clause::parse(requires, part.trim())?;
        remaining.retain(|v| clause.admits(*v));
    }

    Ok(remaining)
}
