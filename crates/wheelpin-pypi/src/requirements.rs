//! Line-oriented `requirements.txt` reader.
//!
//! Only exact pins (`name==version`) are understood. Everything else that is
//! not a comment or blank is reported per line so one bad entry never hides
//! the rest of the file.

use crate::error::{PypiError, Result};
use pep440_rs::Version;
use std::str::FromStr;

/// An exact `name==version` pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedRequirement {
    pub name: String,
    pub version: Version,
    /// The line as written, without its trailing newline
    pub raw: String,
}

/// One classified line of a requirements file.
#[derive(Debug)]
pub enum RequirementLine {
    /// A line starting with `#`, kept verbatim
    Comment(String),
    Blank,
    Pin(PinnedRequirement),
    Invalid { raw: String, error: PypiError },
}

impl RequirementLine {
    /// The original text of the line.
    pub fn raw(&self) -> &str {
        match self {
            Self::Comment(raw) => raw,
            Self::Blank => "",
            Self::Pin(pin) => &pin.raw,
            Self::Invalid { raw, .. } => raw,
        }
    }
}

/// Parsed requirements file, lines in input order.
///
/// # Examples
///
/// ```
/// use wheelpin_pypi::{RequirementLine, RequirementsFile};
///
/// let file = RequirementsFile::parse("# pinned\nrequests==2.28.0\n\nflask>=2\n");
/// assert_eq!(file.len(), 4);
/// assert!(matches!(file.lines()[0], RequirementLine::Comment(_)));
/// assert!(matches!(file.lines()[1], RequirementLine::Pin(_)));
/// assert!(matches!(file.lines()[2], RequirementLine::Blank));
/// assert!(matches!(file.lines()[3], RequirementLine::Invalid { .. }));
/// ```
#[derive(Debug)]
pub struct RequirementsFile {
    lines: Vec<RequirementLine>,
}

impl RequirementsFile {
    /// Classifies every line of `content`.
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|line| {
                let raw = line.trim_end_matches('\r');
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    RequirementLine::Blank
                } else if trimmed.starts_with('#') {
                    RequirementLine::Comment(raw.to_string())
                } else {
                    match parse_pin(raw) {
                        Ok(pin) => RequirementLine::Pin(pin),
                        Err(error) => RequirementLine::Invalid {
                            raw: raw.to_string(),
                            error,
                        },
                    }
                }
            })
            .collect();

        Self { lines }
    }

    pub fn lines(&self) -> &[RequirementLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<RequirementLine> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates over the pinned requirements only.
    pub fn pins(&self) -> impl Iterator<Item = &PinnedRequirement> {
        self.lines.iter().filter_map(|line| match line {
            RequirementLine::Pin(pin) => Some(pin),
            _ => None,
        })
    }
}

/// Parses a single `name==version` line.
///
/// A trailing ` # comment` is ignored, so files written by the upgrader can be
/// fed back in.
///
/// # Errors
///
/// Returns `PypiError::MalformedRequirementLine` if the line is not an exact
/// pin, or `PypiError::MalformedVersion` if the pinned version is not PEP 440.
pub fn parse_pin(line: &str) -> Result<PinnedRequirement> {
    let raw = line.trim_end_matches('\r');
    let requirement = match raw.find(" #") {
        Some(idx) => &raw[..idx],
        None => raw,
    }
    .trim();

    let Some((name, version)) = requirement.split_once("==") else {
        return Err(PypiError::MalformedRequirementLine {
            line: raw.to_string(),
            reason: "expected 'package==version'".into(),
        });
    };

    let name = name.trim();
    let version = version.trim();

    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(PypiError::MalformedRequirementLine {
            line: raw.to_string(),
            reason: format!("invalid package name '{}'", name),
        });
    }

    let version = Version::from_str(version)
        .map_err(|e| PypiError::malformed_version(version, e.to_string()))?;

    Ok(PinnedRequirement {
        name: name.to_string(),
        version,
        raw: raw.to_string(),
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("requests==2.28.0").unwrap();
        assert_eq!(pin.name, "requests");
        assert_eq!(pin.version, Version::from_str("2.28.0").unwrap());
        assert_eq!(pin.raw, "requests==2.28.0");
    }

    #[test]
    fn test_parse_pin_whitespace_tolerated() {
        let pin = parse_pin("  Django_Rest.framework == 3.14.0 ").unwrap();
        assert_eq!(pin.name, "Django_Rest.framework");
        assert_eq!(pin.version.to_string(), "3.14.0");
    }

    #[test]
    fn test_parse_pin_trailing_comment() {
        let pin = parse_pin("numpy==1.24.0  # Upgraded from 1.19.0").unwrap();
        assert_eq!(pin.name, "numpy");
        assert_eq!(pin.version.to_string(), "1.24.0");
    }

    #[test]
    fn test_parse_pin_rejects_ranges() {
        for line in ["flask>=2.0", "flask", "flask[async]==2.0", "==1.0"] {
            assert!(
                matches!(
                    parse_pin(line),
                    Err(PypiError::MalformedRequirementLine { .. })
                ),
                "{line}"
            );
        }
    }

    #[test]
    fn test_parse_pin_bad_version() {
        assert!(matches!(
            parse_pin("flask==not.a.version!"),
            Err(PypiError::MalformedVersion { .. })
        ));
    }

    #[test]
    fn test_file_lines_in_order() {
        let content = "# header\r\nrequests==2.28.0\n\n   \nbogus line\nflask==2.0.1";
        let file = RequirementsFile::parse(content);

        assert_eq!(file.len(), 6);
        assert_eq!(file.lines()[0].raw(), "# header");
        assert!(matches!(file.lines()[2], RequirementLine::Blank));
        assert!(matches!(file.lines()[3], RequirementLine::Blank));
        assert_eq!(file.lines()[4].raw(), "bogus line");

        let names: Vec<&str> = file.pins().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["requests", "flask"]);
    }

    #[test]
    fn test_empty_content() {
        let file = RequirementsFile::parse("");
        assert!(file.is_empty());
        assert_eq!(file.into_lines().len(), 0);
    }
}
