//! Version triples and the assertion criteria applied to them.
//!
//! Runtime version reports are messy (`v22.5.1`, `Python 3.9.18`, `1.8.0_322`),
//! so parsing is lenient: a leading `v` and trailing noise after a numeric
//! component are tolerated, and missing components default to zero.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Observed runtime version as a major/minor/patch triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version token leniently.
    ///
    /// Accepts an optional `v`/`V` prefix, fewer than three components, and
    /// trailing non-numeric noise (`22.5.1-alpha`, `1.8.0_322`). Fails when no
    /// leading numeric component exists at all.
    pub fn parse_lenient(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        let mut components = [0u64; 3];
        let mut count = 0usize;
        for (index, part) in trimmed.split('.').enumerate() {
            if index == 3 {
                break;
            }
            let end = part
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(part.len());
            let digits = &part[..end];
            if digits.is_empty() {
                break;
            }
            components[index] = digits
                .parse()
                .with_context(|| format!("version component {digits:?} out of range in {input:?}"))?;
            count = index + 1;
            if end != part.len() {
                break;
            }
        }
        if count == 0 {
            return Err(anyhow!("no version number in {input:?}"));
        }
        Ok(Self {
            major: components[0],
            minor: components[1],
            patch: components[2],
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        Self::parse_lenient(input)
    }
}

/// The observed version does not satisfy the expectation.
///
/// Fatal by design: there is no retry or recovery, the message names the
/// expected and observed values and propagates to the caller as a failed run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("expected {runtime} version {expected}, got {observed}")]
pub struct VersionMismatch {
    pub runtime: String,
    pub expected: String,
    pub observed: String,
}

/// Assertion criterion applied to an observed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Floating: major must match (`22` accepts any 22.x.x).
    Major(u64),
    /// Major and minor must match (`3.9` accepts any 3.9.x).
    MajorMinor(u64, u64),
    /// Full triple equality (`22.5.1`).
    Exact(Version),
    /// Negated: major must NOT match (`!6`).
    NotMajor(u64),
}

impl Expectation {
    pub fn matches(&self, observed: Version) -> bool {
        match *self {
            Self::Major(major) => observed.major == major,
            Self::MajorMinor(major, minor) => observed.major == major && observed.minor == minor,
            Self::Exact(version) => observed == version,
            Self::NotMajor(major) => observed.major != major,
        }
    }

    /// Assert the expectation against an observation.
    ///
    /// `raw` is the verbatim report line so the mismatch message shows what
    /// the runtime actually printed, not a re-rendered triple.
    pub fn check(&self, runtime: &str, observed: Version, raw: &str) -> Result<(), VersionMismatch> {
        if self.matches(observed) {
            return Ok(());
        }
        Err(VersionMismatch {
            runtime: runtime.to_string(),
            expected: self.to_string(),
            observed: raw.trim().to_string(),
        })
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Major(major) => write!(f, "{major}.x.x"),
            Self::MajorMinor(major, minor) => write!(f, "{major}.{minor}.x"),
            Self::Exact(version) => write!(f, "{version}"),
            Self::NotMajor(major) => write!(f, "different from {major}.x.x"),
        }
    }
}

impl FromStr for Expectation {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix('!') {
            return Ok(Self::NotMajor(parse_component(rest, input)?));
        }
        let parts: Vec<&str> = trimmed.split('.').collect();
        match parts.as_slice() {
            [major] => Ok(Self::Major(parse_component(major, input)?)),
            [major, minor] => Ok(Self::MajorMinor(
                parse_component(major, input)?,
                parse_component(minor, input)?,
            )),
            [major, minor, patch] => Ok(Self::Exact(Version::new(
                parse_component(major, input)?,
                parse_component(minor, input)?,
                parse_component(patch, input)?,
            ))),
            _ => Err(invalid_expectation(input)),
        }
    }
}

fn parse_component(part: &str, input: &str) -> Result<u64> {
    if part.is_empty() || !part.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid_expectation(input));
    }
    part.parse()
        .with_context(|| format!("expectation component {part:?} out of range"))
}

fn invalid_expectation(input: &str) -> anyhow::Error {
    anyhow!("invalid expectation {input:?} (want MAJOR[.MINOR[.PATCH]] or !MAJOR)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_triple_with_prefix() {
        let version = Version::parse_lenient("v22.5.1").unwrap();
        assert_eq!(version, Version::new(22, 5, 1));
    }

    #[test]
    fn missing_components_default_to_zero() {
        assert_eq!(Version::parse_lenient("3.9").unwrap(), Version::new(3, 9, 0));
        assert_eq!(Version::parse_lenient("18").unwrap(), Version::new(18, 0, 0));
    }

    #[test]
    fn tolerates_trailing_noise() {
        assert_eq!(
            Version::parse_lenient("22.5.1-alpha").unwrap(),
            Version::new(22, 5, 1)
        );
        assert_eq!(
            Version::parse_lenient("1.8.0_322").unwrap(),
            Version::new(1, 8, 0)
        );
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(Version::parse_lenient("stable").is_err());
        assert!(Version::parse_lenient("").is_err());
    }

    #[test]
    fn parses_expectation_forms() {
        assert_eq!("22".parse::<Expectation>().unwrap(), Expectation::Major(22));
        assert_eq!(
            "3.9".parse::<Expectation>().unwrap(),
            Expectation::MajorMinor(3, 9)
        );
        assert_eq!(
            "22.5.1".parse::<Expectation>().unwrap(),
            Expectation::Exact(Version::new(22, 5, 1))
        );
        assert_eq!(
            "!6".parse::<Expectation>().unwrap(),
            Expectation::NotMajor(6)
        );
    }

    #[test]
    fn rejects_malformed_expectations() {
        for input in ["", "x", "22.", "1.2.3.4", "!6.0", "v22"] {
            assert!(input.parse::<Expectation>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn floating_major_accepts_any_minor_patch() {
        let expectation = Expectation::Major(22);
        assert!(expectation.matches(Version::new(22, 9, 1)));
        assert!(!expectation.matches(Version::new(21, 9, 1)));
    }

    #[test]
    fn major_minor_pins_both_components() {
        let expectation = Expectation::MajorMinor(3, 9);
        assert!(expectation.matches(Version::new(3, 9, 18)));
        assert!(!expectation.matches(Version::new(3, 10, 0)));
    }

    #[test]
    fn negated_major_rejects_only_that_major() {
        let expectation = Expectation::NotMajor(6);
        assert!(expectation.matches(Version::new(8, 0, 100)));
        assert!(!expectation.matches(Version::new(6, 0, 0)));
    }

    #[test]
    fn mismatch_message_names_expected_and_observed() {
        let err = Expectation::Major(22)
            .check("node", Version::new(21, 1, 0), "v21.1.0")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected node version 22.x.x, got v21.1.0"
        );
    }

    #[test]
    fn exact_match_passes() {
        assert!(Expectation::Exact(Version::new(22, 5, 1))
            .check("node", Version::new(22, 5, 1), "v22.5.1")
            .is_ok());
    }
}
