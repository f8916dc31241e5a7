//! Catalog of probeable runtimes and their version-report formats.
//!
//! Each runtime knows how to be asked for its version (binary candidates and
//! argv), which stream the report lands on, and how to extract a version from
//! its specific output shape. Everything else treats runtimes uniformly.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::version::Version;

/// A language runtime the tool knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    #[serde(alias = "nodejs")]
    Node,
    Python,
    Dotnet,
    Go,
    Java,
}

impl Runtime {
    pub const ALL: [Self; 5] = [Self::Node, Self::Python, Self::Dotnet, Self::Go, Self::Java];

    pub fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Dotnet => "dotnet",
            Self::Go => "go",
            Self::Java => "java",
        }
    }

    /// Binary names tried in order during PATH lookup.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Node => &["node"],
            Self::Python => &["python3", "python"],
            Self::Dotnet => &["dotnet"],
            Self::Go => &["go"],
            Self::Java => &["java"],
        }
    }

    /// Arguments that make the runtime report its version.
    pub fn version_argv(self) -> &'static [&'static str] {
        match self {
            Self::Node | Self::Python | Self::Dotnet => &["--version"],
            Self::Go => &["version"],
            Self::Java => &["-version"],
        }
    }

    /// Whether the version report lands on stderr (`java -version` does).
    pub fn reports_on_stderr(self) -> bool {
        matches!(self, Self::Java)
    }

    /// Extract a version from captured output.
    ///
    /// Returns the parsed version plus the verbatim report line so failure
    /// messages can quote what the runtime actually printed.
    pub fn parse_report(self, stdout: &str, stderr: &str) -> Result<(Version, String)> {
        let text = if self.reports_on_stderr() && !stderr.trim().is_empty() {
            stderr
        } else if stdout.trim().is_empty() {
            stderr
        } else {
            stdout
        };
        let line = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| anyhow!("{} produced no version output", self.name()))?
            .trim();
        let token = self.extract_token(line)?;
        let version = Version::parse_lenient(token)
            .with_context(|| format!("{} report line {line:?}", self.name()))?;
        Ok((version, line.to_string()))
    }

    fn extract_token(self, line: &str) -> Result<&str> {
        // Per-runtime report shapes:
        //   node:   v22.5.1
        //   python: Python 3.9.18
        //   dotnet: 8.0.100
        //   go:     go version go1.21.1 linux/amd64
        //   java:   openjdk version "17.0.2" 2022-01-18
        let pattern = match self {
            Self::Node => r"^v?(\d+(?:\.\d+){0,2})",
            Self::Python => r"Python (\d+(?:\.\d+){0,2})",
            Self::Dotnet => r"^(\d+(?:\.\d+){0,2})",
            Self::Go => r"go version go(\d+(?:\.\d+){0,2})",
            Self::Java => r#"version "([^"]+)""#,
        };
        let re = Regex::new(pattern).expect("static version pattern");
        let captures = re
            .captures(line)
            .ok_or_else(|| anyhow!("unrecognized {} version report: {line:?}", self.name()))?;
        Ok(captures.get(1).map(|m| m.as_str()).unwrap_or_default())
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Runtime {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "node" | "nodejs" => Ok(Self::Node),
            "python" => Ok(Self::Python),
            "dotnet" => Ok(Self::Dotnet),
            "go" => Ok(Self::Go),
            "java" => Ok(Self::Java),
            other => Err(anyhow!(
                "unknown runtime {other:?} (expected one of node, python, dotnet, go, java)"
            )),
        }
    }
}
