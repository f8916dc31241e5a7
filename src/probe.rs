//! Probe execution: resolve a runtime binary and capture its version report.
//!
//! A probe reads the version exactly once under a controlled environment and
//! produces a transient [`Observation`]; nothing is persisted.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::runtime::Runtime;
use crate::version::Version;

/// Controlled environment for probe execution.
///
/// Probes run with a cleared environment plus these values so version reports
/// are stable across hosts; PATH and HOME are passed through because some
/// runtimes refuse to start without them.
#[derive(Debug, Clone)]
pub struct ProbeEnv {
    pub locale: String,
    pub tz: String,
    pub term: String,
}

impl Default for ProbeEnv {
    fn default() -> Self {
        Self {
            locale: "C".to_string(),
            tz: "UTC".to_string(),
            term: "dumb".to_string(),
        }
    }
}

/// Result of a single version probe.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub runtime: Runtime,
    pub binary: PathBuf,
    /// Verbatim report line the version was extracted from.
    pub raw: String,
    pub version: Version,
}

/// Resolve the binary to probe: an explicit path wins, otherwise the first
/// candidate name found in PATH.
pub fn resolve_binary(runtime: Runtime, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(anyhow!("binary {} does not exist", path.display()));
        }
        return Ok(path.to_path_buf());
    }
    for candidate in runtime.candidates() {
        if let Ok(found) = which::which(candidate) {
            tracing::debug!(
                runtime = runtime.name(),
                binary = %found.display(),
                "resolved runtime binary"
            );
            return Ok(found);
        }
    }
    Err(anyhow!(
        "no {} binary found in PATH (tried {})",
        runtime.name(),
        runtime.candidates().join(", ")
    ))
}

/// Run a single probe: resolve, execute the version command, parse the report.
pub fn run_probe(runtime: Runtime, explicit: Option<&Path>, env: &ProbeEnv) -> Result<Observation> {
    let binary = resolve_binary(runtime, explicit)?;
    let output = probe_command(&binary, runtime.version_argv(), env)
        .output()
        .with_context(|| format!("spawn {}", binary.display()))?;
    if !output.status.success() {
        return Err(anyhow!(
            "{} {} failed with status {}: {}",
            binary.display(),
            runtime.version_argv().join(" "),
            exit_status_string(&output.status),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let (version, raw) = runtime
        .parse_report(&stdout, &stderr)
        .with_context(|| format!("parse {} version report from {}", runtime.name(), binary.display()))?;
    tracing::debug!(runtime = runtime.name(), report = raw.as_str(), "probed version");
    Ok(Observation {
        runtime,
        binary,
        raw,
        version,
    })
}

fn probe_command(binary: &Path, argv: &[&str], env: &ProbeEnv) -> Command {
    let mut cmd = Command::new(binary);
    cmd.args(argv)
        .env_clear()
        .env("LC_ALL", &env.locale)
        .env("TZ", &env.tz)
        .env("TERM", &env.term);
    if let Some(path) = std::env::var_os("PATH") {
        cmd.env("PATH", path);
    }
    if let Some(home) = std::env::var_os("HOME") {
        cmd.env("HOME", home);
    }
    cmd
}

fn exit_status_string(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        format!("{code}")
    } else {
        "terminated by signal".to_string()
    }
}
