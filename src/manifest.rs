//! Probe manifest loading and validation.
//!
//! A manifest replaces a directory of per-runtime assertion scripts: each
//! entry names a runtime and, optionally, an expectation and an explicit
//! binary path. Validation runs before any probe executes so a malformed
//! entry fails the whole file up front.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::report::read_json;
use crate::runtime::Runtime;
use crate::version::Expectation;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// A batch of version probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeManifest {
    pub schema_version: u32,
    pub probes: Vec<ProbeSpec>,
}

/// One probe entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub runtime: Runtime,

    /// Expectation expression (`22`, `3.9`, `22.5.1`, `!6`). Omitted means
    /// "use the default from the versions config", or observe-only when no
    /// versions config is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,

    /// Explicit binary path, overriding PATH lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
}

/// Load a manifest from a JSON file.
pub fn load_manifest(path: &Path) -> Result<ProbeManifest> {
    let manifest: ProbeManifest =
        read_json(path).with_context(|| format!("load probe manifest {}", path.display()))?;
    Ok(manifest)
}

/// Validate manifest schema and expectation expressions.
pub fn validate_manifest(manifest: &ProbeManifest) -> Result<()> {
    if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported manifest schema_version {}",
            manifest.schema_version
        ));
    }
    if manifest.probes.is_empty() {
        return Err(anyhow!("manifest lists no probes"));
    }
    for (index, spec) in manifest.probes.iter().enumerate() {
        if let Some(raw) = &spec.expect {
            raw.parse::<Expectation>()
                .with_context(|| format!("probes[{index}] ({})", spec.runtime))?;
        }
    }
    Ok(())
}
