//! CI build-matrix generation from the versions config.
//!
//! The versions config declares which runtime versions the image pipeline
//! builds: unversioned runtimes pinned to a single version, and versioned
//! runtimes with a default plus additional versions. Two matrix shapes are
//! emitted: an include-matrix for build jobs (one entry per runtime, arch,
//! and version) and a flat image-name list for registry sync jobs.
//!
//! Output is deterministic: runtimes are ordered by name, unversioned before
//! versioned, and the default version precedes additional ones, so emitted
//! JSON is stable for CI diffing.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const ARCHS: [&str; 2] = ["amd64", "arm64"];

/// Declarative versions config, loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionsConfig {
    /// Runtimes with a single pinned version (`go = "1.21.1"`).
    #[serde(default)]
    pub unversioned: BTreeMap<String, String>,

    /// Runtimes built at several versions, one of them the default.
    #[serde(default)]
    pub versioned: BTreeMap<String, VersionedRuntime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionedRuntime {
    pub default: String,
    #[serde(default)]
    pub additional: Vec<String>,
}

impl VersionsConfig {
    /// The version a probe should expect for `runtime` when the manifest
    /// entry leaves the expectation to the config.
    pub fn pinned_version(&self, runtime: &str) -> Option<&str> {
        self.unversioned
            .get(runtime)
            .map(String::as_str)
            .or_else(|| self.versioned.get(runtime).map(|info| info.default.as_str()))
    }
}

/// Load and validate a versions config from a TOML file.
pub fn load_versions(path: &Path) -> Result<VersionsConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read versions config {}", path.display()))?;
    let config: VersionsConfig = toml::from_str(&text)
        .with_context(|| format!("parse versions config {}", path.display()))?;
    validate_versions(&config)?;
    Ok(config)
}

/// Validate that every declared runtime carries usable version strings.
pub fn validate_versions(config: &VersionsConfig) -> Result<()> {
    if config.unversioned.is_empty() && config.versioned.is_empty() {
        return Err(anyhow!("versions config lists no runtimes"));
    }
    for (name, version) in &config.unversioned {
        if version.trim().is_empty() {
            return Err(anyhow!("unversioned runtime {name} has an empty version"));
        }
    }
    for (name, info) in &config.versioned {
        if info.default.trim().is_empty() {
            return Err(anyhow!("versioned runtime {name} has an empty default"));
        }
        for version in &info.additional {
            if version.trim().is_empty() {
                return Err(anyhow!("versioned runtime {name} has an empty additional version"));
            }
            if version == &info.default {
                return Err(anyhow!(
                    "versioned runtime {name} lists default {version} under additional"
                ));
            }
        }
    }
    Ok(())
}

/// One include-matrix entry.
///
/// `language_version` and `suffix` are omitted for unversioned runtimes, and
/// `arch` is omitted in no-arch mode (registry manifests cover both arches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixEntry {
    pub sdk: String,
    pub default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BuildMatrix {
    pub include: Vec<MatrixEntry>,
}

#[derive(Debug, Serialize)]
pub struct ImageMatrix {
    pub image: Vec<String>,
}

/// Build the include-matrix for build jobs.
pub fn build_matrix(config: &VersionsConfig, include_arch: bool) -> BuildMatrix {
    let archs: Vec<Option<&str>> = if include_arch {
        ARCHS.iter().copied().map(Some).collect()
    } else {
        vec![None]
    };
    let mut include = Vec::new();
    for arch in &archs {
        for sdk in config.unversioned.keys() {
            include.push(MatrixEntry {
                sdk: sdk.clone(),
                default: true,
                language_version: None,
                arch: arch.map(str::to_string),
                suffix: None,
            });
        }
        for (sdk, info) in &config.versioned {
            include.push(versioned_entry(sdk, &info.default, true, *arch));
            for version in &info.additional {
                include.push(versioned_entry(sdk, version, false, *arch));
            }
        }
    }
    BuildMatrix { include }
}

fn versioned_entry(sdk: &str, version: &str, default: bool, arch: Option<&str>) -> MatrixEntry {
    MatrixEntry {
        sdk: sdk.to_string(),
        default,
        language_version: Some(version.to_string()),
        arch: arch.map(str::to_string),
        suffix: Some(format!("-{version}")),
    }
}

/// Build the image-name list for registry sync jobs.
///
/// Versioned runtimes appear both unsuffixed (the default version) and with
/// one suffixed name per version, default included.
pub fn image_matrix(config: &VersionsConfig, prefix: &str) -> ImageMatrix {
    let mut image = vec![format!("{prefix}-base")];
    for sdk in config.unversioned.keys() {
        image.push(format!("{prefix}-{sdk}"));
    }
    for (sdk, info) in &config.versioned {
        image.push(format!("{prefix}-{sdk}"));
        for version in std::iter::once(&info.default).chain(info.additional.iter()) {
            image.push(format!("{prefix}-{sdk}-{version}"));
        }
    }
    ImageMatrix { image }
}
