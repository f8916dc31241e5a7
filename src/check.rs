//! Batch probe execution and reporting.
//!
//! Runs every manifest probe, collecting per-probe pass/fail with a failure
//! list rather than stopping at the first mismatch, so a single run reports
//! the state of every runtime.

use serde::Serialize;
use std::path::PathBuf;

use crate::manifest::{ProbeManifest, ProbeSpec};
use crate::matrix::VersionsConfig;
use crate::probe::{self, ProbeEnv};
use crate::runtime::Runtime;
use crate::version::{Expectation, Version};

pub const CHECK_REPORT_SCHEMA_VERSION: u32 = 1;

/// Aggregated result of a manifest run.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub schema_version: u32,
    pub results: Vec<ProbeResult>,
    pub pass_count: usize,
    pub fail_count: usize,
}

/// Outcome of one probe entry.
#[derive(Debug, Serialize)]
pub struct ProbeResult {
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub pass: bool,
    pub failures: Vec<String>,
}

/// Run every probe in the manifest and build a report.
pub fn run_checks(
    manifest: &ProbeManifest,
    versions: Option<&VersionsConfig>,
    env: &ProbeEnv,
    verbose: bool,
) -> CheckReport {
    let mut results = Vec::with_capacity(manifest.probes.len());
    for spec in &manifest.probes {
        let result = run_single(spec, versions, env);
        if verbose && !result.pass {
            eprintln!(
                "probe {} failed: {}",
                spec.runtime.name(),
                result.failures.join("; ")
            );
        }
        results.push(result);
    }
    let pass_count = results.iter().filter(|result| result.pass).count();
    let fail_count = results.len() - pass_count;
    tracing::info!(
        probes = results.len(),
        failed = fail_count,
        "manifest check complete"
    );
    CheckReport {
        schema_version: CHECK_REPORT_SCHEMA_VERSION,
        results,
        pass_count,
        fail_count,
    }
}

fn run_single(
    spec: &ProbeSpec,
    versions: Option<&VersionsConfig>,
    env: &ProbeEnv,
) -> ProbeResult {
    let mut failures = Vec::new();
    let expectation = resolve_expectation(spec, versions, &mut failures);
    let observation = match probe::run_probe(spec.runtime, spec.binary.as_deref(), env) {
        Ok(observation) => Some(observation),
        Err(err) => {
            failures.push(format!("probe failed: {err:#}"));
            None
        }
    };
    if let (Some(observation), Some(expectation)) = (&observation, &expectation) {
        if let Err(mismatch) =
            expectation.check(spec.runtime.name(), observation.version, &observation.raw)
        {
            failures.push(mismatch.to_string());
        }
    }
    let pass = failures.is_empty();
    ProbeResult {
        runtime: spec.runtime,
        binary: observation.as_ref().map(|o| o.binary.clone()),
        expected: expectation.as_ref().map(Expectation::to_string),
        observed: observation.as_ref().map(|o| o.version),
        raw: observation.as_ref().map(|o| o.raw.clone()),
        pass,
        failures,
    }
}

/// Decide what a probe should assert.
///
/// An explicit `expect` wins; otherwise the versions config supplies the
/// runtime's pinned/default version. With neither, the probe is observe-only
/// and passes as long as the runtime reports a parseable version.
fn resolve_expectation(
    spec: &ProbeSpec,
    versions: Option<&VersionsConfig>,
    failures: &mut Vec<String>,
) -> Option<Expectation> {
    if let Some(raw) = &spec.expect {
        return match raw.parse() {
            Ok(expectation) => Some(expectation),
            Err(err) => {
                failures.push(format!("invalid expectation {raw:?}: {err:#}"));
                None
            }
        };
    }
    let config = versions?;
    let raw = config.pinned_version(spec.runtime.name())?;
    match raw.parse() {
        Ok(expectation) => Some(expectation),
        Err(err) => {
            failures.push(format!(
                "invalid default version {raw:?} for {}: {err:#}",
                spec.runtime.name()
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_SCHEMA_VERSION;
    use std::path::Path;

    fn spec(runtime: Runtime, expect: Option<&str>) -> ProbeSpec {
        ProbeSpec {
            runtime,
            expect: expect.map(str::to_string),
            binary: None,
        }
    }

    fn sample_versions() -> VersionsConfig {
        toml::from_str(
            r#"
            [unversioned]
            go = "1.21.1"

            [versioned.node]
            default = "18"
            additional = ["20", "22"]
            "#,
        )
        .expect("parse versions")
    }

    #[test]
    fn explicit_expectation_wins_over_config() {
        let mut failures = Vec::new();
        let expectation = resolve_expectation(
            &spec(Runtime::Node, Some("22")),
            Some(&sample_versions()),
            &mut failures,
        );
        assert_eq!(expectation, Some(Expectation::Major(22)));
        assert!(failures.is_empty());
    }

    #[test]
    fn config_default_fills_omitted_expectation() {
        let mut failures = Vec::new();
        let expectation =
            resolve_expectation(&spec(Runtime::Node, None), Some(&sample_versions()), &mut failures);
        assert_eq!(expectation, Some(Expectation::Major(18)));
        assert!(failures.is_empty());
    }

    #[test]
    fn pinned_unversioned_runtime_resolves_exact() {
        let mut failures = Vec::new();
        let expectation =
            resolve_expectation(&spec(Runtime::Go, None), Some(&sample_versions()), &mut failures);
        assert_eq!(
            expectation,
            Some(Expectation::Exact(Version::new(1, 21, 1)))
        );
    }

    #[test]
    fn absent_config_entry_means_observe_only() {
        let mut failures = Vec::new();
        let expectation =
            resolve_expectation(&spec(Runtime::Java, None), Some(&sample_versions()), &mut failures);
        assert_eq!(expectation, None);
        assert!(failures.is_empty());
    }

    #[test]
    fn malformed_expectation_is_recorded_as_failure() {
        let mut failures = Vec::new();
        let expectation = resolve_expectation(&spec(Runtime::Node, Some("latest")), None, &mut failures);
        assert_eq!(expectation, None);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("invalid expectation"));
    }

    #[test]
    fn missing_binary_fails_the_probe() {
        let manifest = ProbeManifest {
            schema_version: MANIFEST_SCHEMA_VERSION,
            probes: vec![ProbeSpec {
                runtime: Runtime::Node,
                expect: Some("22".to_string()),
                binary: Some(Path::new("/nonexistent/runtime-probe-node").to_path_buf()),
            }],
        };
        let report = run_checks(&manifest, None, &ProbeEnv::default(), false);
        assert_eq!(report.fail_count, 1);
        assert_eq!(report.pass_count, 0);
        let result = &report.results[0];
        assert!(!result.pass);
        assert!(result.failures[0].contains("probe failed"));
        assert!(result.observed.is_none());
    }
}
