//! End-to-end probe checks against stub runtime binaries.
//!
//! Stubs are shell scripts that print a canned version report, so these tests
//! exercise resolution, execution, parsing, and assertion without requiring
//! any real runtime on the host.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use runtime_probe::check::run_checks;
use runtime_probe::manifest::{ProbeManifest, ProbeSpec, MANIFEST_SCHEMA_VERSION};
use runtime_probe::probe::{run_probe, ProbeEnv};
use runtime_probe::runtime::Runtime;
use runtime_probe::version::Version;

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
    path
}

fn probe_spec(runtime: Runtime, expect: Option<&str>, binary: PathBuf) -> ProbeSpec {
    ProbeSpec {
        runtime,
        expect: expect.map(str::to_string),
        binary: Some(binary),
    }
}

#[test]
fn probes_stub_node_binary() {
    let dir = TempDir::new().expect("tempdir");
    let node = write_stub(dir.path(), "node", "echo v22.5.1");
    let observation = run_probe(Runtime::Node, Some(&node), &ProbeEnv::default()).expect("probe");
    assert_eq!(observation.version, Version::new(22, 5, 1));
    assert_eq!(observation.raw, "v22.5.1");
    assert_eq!(observation.binary, node);
}

#[test]
fn probes_stub_java_report_on_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let java = write_stub(
        dir.path(),
        "java",
        "echo 'openjdk version \"17.0.2\" 2022-01-18' >&2",
    );
    let observation = run_probe(Runtime::Java, Some(&java), &ProbeEnv::default()).expect("probe");
    assert_eq!(observation.version, Version::new(17, 0, 2));
}

#[test]
fn failing_stub_is_a_probe_error() {
    let dir = TempDir::new().expect("tempdir");
    let node = write_stub(dir.path(), "node", "echo boom >&2; exit 3");
    let err = run_probe(Runtime::Node, Some(&node), &ProbeEnv::default()).unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("failed with status 3"), "got: {rendered}");
    assert!(rendered.contains("boom"), "got: {rendered}");
}

#[test]
fn manifest_check_mixes_pass_and_fail() {
    let dir = TempDir::new().expect("tempdir");
    let node = write_stub(dir.path(), "node", "echo v22.5.1");
    let go = write_stub(dir.path(), "go", "echo 'go version go1.21.1 linux/amd64'");
    let dotnet = write_stub(dir.path(), "dotnet", "echo 6.0.428");

    let manifest = ProbeManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        probes: vec![
            probe_spec(Runtime::Node, Some("22"), node),
            probe_spec(Runtime::Go, Some("1.21.1"), go),
            // The dotnet entry asserts "anything but 6" and the stub reports 6.
            probe_spec(Runtime::Dotnet, Some("!6"), dotnet),
        ],
    };
    let report = run_checks(&manifest, None, &ProbeEnv::default(), false);
    assert_eq!(report.pass_count, 2);
    assert_eq!(report.fail_count, 1);

    let dotnet_result = &report.results[2];
    assert!(!dotnet_result.pass);
    assert_eq!(
        dotnet_result.failures[0],
        "expected dotnet version different from 6.x.x, got 6.0.428"
    );
}

#[test]
fn mismatch_message_quotes_raw_report() {
    let dir = TempDir::new().expect("tempdir");
    let node = write_stub(dir.path(), "node", "echo v21.1.0");
    let manifest = ProbeManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        probes: vec![probe_spec(Runtime::Node, Some("22"), node)],
    };
    let report = run_checks(&manifest, None, &ProbeEnv::default(), false);
    assert_eq!(report.fail_count, 1);
    assert_eq!(
        report.results[0].failures[0],
        "expected node version 22.x.x, got v21.1.0"
    );
}

#[test]
fn observe_only_probe_passes_on_parseable_report() {
    let dir = TempDir::new().expect("tempdir");
    let python = write_stub(dir.path(), "python3", "echo 'Python 3.12.4'");
    let manifest = ProbeManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        probes: vec![probe_spec(Runtime::Python, None, python)],
    };
    let report = run_checks(&manifest, None, &ProbeEnv::default(), false);
    assert_eq!(report.pass_count, 1);
    let result = &report.results[0];
    assert!(result.expected.is_none());
    assert_eq!(result.observed, Some(Version::new(3, 12, 4)));
}
