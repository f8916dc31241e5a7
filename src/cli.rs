//! CLI argument parsing for the probe tool.
//!
//! The CLI is intentionally thin: it wires arguments to library calls without
//! embedding policy, so the same probe logic can be reused elsewhere.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use runtime_probe::runtime::Runtime;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "rtprobe",
    version,
    about = "Runtime version assertion probes and CI matrix generation",
    after_help = "Examples:\n  rtprobe probe --runtime node --expect 22\n  rtprobe probe --runtime python --expect 3.9 --json\n  rtprobe probe --runtime dotnet --expect '!6'\n  rtprobe check --manifest probes.json --versions versions.toml --out report.json\n  rtprobe matrix --versions versions.toml --no-arch\n  rtprobe matrix --versions versions.toml --images --prefix runtime\n  rtprobe runtimes",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Probe(ProbeArgs),
    Check(CheckArgs),
    Matrix(MatrixArgs),
    Runtimes(RuntimesArgs),
}

/// Probe one runtime and optionally assert its version.
#[derive(Parser, Debug)]
#[command(about = "Probe a runtime version and assert an expectation")]
pub struct ProbeArgs {
    /// Runtime to probe (node, python, dotnet, go, java)
    #[arg(long, value_name = "RT")]
    pub runtime: Runtime,

    /// Explicit binary path, overriding PATH lookup
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,

    /// Expectation: MAJOR, MAJOR.MINOR, MAJOR.MINOR.PATCH, or !MAJOR
    #[arg(long, value_name = "EXPR")]
    pub expect: Option<String>,

    /// Environment overrides for the probe (LC_ALL=...,TZ=...,TERM=...)
    #[arg(long, value_name = "KV")]
    pub env: Option<String>,

    /// Emit the observation as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run every probe listed in a manifest.
#[derive(Parser, Debug)]
#[command(about = "Run a manifest of probes and report pass/fail")]
pub struct CheckArgs {
    /// Probe manifest (JSON)
    #[arg(long, value_name = "FILE")]
    pub manifest: PathBuf,

    /// Versions config (TOML) supplying default expectations
    #[arg(long, value_name = "FILE")]
    pub versions: Option<PathBuf>,

    /// Output path for the check report JSON
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Print each failing probe as it is observed
    #[arg(long)]
    pub verbose: bool,
}

/// Generate CI matrices from the versions config.
#[derive(Parser, Debug)]
#[command(about = "Generate a CI build or image matrix as JSON")]
pub struct MatrixArgs {
    /// Versions config (TOML)
    #[arg(long, value_name = "FILE")]
    pub versions: PathBuf,

    /// Exclude the arch axis (registry-manifest mode)
    #[arg(long, conflicts_with = "images")]
    pub no_arch: bool,

    /// Emit the flat image-name list instead of the include-matrix
    #[arg(long)]
    pub images: bool,

    /// Image name prefix for --images
    #[arg(long, value_name = "NAME", default_value = "runtime")]
    pub prefix: String,
}

/// List supported runtimes.
#[derive(Parser, Debug)]
#[command(about = "List supported runtimes and their probe commands")]
pub struct RuntimesArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
