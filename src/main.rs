use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use std::str::FromStr;

use runtime_probe::check;
use runtime_probe::manifest;
use runtime_probe::matrix;
use runtime_probe::probe::{run_probe, ProbeEnv};
use runtime_probe::report::write_json;
use runtime_probe::runtime::Runtime;
use runtime_probe::version::Expectation;

mod cli;
use cli::{CheckArgs, Command, MatrixArgs, ProbeArgs, RootArgs, RuntimesArgs};

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();
    match args.command {
        Command::Probe(args) => cmd_probe(args),
        Command::Check(args) => cmd_check(args),
        Command::Matrix(args) => cmd_matrix(args),
        Command::Runtimes(args) => cmd_runtimes(args),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_probe(args: ProbeArgs) -> Result<()> {
    let env = parse_probe_env(args.env.as_deref())?;
    let observation = run_probe(args.runtime, args.binary.as_deref(), &env)?;
    if let Some(raw) = &args.expect {
        let expectation = Expectation::from_str(raw)?;
        expectation.check(args.runtime.name(), observation.version, &observation.raw)?;
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&observation)?);
    } else {
        println!(
            "{} {} ({})",
            observation.runtime.name(),
            observation.version,
            observation.binary.display()
        );
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let manifest = manifest::load_manifest(&args.manifest)?;
    manifest::validate_manifest(&manifest)?;
    let versions = args
        .versions
        .as_deref()
        .map(matrix::load_versions)
        .transpose()?;
    let report = check::run_checks(&manifest, versions.as_ref(), &ProbeEnv::default(), args.verbose);
    if let Some(out) = &args.out {
        write_json(out, &report)?;
        println!("Wrote check report to {}", out.display());
    }
    println!(
        "{} probes: {} passed, {} failed",
        report.results.len(),
        report.pass_count,
        report.fail_count
    );
    if report.fail_count > 0 {
        for result in report.results.iter().filter(|result| !result.pass) {
            eprintln!("{}: {}", result.runtime.name(), result.failures.join("; "));
        }
        return Err(anyhow!(
            "{} of {} probes failed",
            report.fail_count,
            report.results.len()
        ));
    }
    Ok(())
}

fn cmd_matrix(args: MatrixArgs) -> Result<()> {
    let config = matrix::load_versions(&args.versions)?;
    // Compact JSON on stdout, matching what CI matrix consumers expect.
    let json = if args.images {
        serde_json::to_string(&matrix::image_matrix(&config, &args.prefix))?
    } else {
        serde_json::to_string(&matrix::build_matrix(&config, !args.no_arch))?
    };
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct RuntimeInfo {
    runtime: &'static str,
    binaries: Vec<&'static str>,
    version_command: String,
    reports_on_stderr: bool,
}

fn cmd_runtimes(args: RuntimesArgs) -> Result<()> {
    let infos: Vec<RuntimeInfo> = Runtime::ALL
        .iter()
        .map(|runtime| RuntimeInfo {
            runtime: runtime.name(),
            binaries: runtime.candidates().to_vec(),
            version_command: format!(
                "{} {}",
                runtime.candidates()[0],
                runtime.version_argv().join(" ")
            ),
            reports_on_stderr: runtime.reports_on_stderr(),
        })
        .collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        for info in &infos {
            let stream = if info.reports_on_stderr {
                "stderr"
            } else {
                "stdout"
            };
            println!("{:8} {} (reports on {})", info.runtime, info.version_command, stream);
        }
    }
    Ok(())
}

fn parse_probe_env(raw: Option<&str>) -> Result<ProbeEnv> {
    let mut env = ProbeEnv::default();
    let Some(raw) = raw else {
        return Ok(env);
    };

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid env override: {pair}"))?;
        match key {
            "LC_ALL" => env.locale = value.to_string(),
            "TZ" => env.tz = value.to_string(),
            "TERM" => env.term = value.to_string(),
            _ => return Err(anyhow!("unsupported env override key: {key}")),
        }
    }
    Ok(env)
}
