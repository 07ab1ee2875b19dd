//! fleet-warmer: 函数预热调度命令行工具
//!
//! Usage:
//!   fleet-warmer run --config <src>                     Forecast, plan and warm the fleet
//!   fleet-warmer plan --config <src>                    Dry run: print the batch plan
//!   fleet-warmer estimate <runtime> <mb> [--isolated]   Estimate cold-start latency

use anyhow::{bail, Context, Result};
use fleet_warmer::config::provider_for_source;
use fleet_warmer::metrics::HttpMetadataProvider;
use fleet_warmer::transport::HttpTransport;
use fleet_warmer::{Orchestrator, RunContext, StartupTimeEstimator};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => cmd_run(&args[2..], false).await,
        "plan" => cmd_run(&args[2..], true).await,
        "estimate" => cmd_estimate(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"fleet-warmer: 函数预热调度工具

USAGE:
    fleet-warmer <COMMAND> [OPTIONS]

COMMANDS:
    run --config <src>                  Collect metrics, forecast, plan and warm the fleet
    plan --config <src>                 Same as run, but only print the batch plan
    estimate <runtime> <memory_mb> [--isolated]
                                        Estimate cold-start latency in milliseconds
    version                             Show version information
    help                                Show this help message

    <src> is a YAML/JSON file path or an http(s) URL.

ENVIRONMENT:
    WARMER_STAGE                        Deployment stage (default: dev)
    WARMER_FORECAST_HORIZON             Periods to forecast (default: 3)
    WARMER_SMOOTHING_LEVEL              Smoothing level (default: 0.5)
    WARMER_METADATA_URL                 Metrics and settings service base URL
    WARMER_INVOKE_ENDPOINT              Invocation endpoint template with {{region}}
    WARMER_INVOKE_TOKEN                 Optional bearer token
    RUST_LOG                            Log filter, e.g. fleet_warmer=debug"#
    );
}

fn cmd_version() {
    println!("fleet-warmer {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

async fn cmd_run(args: &[String], dry_run: bool) -> Result<()> {
    let Some(source) = flag_value(args, "--config") else {
        bail!("missing --config <src>");
    };

    let config = provider_for_source(source)?
        .load()
        .await
        .with_context(|| format!("loading {source}"))?;

    let transport = HttpTransport::new().context("building the HTTP transport")?;
    let metadata = Arc::new(HttpMetadataProvider::from_env(transport.clone())?);
    let orchestrator = Orchestrator::new(
        RunContext::from_env(),
        metadata.clone(),
        metadata,
        Arc::new(transport),
    );

    if dry_run {
        let plan = orchestrator.plan_only(&config).await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let report = orchestrator.run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.failed_calls > 0 {
        eprintln!(
            "{} of {} warm-up calls failed",
            report.failed_calls, report.total_calls
        );
    }
    Ok(())
}

fn cmd_estimate(args: &[String]) -> Result<()> {
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let [runtime, memory] = positional.as_slice() else {
        bail!("usage: fleet-warmer estimate <runtime> <memory_mb> [--isolated]");
    };
    let memory: u32 = memory
        .parse()
        .with_context(|| format!("invalid memory size '{memory}'"))?;
    let isolated = args.iter().any(|a| a == "--isolated");

    let ms = StartupTimeEstimator::new().estimate(runtime, memory, isolated);
    println!("{ms}");
    Ok(())
}
