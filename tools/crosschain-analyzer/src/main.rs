//! Crosschain Analyzer
//!
//! Ops CLI for the storeman bridge agents:
//! - Log scans for MPC signing, destination hashes and host metrics
//! - End-to-end cross-chain timeline reconstruction
//! - Duration and metrics reports over result files

mod cli;
mod commands;

use clap::Parser;
use storeman_core::{AnalyzerConfig, StoremanError};
use storeman_telemetry::{init_tracing, TelemetryConfig};
use storeman_timeline::{EventKind, CROSS_CHAIN_REPORT, METRICS_REPORT};
use tracing::{error, info};

use cli::{Cli, Command};

const SERVICE_NAME: &str = "crosschain-analyzer";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        let code = e
            .downcast_ref::<StoremanError>()
            .map(|err| {
                error!(code = err.error_code(), error = %err, "Command failed");
                err.exit_code()
            })
            .unwrap_or(1);
        eprintln!("Error: {:#}", e);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AnalyzerConfig::load(cli.config.as_deref(), cli.network.as_deref())?;
    if let Some(dir) = cli.result_dir {
        config.result_dir = dir;
    }

    let telemetry = TelemetryConfig::from_env().with_log_level(&config.log_level);
    let json_logs = telemetry.json_logs || cli.json_logs;
    init_tracing(SERVICE_NAME, &telemetry.with_json_logs(json_logs))?;

    info!(network = %config.network, result_dir = %config.result_dir.display(), "Starting {}", SERVICE_NAME);

    match cli.command {
        Command::ScanSuccess(args) => scan(&config, EventKind::MpcSuccess, args).await,
        Command::ScanReceive(args) => scan(&config, EventKind::MpcReceive, args).await,
        Command::ScanDstHashes(args) => scan(&config, EventKind::DstHashDiscovery, args).await,
        Command::ScanMetrics(args) => scan(&config, EventKind::Metric, args).await,
        Command::Timeline { range, size } => commands::timeline(&config, &range.to_range()?, size).await,
        Command::Timestamps { chain, hashes } => commands::timestamps(&config, chain.into(), &hashes).await,
        Command::AnalyzeCross { file } => commands::analyze(&CROSS_CHAIN_REPORT, &file),
        Command::AnalyzeMetrics { file } => commands::analyze(&METRICS_REPORT, &file),
        Command::Missing { receive, success, output } => {
            commands::missing(&config, &receive, &success, &output)
        }
    }
}

async fn scan(config: &AnalyzerConfig, kind: EventKind, args: cli::ScanArgs) -> anyhow::Result<()> {
    commands::scan(config, kind, &args.range.to_range()?, args.size, &args.keywords).await
}
