//! Command line surface

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storeman_core::{ChainSide, TimeRange};
use storeman_timeline::DEFAULT_SCAN_SIZE;

/// Default look-back window of a scan
const DEFAULT_PERIOD_SECS: u64 = 86_400;

#[derive(Parser, Debug)]
#[command(
    name = "crosschain-analyzer",
    version,
    about = "Storeman log scans and cross-chain transaction timelines"
)]
pub struct Cli {
    /// Network to analyze (main or test)
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory result files are written to
    #[arg(long, global = true)]
    pub result_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan MPC signing successes
    ScanSuccess(ScanArgs),

    /// Scan MPC signing requests received by the agent
    ScanReceive(ScanArgs),

    /// Scan destination chain lock transaction hashes
    ScanDstHashes(ScanArgs),

    /// Scan host metrics logged by the agent
    ScanMetrics(ScanArgs),

    /// Rebuild cross-chain timelines end to end
    Timeline {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, default_value_t = DEFAULT_SCAN_SIZE)]
        size: usize,
    },

    /// Print block timestamps of transaction hashes as JSON
    Timestamps {
        #[arg(long, value_enum)]
        chain: ChainArg,

        #[arg(required = true)]
        hashes: Vec<String>,
    },

    /// Summarize durations of a timeline detail CSV
    AnalyzeCross {
        #[arg(long)]
        file: PathBuf,
    },

    /// Summarize a metrics CSV
    AnalyzeMetrics {
        #[arg(long)]
        file: PathBuf,
    },

    /// List received requests that never produced a signature
    Missing {
        #[arg(long)]
        receive: PathBuf,

        #[arg(long)]
        success: PathBuf,

        /// Output file name inside the result directory
        #[arg(long)]
        output: String,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    #[arg(long, default_value_t = DEFAULT_SCAN_SIZE)]
    pub size: usize,

    /// Replace the configured keywords (repeatable)
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Look back this many seconds from now
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub period: Option<u64>,

    /// Range start, RFC 3339
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Range end, RFC 3339
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

impl RangeArgs {
    pub fn to_range(&self) -> anyhow::Result<TimeRange> {
        match (&self.from, &self.to, self.period) {
            (Some(from), Some(to), _) => Ok(TimeRange::between(from, to)?),
            (None, None, period) => Ok(TimeRange::LastSeconds(period.unwrap_or(DEFAULT_PERIOD_SECS))),
            _ => bail!("--from and --to must be given together"),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainArg {
    Src,
    Dst,
}

impl From<ChainArg> for ChainSide {
    fn from(chain: ChainArg) -> Self {
        match chain {
            ChainArg::Src => ChainSide::Src,
            ChainArg::Dst => ChainSide::Dst,
        }
    }
}
