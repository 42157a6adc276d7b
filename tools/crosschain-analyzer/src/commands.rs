//! Command implementations

use anyhow::Context;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storeman_core::{file_stamp, AnalyzerConfig, ChainSide, ResolverConfig, StoremanError, TimeRange};
use storeman_logsearch_sdk::{Credentials, LogSearch, LogSearchClient};
use storeman_rpc_sdk::{BatchTransport, HttpRpcClient, RetryPolicy};
use storeman_timeline::{
    analysis_path, missing_signatures, read_csv, scan_events, write_csv, write_events, EventKind,
    ReportSpec, TimelinePipeline, TimestampResolver,
};
use tracing::info;

fn log_search(config: &AnalyzerConfig) -> anyhow::Result<Arc<dyn LogSearch>> {
    let credentials = config.log_search.username.clone().map(|username| Credentials {
        username,
        password: config.log_search.password.clone(),
    });
    let client = LogSearchClient::new(
        &config.log_search.url,
        credentials,
        Duration::from_secs(config.log_search.request_timeout_secs),
    )
    .map_err(|e| StoremanError::LogSearch(e.to_string()))?;
    Ok(Arc::new(client))
}

fn retry_policy(resolver: &ResolverConfig) -> RetryPolicy {
    if resolver.max_attempts > 1 {
        RetryPolicy::exponential(
            resolver.max_attempts,
            Duration::from_millis(resolver.retry_initial_interval_ms),
        )
        .with_maximum_interval(Duration::from_millis(resolver.retry_max_interval_ms))
    } else {
        RetryPolicy::no_retry()
    }
}

fn rpc_client(config: &AnalyzerConfig, side: ChainSide) -> anyhow::Result<Arc<dyn BatchTransport>> {
    let resolver = &config.resolver;
    let client = HttpRpcClient::new(
        config.rpc_url(side)?,
        Duration::from_secs(resolver.request_timeout_secs),
        retry_policy(resolver),
    )
    .map_err(|e| StoremanError::Rpc(e.to_string()))?;
    Ok(Arc::new(client))
}

fn stamp() -> String {
    file_stamp(Utc::now())
}

pub async fn scan(
    config: &AnalyzerConfig,
    kind: EventKind,
    range: &TimeRange,
    size: usize,
    keyword_override: &[String],
) -> anyhow::Result<()> {
    let search = log_search(config)?;
    let keywords = if keyword_override.is_empty() {
        kind.keywords(&config.selected()?.keywords)
    } else {
        keyword_override
    };

    let events = scan_events(search.as_ref(), &config.network, kind, keywords, range, size).await?;
    let path = write_events(&config.result_dir, kind, &config.network, &stamp(), &events)?;
    info!(kind = ?kind, events = events.len(), path = %path.display(), "Scan results saved");
    Ok(())
}

pub async fn timeline(config: &AnalyzerConfig, range: &TimeRange, size: usize) -> anyhow::Result<()> {
    let pipeline = TimelinePipeline::new(
        config,
        log_search(config)?,
        rpc_client(config, ChainSide::Src)?,
        rpc_client(config, ChainSide::Dst)?,
    )?;

    let run = pipeline.run(range, size).await?;
    if run.timelines.is_empty() {
        info!("No timelines to write");
        return Ok(());
    }

    let outputs = run.write(&config.result_dir, pipeline.network(), &stamp())?;
    run.log_summary();
    info!(
        json = %outputs.json.display(),
        csv = %outputs.csv.display(),
        timelines = run.timelines.len(),
        "Timeline results saved"
    );
    Ok(())
}

pub async fn timestamps(config: &AnalyzerConfig, side: ChainSide, hashes: &[String]) -> anyhow::Result<()> {
    let resolver = TimestampResolver::new(rpc_client(config, side)?, config.resolver.clone());
    let resolved = resolver.resolve_transaction_timestamps(hashes).await;

    let ordered: BTreeMap<_, _> = resolved.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&ordered)?);
    Ok(())
}

/// Summarize `file` with `spec` and write the report next to it.
pub fn analyze(spec: &ReportSpec, file: &Path) -> anyhow::Result<()> {
    let table = read_csv(file)?;
    let report = spec.render(&spec.analyze(&table.records));

    let output = analysis_path(file);
    std::fs::write(&output, &report)
        .with_context(|| format!("Cannot write report {}", output.display()))?;
    print!("{}", report);
    info!(records = table.records.len(), path = %output.display(), "Analysis saved");
    Ok(())
}

pub fn missing(config: &AnalyzerConfig, receive: &Path, success: &Path, output: &str) -> anyhow::Result<()> {
    let receive = read_csv(receive)?;
    let success = read_csv(success)?;
    let missing = missing_signatures(&receive, &success);

    if missing.is_empty() {
        info!("No missing records found");
        return Ok(());
    }

    let path = config.result_dir.join(output);
    let rows: Vec<Vec<String>> = missing.iter().map(|r| r.row(&receive.headers)).collect();
    write_csv(&path, &receive.headers, &rows)?;
    info!(missing = missing.len(), path = %path.display(), "Missing records saved");
    Ok(())
}
