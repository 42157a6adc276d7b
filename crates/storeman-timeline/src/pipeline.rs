//! End-to-end timeline reconstruction
//!
//! Scans MPC success, MPC receive and destination-hash logs for one network,
//! resolves origin transactions on the source chain and storeman lock
//! transactions on the destination chain, then correlates everything into
//! per-transaction timelines.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storeman_core::{AnalyzerConfig, KeywordSets, Result, StoremanError, TimeRange};
use storeman_logsearch_sdk::LogSearch;
use storeman_rpc_sdk::BatchTransport;
use tracing::{debug, info, warn};

use crate::correlate::correlate;
use crate::table::write_csv;
use crate::dedup::dedupe_by_origin_tx;
use crate::event::{EventKind, ExtractedEvent};
use crate::report::CROSS_CHAIN_REPORT;
use crate::resolver::{TimestampMap, TimestampResolver};
use crate::scan::scan_events;
use crate::timeline::{Timeline, TIMELINE_COLUMNS};

pub struct TimelinePipeline {
    network: String,
    keywords: KeywordSets,
    search: Arc<dyn LogSearch>,
    origin: TimestampResolver,
    destination: TimestampResolver,
}

/// Everything one run collected
#[derive(Debug, Default)]
pub struct TimelineRun {
    pub success: Vec<ExtractedEvent>,
    pub receive: Vec<ExtractedEvent>,
    pub dst_hashes: Vec<ExtractedEvent>,
    pub origin_timestamps: TimestampMap,
    pub dst_timestamps: TimestampMap,
    pub timelines: Vec<Timeline>,
}

/// Files written for one run
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineOutputs {
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl TimelinePipeline {
    pub fn new(
        config: &AnalyzerConfig,
        search: Arc<dyn LogSearch>,
        src: Arc<dyn BatchTransport>,
        dst: Arc<dyn BatchTransport>,
    ) -> Result<Self> {
        let network = config.selected()?;
        Ok(Self {
            network: config.network.clone(),
            keywords: network.keywords.clone(),
            search,
            origin: TimestampResolver::new(src, config.resolver.clone()),
            destination: TimestampResolver::new(dst, config.resolver.clone()),
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    async fn scan(&self, kind: EventKind, range: &TimeRange, size: usize) -> Result<Vec<ExtractedEvent>> {
        scan_events(
            self.search.as_ref(),
            &self.network,
            kind,
            kind.keywords(&self.keywords),
            range,
            size,
        )
        .await
    }

    pub async fn run(&self, range: &TimeRange, size: usize) -> Result<TimelineRun> {
        info!(network = %self.network, range = %range, size, "Starting timeline run");

        let success = self.scan(EventKind::MpcSuccess, range, size).await?;
        if success.is_empty() {
            info!("No MPC success transactions found");
            return Ok(TimelineRun::default());
        }

        let receive = if EventKind::MpcReceive.keywords(&self.keywords).is_empty() {
            debug!("No receive keywords configured, skipping receive scan");
            Vec::new()
        } else {
            self.scan(EventKind::MpcReceive, range, size).await?
        };

        let origin_txs: Vec<String> = dedupe_by_origin_tx(success.iter().cloned())
            .iter()
            .filter_map(|e| e.origin_tx().map(str::to_string))
            .collect();
        info!(origin_txs = origin_txs.len(), "Resolving origin transactions");
        let origin_timestamps = self.origin.resolve_transaction_timestamps(&origin_txs).await;
        if !origin_timestamps.is_empty() && origin_timestamps.values().all(|r| !r.is_resolved()) {
            return Err(StoremanError::Resolution(format!(
                "None of {} origin transactions could be resolved on the source chain",
                origin_timestamps.len()
            )));
        }

        let dst_hashes = self.scan(EventKind::DstHashDiscovery, range, size).await?;
        let dst_txs: Vec<String> = dst_hashes
            .iter()
            .filter_map(|e| e.dst_tx_hash().map(str::to_string))
            .collect();
        let dst_timestamps = self.destination.resolve_transaction_timestamps(&dst_txs).await;
        if !dst_timestamps.is_empty() && dst_timestamps.values().all(|r| !r.is_resolved()) {
            warn!(
                dst_txs = dst_timestamps.len(),
                "No destination transaction could be resolved"
            );
        }

        let timelines = correlate(&success, &receive, &dst_hashes, &origin_timestamps, &dst_timestamps);

        Ok(TimelineRun {
            success,
            receive,
            dst_hashes,
            origin_timestamps,
            dst_timestamps,
            timelines,
        })
    }
}

impl TimelineRun {
    /// Write `transactions_<net>_<stamp>.json` and `crosschain_detail_<net>_<stamp>.csv`.
    pub fn write(&self, dir: &Path, network: &str, stamp: &str) -> Result<TimelineOutputs> {
        fs::create_dir_all(dir)?;

        let json = dir.join(format!("transactions_{}_{}.json", network, stamp));
        fs::write(&json, serde_json::to_string_pretty(&self.timelines)?)?;
        info!(path = %json.display(), timelines = self.timelines.len(), "Wrote timelines");

        let csv = dir.join(format!("crosschain_detail_{}_{}.csv", network, stamp));
        let rows: Vec<Vec<String>> = self.timelines.iter().map(Timeline::csv_row).collect();
        write_csv(&csv, &TIMELINE_COLUMNS, &rows)?;

        Ok(TimelineOutputs { json, csv })
    }

    /// Log the duration statistics of this run.
    pub fn log_summary(&self) {
        for (field, stats) in CROSS_CHAIN_REPORT.analyze(&self.timelines) {
            info!(
                field = field.name,
                count = stats.count,
                min = stats.min,
                max = stats.max,
                average = stats.average,
                median = stats.median,
                "Duration summary"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv;
    use crate::resolver::tests::{fast_config, FakeChain};
    use crate::scan::tests::FakeLogSearch;
    use storeman_logsearch_sdk::RawLogRecord;

    const SUCCESS_MSG: &str = r#"SignMpcTransaction successfully "originTx": "0xa1" "originBLock": 5 during(sec)=2m duringAct(sec)=1m30s"#;
    const DST_MSG: &str = "checkTransOnline checkHash 0xa1 storemanLockTxHash 0xd1";

    fn config() -> AnalyzerConfig {
        let mut config = AnalyzerConfig::default();
        config.resolver = fast_config(50, 20);
        config
    }

    fn search() -> FakeLogSearch {
        FakeLogSearch::new()
            .respond(
                "SignMpcTransaction",
                vec![RawLogRecord::new("2026-01-05T10:00:30Z", SUCCESS_MSG)],
            )
            .respond(
                "checkTransOnline checkHash",
                vec![RawLogRecord::new("2026-01-05T10:01:00Z", DST_MSG)],
            )
    }

    fn pipeline(search: FakeLogSearch, src: FakeChain, dst: FakeChain) -> TimelinePipeline {
        TimelinePipeline::new(&config(), Arc::new(search), Arc::new(src), Arc::new(dst)).unwrap()
    }

    #[tokio::test]
    async fn test_full_run() {
        let src = FakeChain::new().with_tx("0xa1", Some("0x5")).with_block("0x5", 1_767_606_930);
        let dst = FakeChain::new().with_tx("0xd1", Some("0x9")).with_block("0x9", 1_767_607_290);
        let run = pipeline(search(), src, dst)
            .run(&TimeRange::LastSeconds(86400), 100)
            .await
            .unwrap();

        assert_eq!(run.timelines.len(), 1);
        let t = &run.timelines[0];
        assert_eq!(t.origin_tx, "0xa1");
        assert_eq!(t.dst_tx_hash.as_deref(), Some("0xd1"));
        assert_eq!(t.cross_during, Some(360));
        assert_eq!(t.mpc_return_ts, Some(1_767_607_230));
        assert_eq!(t.agent_approve_during, Some(30));
        assert_eq!(t.agent_req_sign_during, Some(180));
        assert!(run.receive.is_empty());
    }

    #[tokio::test]
    async fn test_no_success_events_is_empty_run() {
        let run = pipeline(FakeLogSearch::new(), FakeChain::new(), FakeChain::new())
            .run(&TimeRange::LastSeconds(60), 100)
            .await
            .unwrap();
        assert!(run.timelines.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_origins_are_fatal() {
        let err = pipeline(search(), FakeChain::new(), FakeChain::new())
            .run(&TimeRange::LastSeconds(60), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, StoremanError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_unresolved_destination_leaves_cross_end_absent() {
        let src = FakeChain::new().with_tx("0xa1", Some("0x5")).with_block("0x5", 1_767_606_930);
        let run = pipeline(search(), src, FakeChain::new())
            .run(&TimeRange::LastSeconds(60), 100)
            .await
            .unwrap();

        let t = &run.timelines[0];
        assert_eq!(t.cross_start_ts, Some(1_767_606_930));
        assert_eq!(t.cross_end_ts, None);
        assert_eq!(t.cross_during, None);
    }

    #[test]
    fn test_write_outputs() {
        let dir = std::env::temp_dir().join(format!("storeman-pipeline-{}", std::process::id()));
        let run = TimelineRun {
            timelines: vec![Timeline {
                origin_tx: "0xa1".to_string(),
                cross_during: Some(12),
                ..Timeline::default()
            }],
            ..TimelineRun::default()
        };
        let outputs = run.write(&dir, "test", "2026-01-06_12").unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&outputs.json).unwrap()).unwrap();
        let table = read_csv(&outputs.csv).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(outputs.json.ends_with("transactions_test_2026-01-06_12.json"));
        assert_eq!(json[0]["crossDuring"], "12");
        assert_eq!(json[0]["dstTxHash"], "N/A");
        assert_eq!(table.headers.len(), TIMELINE_COLUMNS.len());
        assert_eq!(Timeline::from_record(&table.records[0]), Some(run.timelines[0].clone()));
    }
}
