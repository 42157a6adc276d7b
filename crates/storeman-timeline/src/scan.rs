//! Log scanners: query one event kind and write it out as CSV

use std::path::{Path, PathBuf};
use storeman_core::{Result, StoremanError, TimeRange};
use storeman_logsearch_sdk::{LogQuery, LogSearch};
use tracing::info;

use crate::table::write_csv;
use crate::dedup::dedupe_by_origin_tx;
use crate::event::{EventKind, ExtractedEvent};
use crate::extract::extract_all;

/// Default page size of a log query
pub const DEFAULT_SCAN_SIZE: usize = 100;

/// Query the log backend for one event kind and extract every hit. Receive
/// events are deduplicated by origin tx.
pub async fn scan_events(
    search: &dyn LogSearch,
    network: &str,
    kind: EventKind,
    keywords: &[String],
    range: &TimeRange,
    size: usize,
) -> Result<Vec<ExtractedEvent>> {
    if keywords.is_empty() {
        return Err(StoremanError::InvalidInput(format!(
            "No log keywords configured for {} scan on network '{}'",
            kind.file_prefix(),
            network
        )));
    }

    let (gte, lte) = range.bounds();
    let query = LogQuery::new(network, keywords, gte, lte, size);
    let records = search
        .search(&query)
        .await
        .map_err(|e| StoremanError::LogSearch(e.to_string()))?;

    let events = extract_all(&records, kind);
    let events = match kind {
        EventKind::MpcReceive => dedupe_by_origin_tx(events),
        _ => events,
    };
    info!(kind = ?kind, network, range = %range, hits = records.len(), events = events.len(), "Scan complete");
    Ok(events)
}

/// `<prefix>_<network>_<stamp>.csv`
pub fn events_file_name(kind: EventKind, network: &str, stamp: &str) -> String {
    format!("{}_{}_{}.csv", kind.file_prefix(), network, stamp)
}

/// Write events of one kind to `dir` and return the file path.
pub fn write_events(
    dir: &Path,
    kind: EventKind,
    network: &str,
    stamp: &str,
    events: &[ExtractedEvent],
) -> Result<PathBuf> {
    let path = dir.join(events_file_name(kind, network, stamp));
    let rows: Vec<Vec<String>> = events.iter().map(ExtractedEvent::csv_row).collect();
    write_csv(&path, &kind.csv_headers(), &rows)?;
    Ok(path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::read_csv;
    use std::sync::Mutex;
    use storeman_logsearch_sdk::{LogSearchError, RawLogRecord};

    /// Returns canned records for queries whose first keyword matches.
    pub(crate) struct FakeLogSearch {
        pub responses: Vec<(String, Vec<RawLogRecord>)>,
        pub queries: Mutex<Vec<LogQuery>>,
        pub fail: bool,
    }

    impl FakeLogSearch {
        pub(crate) fn new() -> Self {
            Self {
                responses: Vec::new(),
                queries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub(crate) fn respond(mut self, keyword: &str, records: Vec<RawLogRecord>) -> Self {
            self.responses.push((keyword.to_string(), records));
            self
        }
    }

    #[async_trait::async_trait]
    impl LogSearch for FakeLogSearch {
        async fn search(&self, query: &LogQuery) -> storeman_logsearch_sdk::Result<Vec<RawLogRecord>> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(LogSearchError::Unauthorized);
            }
            let first = query.keywords.first().cloned().unwrap_or_default();
            Ok(self
                .responses
                .iter()
                .find(|(keyword, _)| *keyword == first)
                .map(|(_, records)| records.clone())
                .unwrap_or_default())
        }
    }

    fn keywords(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_receive_scan_dedupes() {
        let search = FakeLogSearch::new().respond(
            "rcv",
            vec![
                RawLogRecord::new("t2", r#""originTx":"0xa" rcvTime=2"#),
                RawLogRecord::new("t1", r#""originTx":"0xa" rcvTime=1"#),
                RawLogRecord::new("t0", r#""originTx":"0xb" rcvTime=0"#),
            ],
        );
        let events = scan_events(
            &search,
            "test",
            EventKind::MpcReceive,
            &keywords(&["rcv"]),
            &TimeRange::LastSeconds(3600),
            10,
        )
        .await
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, "t2");

        let queries = search.queries.lock().unwrap();
        assert_eq!(queries[0].network, "test");
        assert_eq!(queries[0].gte, "now-3600s");
        assert_eq!(queries[0].size, 10);
    }

    #[tokio::test]
    async fn test_success_scan_keeps_duplicates() {
        let search = FakeLogSearch::new().respond(
            "SignMpcTransaction",
            vec![
                RawLogRecord::new("t1", r#""originTx": "0xa""#),
                RawLogRecord::new("t0", r#""originTx": "0xa""#),
            ],
        );
        let events = scan_events(
            &search,
            "test",
            EventKind::MpcSuccess,
            &keywords(&["SignMpcTransaction", "successfully"]),
            &TimeRange::LastSeconds(60),
            DEFAULT_SCAN_SIZE,
        )
        .await
        .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_errors() {
        let search = FakeLogSearch::new();
        let err = scan_events(&search, "test", EventKind::MpcReceive, &[], &TimeRange::LastSeconds(60), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StoremanError::InvalidInput(_)));

        let mut failing = FakeLogSearch::new();
        failing.fail = true;
        let err = scan_events(&failing, "test", EventKind::Metric, &keywords(&["cpu_usage"]), &TimeRange::LastSeconds(60), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StoremanError::LogSearch(_)));
    }

    #[test]
    fn test_write_events() {
        let dir = std::env::temp_dir().join(format!("storeman-scan-{}", std::process::id()));
        let events = vec![ExtractedEvent::empty(EventKind::DstHashDiscovery, "t", "a \"b\"")];
        let path = write_events(&dir, EventKind::DstHashDiscovery, "test", "2026-01-06_12", &events).unwrap();

        assert!(path.ends_with("dstChainTxHashes_test_2026-01-06_12.csv"));
        let table = read_csv(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(table.headers, vec!["Timestamp", "OriginTx", "dstTxHash", "RawMessage"]);
        assert_eq!(table.records[0].get("RawMessage"), Some("a 'b'"));
        assert_eq!(table.records[0].get("OriginTx"), Some("N/A"));
    }
}
