//! Transaction hash to block timestamp resolution
//!
//! Resolution runs in two batched stages against one chain:
//!
//! 1. `eth_getTransactionByHash` for every distinct hash, giving a block number
//! 2. `eth_getBlockByNumber` for every distinct block number, giving a timestamp
//!
//! Batches go through a single-worker queue so that at most one request is in
//! flight per chain, with a configurable pause between consecutive batches.
//! Failures are recorded per hash and never abort the run.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use storeman_core::ResolverConfig;
use storeman_rpc_sdk::{order_by_id, BatchTransport, BlockHeader, RpcRequest, RpcResponse, TransactionInfo};
use tracing::{debug, error, info, warn};

pub const TX_NOT_FOUND: &str = "Transaction not found";
pub const BLOCK_TIMESTAMP_NOT_FOUND: &str = "Block timestamp not found";

/// Outcome of resolving one transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TimestampRecord {
    Resolved {
        #[serde(rename = "blockNumber")]
        block_number: String,
        timestamp: i64,
    },
    Failed { error: String },
}

impl TimestampRecord {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed { error: reason.into() }
    }

    /// Block timestamp in seconds, if resolved.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::Resolved { timestamp, .. } => Some(*timestamp),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

pub type TimestampMap = HashMap<String, TimestampRecord>;

/// Look up the block timestamp of `hash`, absent when missing or failed.
pub fn timestamp_of(map: &TimestampMap, hash: &str) -> Option<i64> {
    map.get(hash).and_then(TimestampRecord::timestamp)
}

/// Block number per transaction, or the reason it is unknown
type BlockLookup = HashMap<String, Result<String, String>>;

pub struct TimestampResolver {
    transport: Arc<dyn BatchTransport>,
    config: ResolverConfig,
}

impl TimestampResolver {
    pub fn new(transport: Arc<dyn BatchTransport>, config: ResolverConfig) -> Self {
        Self { transport, config }
    }

    /// Resolve each distinct hash to its block timestamp. The result holds an
    /// entry for every distinct input hash.
    pub async fn resolve_transaction_timestamps(&self, hashes: &[String]) -> TimestampMap {
        let unique = distinct(hashes.iter().map(String::as_str));
        if unique.is_empty() {
            debug!(endpoint = self.transport.endpoint(), "No transaction hashes to resolve");
            return TimestampMap::new();
        }

        info!(
            endpoint = self.transport.endpoint(),
            transactions = unique.len(),
            batch_size = self.config.tx_batch_size,
            "Resolving transaction timestamps"
        );

        let blocks_by_tx = self.resolve_block_numbers(&unique).await;
        let block_ids = distinct(
            unique
                .iter()
                .filter_map(|hash| blocks_by_tx.get(hash).and_then(|r| r.as_ref().ok()))
                .map(String::as_str),
        );
        let block_timestamps = self.resolve_block_timestamps(&block_ids).await;

        let mut resolved = TimestampMap::with_capacity(unique.len());
        for hash in unique {
            let record = match blocks_by_tx.get(&hash) {
                Some(Ok(block)) => match block_timestamps.get(block).copied().flatten() {
                    Some(timestamp) => TimestampRecord::Resolved {
                        block_number: block.clone(),
                        timestamp,
                    },
                    None => TimestampRecord::failed(BLOCK_TIMESTAMP_NOT_FOUND),
                },
                Some(Err(reason)) => TimestampRecord::failed(reason.clone()),
                None => TimestampRecord::failed(TX_NOT_FOUND),
            };
            resolved.insert(hash, record);
        }

        let ok = resolved.values().filter(|r| r.is_resolved()).count();
        info!(
            endpoint = self.transport.endpoint(),
            resolved = ok,
            failed = resolved.len() - ok,
            "Transaction timestamps resolved"
        );
        resolved
    }

    /// Stage 1: block number per hash.
    async fn resolve_block_numbers(&self, hashes: &[String]) -> BlockLookup {
        let mut lookup = BlockLookup::with_capacity(hashes.len());
        let mut queue: VecDeque<&[String]> = hashes.chunks(self.config.tx_batch_size.max(1)).collect();
        let total = queue.len();
        let mut batch_no = 0;

        while let Some(batch) = queue.pop_front() {
            batch_no += 1;
            debug!(batch = batch_no, total, size = batch.len(), "Sending transaction batch");

            let requests: Vec<RpcRequest> = batch
                .iter()
                .enumerate()
                .map(|(idx, hash)| RpcRequest::transaction_by_hash(idx as u64, hash))
                .collect();

            match self.transport.call_batch(&requests).await {
                Ok(responses) => {
                    for (hash, slot) in batch.iter().zip(order_by_id(responses, batch.len())) {
                        lookup.insert(hash.clone(), block_number_of(hash, slot.as_ref()));
                    }
                }
                Err(e) => {
                    error!(batch = batch_no, total, error = %e, "Transaction batch failed");
                    let reason = e.to_string();
                    for hash in batch {
                        lookup.insert(hash.clone(), Err(reason.clone()));
                    }
                }
            }

            if !queue.is_empty() {
                pause(self.config.tx_batch_delay()).await;
            }
        }

        lookup
    }

    /// Stage 2: timestamp per distinct block number. Blocks that cannot be
    /// fetched map to `None`.
    pub async fn resolve_block_timestamps(&self, blocks: &[String]) -> HashMap<String, Option<i64>> {
        let mut timestamps = HashMap::with_capacity(blocks.len());
        let mut queue: VecDeque<&[String]> = blocks.chunks(self.config.block_batch_size.max(1)).collect();
        let total = queue.len();
        let mut batch_no = 0;

        while let Some(batch) = queue.pop_front() {
            batch_no += 1;
            debug!(batch = batch_no, total, size = batch.len(), "Sending block batch");

            let requests: Vec<RpcRequest> = batch
                .iter()
                .enumerate()
                .map(|(idx, block)| RpcRequest::block_by_number(idx as u64, block))
                .collect();

            match self.transport.call_batch(&requests).await {
                Ok(responses) => {
                    for (block, slot) in batch.iter().zip(order_by_id(responses, batch.len())) {
                        let timestamp = slot
                            .as_ref()
                            .and_then(|r| r.decode::<BlockHeader>())
                            .and_then(|header| header.timestamp_secs());
                        if timestamp.is_none() {
                            warn!(block = %block, "No timestamp for block");
                        }
                        timestamps.insert(block.clone(), timestamp);
                    }
                }
                Err(e) => {
                    error!(batch = batch_no, total, error = %e, "Block batch failed");
                    for block in batch {
                        timestamps.insert(block.clone(), None);
                    }
                }
            }

            if !queue.is_empty() {
                pause(self.config.block_batch_delay()).await;
            }
        }

        timestamps
    }
}

fn block_number_of(hash: &str, response: Option<&RpcResponse>) -> Result<String, String> {
    let Some(response) = response else {
        warn!(tx_hash = hash, "No response for transaction");
        return Err(TX_NOT_FOUND.to_string());
    };
    if let Some(err) = &response.error {
        warn!(tx_hash = hash, code = err.code, message = %err.message, "Transaction lookup returned an error");
        return Err(TX_NOT_FOUND.to_string());
    }
    match response.decode::<TransactionInfo>() {
        Some(TransactionInfo { block_number: Some(block), .. }) => Ok(block),
        // Pending: known to the node but not yet in a block
        Some(_) => {
            debug!(tx_hash = hash, "Transaction is pending");
            Err(BLOCK_TIMESTAMP_NOT_FOUND.to_string())
        }
        None => {
            warn!(tx_hash = hash, "Transaction not found");
            Err(TX_NOT_FOUND.to_string())
        }
    }
}

/// Distinct values in first-seen order.
fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use storeman_rpc_sdk::{methods, RpcError};

    /// In-memory chain: tx hash -> block, block -> timestamp.
    pub(crate) struct FakeChain {
        pub txs: HashMap<String, Option<String>>,
        pub blocks: HashMap<String, i64>,
        pub fail_tx_batches: bool,
        pub reverse_responses: bool,
        pub calls: Mutex<Vec<(String, usize)>>,
    }

    impl FakeChain {
        pub(crate) fn new() -> Self {
            Self {
                txs: HashMap::new(),
                blocks: HashMap::new(),
                fail_tx_batches: false,
                reverse_responses: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_tx(mut self, hash: &str, block: Option<&str>) -> Self {
            self.txs.insert(hash.to_string(), block.map(str::to_string));
            self
        }

        pub(crate) fn with_block(mut self, block: &str, timestamp: i64) -> Self {
            self.blocks.insert(block.to_string(), timestamp);
            self
        }

        fn answer(&self, request: &RpcRequest) -> RpcResponse {
            let key = request.params[0].as_str().unwrap_or_default();
            if request.method == methods::GET_TRANSACTION_BY_HASH {
                match self.txs.get(key) {
                    Some(block) => RpcResponse::ok(
                        request.id,
                        json!({ "hash": key, "blockNumber": block }),
                    ),
                    None => RpcResponse::ok(request.id, Value::Null),
                }
            } else {
                match self.blocks.get(key) {
                    Some(ts) => RpcResponse::ok(
                        request.id,
                        json!({ "number": key, "timestamp": format!("0x{:x}", ts) }),
                    ),
                    None => RpcResponse::empty(request.id),
                }
            }
        }
    }

    #[async_trait::async_trait]
    impl BatchTransport for FakeChain {
        fn endpoint(&self) -> &str {
            "fake"
        }

        async fn call_batch(&self, requests: &[RpcRequest]) -> storeman_rpc_sdk::Result<Vec<RpcResponse>> {
            let method = requests.first().map(|r| r.method.clone()).unwrap_or_default();
            self.calls.lock().unwrap().push((method.clone(), requests.len()));
            if self.fail_tx_batches && method == methods::GET_TRANSACTION_BY_HASH {
                return Err(RpcError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            let mut responses: Vec<RpcResponse> = requests.iter().map(|r| self.answer(r)).collect();
            if self.reverse_responses {
                responses.reverse();
            }
            Ok(responses)
        }
    }

    pub(crate) fn fast_config(tx_batch_size: usize, block_batch_size: usize) -> ResolverConfig {
        ResolverConfig {
            tx_batch_size,
            block_batch_size,
            tx_batch_delay_ms: 0,
            block_batch_delay_ms: 0,
            ..ResolverConfig::default()
        }
    }

    fn hashes(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_resolves_shared_block_once() {
        let chain = Arc::new(
            FakeChain::new()
                .with_tx("0xa", Some("0x10"))
                .with_tx("0xb", Some("0x10"))
                .with_tx("0xc", Some("0x11"))
                .with_block("0x10", 1_000)
                .with_block("0x11", 1_012),
        );
        let resolver = TimestampResolver::new(chain.clone(), fast_config(50, 20));
        let map = resolver
            .resolve_transaction_timestamps(&hashes(&["0xa", "0xb", "0xc", "0xa"]))
            .await;

        assert_eq!(map.len(), 3);
        assert_eq!(timestamp_of(&map, "0xa"), Some(1_000));
        assert_eq!(timestamp_of(&map, "0xb"), Some(1_000));
        assert_eq!(
            map["0xc"],
            TimestampRecord::Resolved {
                block_number: "0x11".to_string(),
                timestamp: 1_012
            }
        );

        let calls = chain.calls.lock().unwrap();
        assert_eq!(calls[0], (methods::GET_TRANSACTION_BY_HASH.to_string(), 3));
        assert_eq!(calls[1], (methods::GET_BLOCK_BY_NUMBER.to_string(), 2));
    }

    #[tokio::test]
    async fn test_missing_and_pending_transactions() {
        let chain = Arc::new(
            FakeChain::new()
                .with_tx("0xpending", None)
                .with_tx("0xorphan", Some("0x99"))
                .with_tx("0xok", Some("0x10"))
                .with_block("0x10", 7),
        );
        let resolver = TimestampResolver::new(chain, fast_config(50, 20));
        let map = resolver
            .resolve_transaction_timestamps(&hashes(&["0xmissing", "0xpending", "0xorphan", "0xok"]))
            .await;

        assert_eq!(map["0xmissing"], TimestampRecord::failed(TX_NOT_FOUND));
        assert_eq!(map["0xpending"], TimestampRecord::failed(BLOCK_TIMESTAMP_NOT_FOUND));
        assert_eq!(map["0xorphan"], TimestampRecord::failed(BLOCK_TIMESTAMP_NOT_FOUND));
        assert_eq!(timestamp_of(&map, "0xok"), Some(7));
    }

    #[tokio::test]
    async fn test_batches_follow_configured_size() {
        let mut chain = FakeChain::new();
        let mut input = Vec::new();
        for i in 0..5 {
            let hash = format!("0x{}", i);
            chain = chain.with_tx(&hash, Some("0x1"));
            input.push(hash);
        }
        let chain = Arc::new(chain.with_block("0x1", 1));
        let resolver = TimestampResolver::new(chain.clone(), fast_config(2, 20));
        let map = resolver.resolve_transaction_timestamps(&input).await;

        assert_eq!(map.len(), 5);
        let sizes: Vec<usize> = chain
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(method, _)| method == methods::GET_TRANSACTION_BY_HASH)
            .map(|(_, size)| *size)
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_out_of_order_responses_are_matched_by_id() {
        let mut chain = FakeChain::new()
            .with_tx("0xa", Some("0x1"))
            .with_tx("0xb", Some("0x2"))
            .with_block("0x1", 100)
            .with_block("0x2", 200);
        chain.reverse_responses = true;
        let resolver = TimestampResolver::new(Arc::new(chain), fast_config(50, 20));
        let map = resolver.resolve_transaction_timestamps(&hashes(&["0xa", "0xb"])).await;

        assert_eq!(timestamp_of(&map, "0xa"), Some(100));
        assert_eq!(timestamp_of(&map, "0xb"), Some(200));
    }

    #[tokio::test]
    async fn test_transport_failure_marks_whole_batch() {
        let mut chain = FakeChain::new().with_tx("0xa", Some("0x1")).with_block("0x1", 1);
        chain.fail_tx_batches = true;
        let resolver = TimestampResolver::new(Arc::new(chain), fast_config(50, 20));
        let map = resolver.resolve_transaction_timestamps(&hashes(&["0xa", "0xb"])).await;

        assert_eq!(map.len(), 2);
        for record in map.values() {
            match record {
                TimestampRecord::Failed { error } => assert!(error.contains("503")),
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let chain = Arc::new(FakeChain::new());
        let resolver = TimestampResolver::new(chain.clone(), fast_config(50, 20));
        let map = resolver.resolve_transaction_timestamps(&[]).await;

        assert!(map.is_empty());
        assert!(chain.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_record_serialization() {
        let resolved = TimestampRecord::Resolved {
            block_number: "0x10".to_string(),
            timestamp: 16,
        };
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({ "blockNumber": "0x10", "timestamp": 16 })
        );
        assert_eq!(
            serde_json::to_value(TimestampRecord::failed(TX_NOT_FOUND)).unwrap(),
            json!({ "error": "Transaction not found" })
        );
    }
}
