//! Typed events recovered from storeman and MPC log lines
//!
//! Each event kind is described by a static table of fields. The table
//! carries the field name used in code, the CSV column it is written to,
//! and the pattern whose first capture group is the value.

use storeman_core::{or_absent, KeywordSets};

use crate::duration::parse_duration;

/// JSON key the MPC signer uses for the origin block. The misspelling is what
/// the signer actually emits and must be matched as-is.
pub const ORIGIN_BLOCK_KEY: &str = "originBLock";

/// Field names shared across event kinds
pub mod field {
    pub const ORIGIN_TX: &str = "originTx";
    pub const ORIGIN_BLOCK: &str = "originBlock";
    pub const DST_TX_HASH: &str = "dstTxHash";
    pub const HASH_X: &str = "hashX";
    pub const HASH_DATA: &str = "hashData";
    pub const RECEIVE_TIME: &str = "receiveTime";
    pub const WORKING_ADDRESS: &str = "workingAddress";
    pub const SIGN_DURATION: &str = "signDuration";
    pub const SIGN_DURATION_ACTIVE: &str = "signDurationActive";
    pub const CPU_USAGE: &str = "cpu_usage";
    pub const CPU_CORES: &str = "cpu_cores";
    pub const MEM_TOTAL: &str = "mem_total";
    pub const MEM_USED: &str = "mem_used";
    pub const MEM_FREE: &str = "mem_free";
    pub const DISK_TOTAL: &str = "disk_total";
    pub const DISK_USED: &str = "disk_used";
    pub const DISK_USAGE: &str = "disk_usage";
    pub const LOAD_AVG: &str = "load_avg";
}

/// CSV columns that wrap every event row
pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const RAW_MESSAGE_COLUMN: &str = "RawMessage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MpcReceive,
    MpcSuccess,
    DstHashDiscovery,
    Metric,
}

/// How a captured value is rendered into reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    /// Raw duration string, written as normalized seconds
    Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub pattern: &'static str,
    pub value: ValueKind,
}

const fn text(name: &'static str, column: &'static str, pattern: &'static str) -> FieldSpec {
    FieldSpec { name, column, pattern, value: ValueKind::Text }
}

const fn duration(name: &'static str, column: &'static str, pattern: &'static str) -> FieldSpec {
    FieldSpec { name, column, pattern, value: ValueKind::Duration }
}

const MPC_RECEIVE_FIELDS: &[FieldSpec] = &[
    text(field::HASH_X, "HashX", r#""hashX":"(0x[a-fA-F0-9]+)""#),
    text(field::ORIGIN_TX, "OriginTx", r#""originTx":"(0x[a-fA-F0-9]+)""#),
    text(field::ORIGIN_BLOCK, "OriginBlock", r#""originBLock":(\d+)"#),
    text(field::RECEIVE_TIME, "ReceiveTime", r"rcvTime=([^\s]+)"),
    text(field::WORKING_ADDRESS, "WorkingAddress", r"workingAddress\s*=\s*(0x[a-fA-F0-9]+)"),
];

const MPC_SUCCESS_FIELDS: &[FieldSpec] = &[
    text(field::ORIGIN_TX, "OriginTx", r#""originTx"\s*:\s*"(0x[a-fA-F0-9]+)""#),
    text(field::ORIGIN_BLOCK, "OriginBlock", r#""originBLock":\s*(\d+)"#),
    text(field::HASH_DATA, "HashData", r"HashData:\s*(0x[a-fA-F0-9]+)"),
    duration(field::SIGN_DURATION, "During(s)", r"during\(sec\)=([\d.m]+s?)"),
    duration(field::SIGN_DURATION_ACTIVE, "DuringAct(s)", r"duringAct\(sec\)=([\d.m]+s?)"),
];

const DST_HASH_FIELDS: &[FieldSpec] = &[
    text(field::ORIGIN_TX, "OriginTx", r"checkTransOnline checkHash[^\w]*(0x[0-9a-fA-F]+)"),
    text(field::DST_TX_HASH, "dstTxHash", r"storemanLockTxHash\s+(0x[0-9a-fA-F]+)"),
];

const METRIC_FIELDS: &[FieldSpec] = &[
    text(field::CPU_USAGE, "CPU Usage (%)", r"cpu_usage=([\d.]+)%"),
    text(field::CPU_CORES, "CPU Cores", r"cpu_cores=(\d+)"),
    text(field::MEM_TOTAL, "Memory Total (MB)", r"mem_total=(\d+)MB"),
    text(field::MEM_USED, "Memory Used (MB)", r"mem_used=(\d+)MB"),
    text(field::MEM_FREE, "Memory Free (MB)", r"mem_free=(\d+)MB"),
    text(field::DISK_TOTAL, "Disk Total", r"disk_total=(\d+[GMK]?B?)"),
    text(field::DISK_USED, "Disk Used", r"disk_used=(\d+[GMK]?B?)"),
    text(field::DISK_USAGE, "Disk Usage", r"disk_usage=(\d+%)"),
    text(field::LOAD_AVG, "Load Average", r"load_avg=([\d.]+)"),
];

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::MpcReceive,
        EventKind::MpcSuccess,
        EventKind::DstHashDiscovery,
        EventKind::Metric,
    ];

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::MpcReceive => MPC_RECEIVE_FIELDS,
            Self::MpcSuccess => MPC_SUCCESS_FIELDS,
            Self::DstHashDiscovery => DST_HASH_FIELDS,
            Self::Metric => METRIC_FIELDS,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::MpcReceive => 0,
            Self::MpcSuccess => 1,
            Self::DstHashDiscovery => 2,
            Self::Metric => 3,
        }
    }

    /// Prefix of the result file written by the scanner for this kind.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::MpcReceive => "mpc_receive",
            Self::MpcSuccess => "mpcsuccess",
            Self::DstHashDiscovery => "dstChainTxHashes",
            Self::Metric => "metrics",
        }
    }

    pub fn keywords<'a>(&self, sets: &'a KeywordSets) -> &'a [String] {
        match self {
            Self::MpcReceive => &sets.received_mpc,
            Self::MpcSuccess => &sets.success_mpc,
            Self::DstHashDiscovery => &sets.dst_tx_hashes,
            Self::Metric => &sets.metrics,
        }
    }

    pub fn csv_headers(&self) -> Vec<&'static str> {
        let mut headers = Vec::with_capacity(self.fields().len() + 2);
        headers.push(TIMESTAMP_COLUMN);
        headers.extend(self.fields().iter().map(|f| f.column));
        headers.push(RAW_MESSAGE_COLUMN);
        headers
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }
}

/// One log line after field extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEvent {
    pub kind: EventKind,
    /// Log store `@timestamp` of the line
    pub timestamp: String,
    pub raw_message: String,
    /// Values parallel to `kind.fields()`
    values: Vec<Option<String>>,
}

impl ExtractedEvent {
    /// Event with every field absent.
    pub fn empty(kind: EventKind, timestamp: &str, raw_message: &str) -> Self {
        Self {
            kind,
            timestamp: timestamp.to_string(),
            raw_message: raw_message.to_string(),
            values: vec![None; kind.fields().len()],
        }
    }

    pub(crate) fn from_values(
        kind: EventKind,
        timestamp: &str,
        raw_message: &str,
        values: Vec<Option<String>>,
    ) -> Self {
        debug_assert_eq!(values.len(), kind.fields().len());
        Self {
            kind,
            timestamp: timestamp.to_string(),
            raw_message: raw_message.to_string(),
            values,
        }
    }

    /// Set a field by name. Names the kind does not define are ignored.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        if let Some(idx) = self.kind.position(name) {
            self.values[idx] = Some(value.to_string());
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.kind
            .position(name)
            .and_then(|idx| self.values[idx].as_deref())
    }

    pub fn origin_tx(&self) -> Option<&str> {
        self.field(field::ORIGIN_TX)
    }

    pub fn dst_tx_hash(&self) -> Option<&str> {
        self.field(field::DST_TX_HASH)
    }

    /// Total signing time as normalized seconds, absent when not logged.
    pub fn sign_duration_secs(&self) -> Option<String> {
        self.field(field::SIGN_DURATION).map(|raw| parse_duration(Some(raw)))
    }

    /// Active signing time as normalized seconds, absent when not logged.
    pub fn sign_duration_active_secs(&self) -> Option<String> {
        self.field(field::SIGN_DURATION_ACTIVE)
            .map(|raw| parse_duration(Some(raw)))
    }

    /// Row matching `kind.csv_headers()`.
    pub fn csv_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.values.len() + 2);
        row.push(self.timestamp.clone());
        for (spec, value) in self.kind.fields().iter().zip(&self.values) {
            let rendered = match (spec.value, value.as_deref()) {
                (ValueKind::Duration, Some(raw)) => parse_duration(Some(raw)),
                (_, value) => or_absent(value).to_string(),
            };
            row.push(rendered);
        }
        row.push(self.raw_message.clone());
        row
    }
}
