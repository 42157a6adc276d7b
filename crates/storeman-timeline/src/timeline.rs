//! Per-transaction cross-chain timeline record

use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Display;
use storeman_core::{absent, from_absent, ABSENT};

use crate::table::CsvRecord;
use crate::stats::FieldSource;

/// Column names of the detail report, in order
pub mod column {
    pub const ORIGIN_TX: &str = "originTx";
    pub const DST_TX_HASH: &str = "dstTxHash";
    pub const CROSS_START_TS: &str = "crossStartTS";
    pub const CROSS_END_TS: &str = "crossEndTS";
    pub const CROSS_DURING: &str = "crossDuring";
    pub const MPC_RECEIVE_TS: &str = "MpcReceiveTS";
    pub const MPC_RETURN_TS: &str = "MpcReturnTS";
    pub const MPC_SIGN_DURING: &str = "MpcSignDuring";
    pub const MPC_SIGN_DURING_ACT: &str = "MpcSignDuringAct";
    pub const AGENT_APPROVE_DURING: &str = "AgentApproveDuring";
    pub const AGENT_REQ_SIGN_DURING: &str = "AgentReqSignDuring";
    pub const RAW_MESSAGE: &str = "rawMessage";
}

pub const TIMELINE_COLUMNS: [&str; 12] = [
    column::ORIGIN_TX,
    column::DST_TX_HASH,
    column::CROSS_START_TS,
    column::CROSS_END_TS,
    column::CROSS_DURING,
    column::MPC_RECEIVE_TS,
    column::MPC_RETURN_TS,
    column::MPC_SIGN_DURING,
    column::MPC_SIGN_DURING_ACT,
    column::AGENT_APPROVE_DURING,
    column::AGENT_REQ_SIGN_DURING,
    column::RAW_MESSAGE,
];

/// Timestamps are Unix seconds, durations whole seconds except the signer's
/// own durations which keep their six-decimal rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    #[serde(rename = "originTx")]
    pub origin_tx: String,
    #[serde(rename = "dstTxHash", serialize_with = "absent::serialize")]
    pub dst_tx_hash: Option<String>,
    #[serde(rename = "crossStartTS", serialize_with = "absent::serialize")]
    pub cross_start_ts: Option<i64>,
    #[serde(rename = "crossEndTS", serialize_with = "absent::serialize")]
    pub cross_end_ts: Option<i64>,
    #[serde(rename = "crossDuring", serialize_with = "absent::serialize")]
    pub cross_during: Option<i64>,
    #[serde(rename = "MpcReceiveTS", serialize_with = "absent::serialize")]
    pub mpc_receive_ts: Option<i64>,
    #[serde(rename = "MpcReturnTS", serialize_with = "absent::serialize")]
    pub mpc_return_ts: Option<i64>,
    #[serde(rename = "MpcSignDuring", serialize_with = "absent::serialize")]
    pub mpc_sign_during: Option<String>,
    #[serde(rename = "MpcSignDuringAct", serialize_with = "absent::serialize")]
    pub mpc_sign_during_act: Option<String>,
    #[serde(rename = "AgentApproveDuring", serialize_with = "absent::serialize")]
    pub agent_approve_during: Option<i64>,
    #[serde(rename = "AgentReqSignDuring", serialize_with = "absent::serialize")]
    pub agent_req_sign_during: Option<i64>,
    #[serde(rename = "rawMessage")]
    pub raw_message: String,
}

fn render<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| ABSENT.to_string())
}

impl Timeline {
    /// Value of one report column, `None` for absent values and unknown columns.
    pub fn value(&self, col: &str) -> Option<String> {
        match col {
            column::ORIGIN_TX => Some(self.origin_tx.clone()),
            column::RAW_MESSAGE => Some(self.raw_message.clone()),
            column::DST_TX_HASH => self.dst_tx_hash.clone(),
            column::CROSS_START_TS => self.cross_start_ts.map(|v| v.to_string()),
            column::CROSS_END_TS => self.cross_end_ts.map(|v| v.to_string()),
            column::CROSS_DURING => self.cross_during.map(|v| v.to_string()),
            column::MPC_RECEIVE_TS => self.mpc_receive_ts.map(|v| v.to_string()),
            column::MPC_RETURN_TS => self.mpc_return_ts.map(|v| v.to_string()),
            column::MPC_SIGN_DURING => self.mpc_sign_during.clone(),
            column::MPC_SIGN_DURING_ACT => self.mpc_sign_during_act.clone(),
            column::AGENT_APPROVE_DURING => self.agent_approve_during.map(|v| v.to_string()),
            column::AGENT_REQ_SIGN_DURING => self.agent_req_sign_during.map(|v| v.to_string()),
            _ => None,
        }
    }

    /// Row matching [`TIMELINE_COLUMNS`].
    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.origin_tx.clone(),
            render(&self.dst_tx_hash),
            render(&self.cross_start_ts),
            render(&self.cross_end_ts),
            render(&self.cross_during),
            render(&self.mpc_receive_ts),
            render(&self.mpc_return_ts),
            render(&self.mpc_sign_during),
            render(&self.mpc_sign_during_act),
            render(&self.agent_approve_during),
            render(&self.agent_req_sign_during),
            self.raw_message.clone(),
        ]
    }

    /// Rebuild a timeline from a detail report row. `None` without an origin tx.
    pub fn from_record(record: &CsvRecord) -> Option<Self> {
        let text = |col: &str| record.get(col).and_then(from_absent).map(str::to_string);
        let int = |col: &str| record.get(col).and_then(from_absent).and_then(|v| v.parse::<i64>().ok());

        Some(Self {
            origin_tx: text(column::ORIGIN_TX)?,
            dst_tx_hash: text(column::DST_TX_HASH),
            cross_start_ts: int(column::CROSS_START_TS),
            cross_end_ts: int(column::CROSS_END_TS),
            cross_during: int(column::CROSS_DURING),
            mpc_receive_ts: int(column::MPC_RECEIVE_TS),
            mpc_return_ts: int(column::MPC_RETURN_TS),
            mpc_sign_during: text(column::MPC_SIGN_DURING),
            mpc_sign_during_act: text(column::MPC_SIGN_DURING_ACT),
            agent_approve_during: int(column::AGENT_APPROVE_DURING),
            agent_req_sign_during: int(column::AGENT_REQ_SIGN_DURING),
            raw_message: record.get(column::RAW_MESSAGE).unwrap_or_default().to_string(),
        })
    }
}

impl FieldSource for Timeline {
    fn field_value(&self, field: &str) -> Option<Cow<'_, str>> {
        self.value(field).map(Cow::Owned)
    }
}
