//! JSON-RPC wire types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::methods;

/// One request inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    /// Position of the request inside its batch
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }

    pub fn transaction_by_hash(id: u64, tx_hash: &str) -> Self {
        Self::new(id, methods::GET_TRANSACTION_BY_HASH, vec![json!(tx_hash)])
    }

    /// Header-only block lookup (`false` = no full transaction list).
    pub fn block_by_number(id: u64, block_number: &str) -> Self {
        Self::new(id, methods::GET_BLOCK_BY_NUMBER, vec![json!(block_number), json!(false)])
    }
}

/// One response inside a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id: json!(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn empty(id: u64) -> Self {
        Self {
            id: json!(id),
            result: None,
            error: None,
        }
    }

    /// Numeric id; some nodes echo ids back as strings.
    pub fn id(&self) -> Option<u64> {
        match &self.id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Decode the result, `None` for a missing/null result or a mismatched shape.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        match &self.result {
            Some(Value::Null) | None => None,
            Some(value) => serde_json::from_value(value.clone()).ok(),
        }
    }
}

/// Result of `eth_getTransactionByHash`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(default)]
    pub hash: Option<String>,
    /// Hex block number, `None` while the transaction is pending
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub block_hash: Option<String>,
}

/// Result of `eth_getBlockByNumber`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(default)]
    pub number: Option<String>,
    /// Hex seconds since the Unix epoch
    pub timestamp: String,
    #[serde(default)]
    pub hash: Option<String>,
}

impl BlockHeader {
    pub fn timestamp_secs(&self) -> Option<i64> {
        parse_hex_quantity(&self.timestamp).and_then(|v| i64::try_from(v).ok())
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_hex_quantity(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Put batch responses back into request order.
///
/// Nodes may answer a batch in any order; slot `i` holds the response whose
/// id is `i`. Responses with an unknown or duplicate id are dropped.
pub fn order_by_id(responses: Vec<RpcResponse>, len: usize) -> Vec<Option<RpcResponse>> {
    let mut slots: Vec<Option<RpcResponse>> = vec![None; len];
    for response in responses {
        match response.id().map(|id| id as usize) {
            Some(idx) if idx < len && slots[idx].is_none() => slots[idx] = Some(response),
            _ => warn!(id = %response.id, "Dropping response with unexpected id"),
        }
    }
    slots
}
