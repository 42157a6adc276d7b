//! JSON-RPC batch SDK
//!
//! Sends JSON-RPC 2.0 batch arrays to an EVM-compatible node and hands the
//! responses back in request order.

mod client;
mod error;
mod retry;
mod types;

pub use client::{BatchTransport, HttpRpcClient};
pub use error::{Result, RpcError};
pub use retry::RetryPolicy;
pub use types::*;

/// Method names used by the timestamp lookups
pub mod methods {
    pub const GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";
    pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
}
