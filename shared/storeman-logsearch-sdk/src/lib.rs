//! Log search SDK for storeman agent logs
//!
//! Issues the fixed query shape used by the ops tooling against an
//! Elasticsearch `_search` endpoint: phrase keywords ANDed over `message`,
//! an exact network `type` tag, a timestamp range and newest-first ordering.

mod client;
mod error;
mod types;

pub use client::{Credentials, LogSearch, LogSearchClient};
pub use error::{LogSearchError, Result};
pub use types::*;
