//! Query and response types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One log line as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogRecord {
    /// ISO-8601 `@timestamp` of the record
    pub timestamp: String,
    pub message: String,
}

impl RawLogRecord {
    pub fn new(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
        }
    }
}

/// Keyword + time-range query against one network's logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Exact-match value of the `type` field
    pub network: String,
    /// Phrases that must all appear in `message`
    pub keywords: Vec<String>,
    /// Lower timestamp bound, ISO-8601 or date math such as `now-86400s`
    pub gte: String,
    /// Upper timestamp bound
    pub lte: String,
    pub size: usize,
}

impl LogQuery {
    pub fn new(network: &str, keywords: &[String], gte: String, lte: String, size: usize) -> Self {
        Self {
            network: network.to_string(),
            keywords: keywords.to_vec(),
            gte,
            lte,
            size,
        }
    }

    /// Elasticsearch request body for this query.
    pub fn to_body(&self) -> Value {
        let mut must = vec![json!({ "match_phrase": { "type": self.network } })];
        must.extend(
            self.keywords
                .iter()
                .map(|keyword| json!({ "match_phrase": { "message": keyword } })),
        );

        json!({
            "size": self.size,
            "sort": [{ "@timestamp": { "order": "desc" } }],
            "query": {
                "bool": {
                    "must": must,
                    "filter": [{
                        "range": {
                            "@timestamp": { "gte": self.gte, "lte": self.lte }
                        }
                    }]
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub hits: SearchHits,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHits {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(rename = "_source")]
    pub source: HitSource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HitSource {
    #[serde(rename = "@timestamp", default)]
    pub timestamp: String,
    #[serde(default)]
    pub message: String,
}

impl SearchResponse {
    pub(crate) fn into_records(self) -> Vec<RawLogRecord> {
        self.hits
            .hits
            .into_iter()
            .map(|hit| RawLogRecord {
                timestamp: hit.source.timestamp,
                message: hit.source.message,
            })
            .collect()
    }
}
