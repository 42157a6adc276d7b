//! Log search HTTP client

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::types::{LogQuery, RawLogRecord, SearchResponse};
use crate::{LogSearchError, Result};

/// Source of raw log records
#[async_trait::async_trait]
pub trait LogSearch: Send + Sync {
    /// Run one query; records come back newest first.
    async fn search(&self, query: &LogQuery) -> Result<Vec<RawLogRecord>>;
}

/// Basic auth credentials passed through to the backend
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Elasticsearch `_search` client
pub struct LogSearchClient {
    client: Client,
    url: String,
    credentials: Option<Credentials>,
}

impl LogSearchClient {
    pub fn new(url: &str, credentials: Option<Credentials>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            credentials,
        })
    }
}

#[async_trait::async_trait]
impl LogSearch for LogSearchClient {
    #[instrument(skip(self, query), fields(network = %query.network, size = query.size))]
    async fn search(&self, query: &LogQuery) -> Result<Vec<RawLogRecord>> {
        let body = query.to_body();
        debug!(url = %self.url, query = %body, "Sending log search");

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let parsed: SearchResponse = response
                .json()
                .await
                .map_err(|e| LogSearchError::Decode(e.to_string()))?;
            let records = parsed.into_records();
            info!(keywords = ?query.keywords, hits = records.len(), "Log search complete");
            Ok(records)
        } else if status.as_u16() == 401 {
            Err(LogSearchError::Unauthorized)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(LogSearchError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
