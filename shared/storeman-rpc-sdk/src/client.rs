//! JSON-RPC batch client

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::types::{RpcRequest, RpcResponse};
use crate::{RetryPolicy, Result, RpcError};

/// Anything that can execute a JSON-RPC batch
#[async_trait::async_trait]
pub trait BatchTransport: Send + Sync {
    /// Endpoint label used in logs
    fn endpoint(&self) -> &str;

    /// Send one batch. Responses are returned as received, callers reorder by id.
    async fn call_batch(&self, requests: &[RpcRequest]) -> Result<Vec<RpcResponse>>;
}

/// HTTP JSON-RPC client with an opt-in retry policy
pub struct HttpRpcClient {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpRpcClient {
    pub fn new(url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            retry,
        })
    }

    async fn send_once(&self, requests: &[RpcRequest]) -> Result<Vec<RpcResponse>> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(requests)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;
        decode_batch(body)
    }
}

/// Decode a batch reply. A single object instead of an array means the node
/// rejected the whole batch.
fn decode_batch(body: Value) -> Result<Vec<RpcResponse>> {
    if body.is_array() {
        return serde_json::from_value(body).map_err(|e| RpcError::Decode(e.to_string()));
    }
    let message = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("unexpected non-batch response: {}", body));
    Err(RpcError::Decode(message))
}

#[async_trait::async_trait]
impl BatchTransport for HttpRpcClient {
    fn endpoint(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self, requests), fields(url = %self.url, batch = requests.len()))]
    async fn call_batch(&self, requests: &[RpcRequest]) -> Result<Vec<RpcResponse>> {
        let mut attempt = 1;
        loop {
            match self.send_once(requests).await {
                Ok(responses) => {
                    debug!(responses = responses.len(), attempt, "Batch call complete");
                    return Ok(responses);
                }
                Err(e) if e.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.retry.maximum_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Batch call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_batch_array() {
        let body = json!([
            { "jsonrpc": "2.0", "id": 1, "result": null },
            { "jsonrpc": "2.0", "id": 0, "result": { "blockNumber": "0x10" } }
        ]);
        let responses = decode_batch(body).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id(), Some(1));
    }

    #[test]
    fn test_decode_batch_rejected() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": -32005, "message": "daily request count exceeded" }
        });
        let err = decode_batch(body).unwrap_err();
        assert!(err.to_string().contains("daily request count exceeded"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = HttpRpcClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            RetryPolicy::no_retry(),
        )
        .unwrap();
        let result = client
            .call_batch(&[RpcRequest::transaction_by_hash(0, "0xabc")])
            .await;
        assert!(matches!(result, Err(RpcError::Http(_))));
    }
}
