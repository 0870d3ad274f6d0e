//! HTTP client for the external ledger node.
//!
//! The middleware is strictly a client of the node's published API: it
//! submits signed records in commit mode and queries record and block
//! details for display. One attempt per call, no retries.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::transaction::LedgerTransaction;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger node unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("ledger node rejected the record ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}

/// Input as returned by the node's query API.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailInput {
    #[serde(default)]
    pub owners_before: Vec<String>,
    #[serde(default)]
    pub fulfillment: Option<String>,
}

/// Output as returned by the node's query API.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailOutput {
    #[serde(default)]
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailAsset {
    #[serde(default)]
    pub data: Value,
}

/// Committed record detail fetched for enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerRecordDetail {
    pub id: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub inputs: Vec<DetailInput>,
    #[serde(default)]
    pub outputs: Vec<DetailOutput>,
    #[serde(default)]
    pub asset: DetailAsset,
}

/// Client for the ledger node's transaction and block API.
pub struct LedgerClient {
    client: Client,
    api_url: String,
}

impl LedgerClient {
    pub fn new(api_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit a signed record in commit mode and return the
    /// ledger-assigned identifier once the node acknowledges it.
    pub async fn submit_commit(&self, record: &LedgerTransaction) -> Result<String, LedgerError> {
        let url = format!("{}/api/v1/transactions?mode=commit", self.api_url);
        let response = self.client.post(&url).json(record).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let body: Value = response.json().await?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::InvalidResponse("commit response missing record id".to_string()))
    }

    /// Fetch a committed record's detail.
    pub async fn get_transaction(&self, id: &str) -> Result<LedgerRecordDetail, LedgerError> {
        let url = format!("{}/api/v1/transactions/{}", self.api_url, id);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Heights of the blocks containing a record; empty while the
    /// record is not yet in a block.
    pub async fn get_blocks(&self, id: &str) -> Result<Vec<Value>, LedgerError> {
        let url = format!("{}/api/v1/blocks?transaction_id={}", self.api_url, id);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = LedgerClient::new(
            "http://localhost:9984/".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(client.api_url, "http://localhost:9984");
    }

    #[test]
    fn detail_deserializes_with_missing_optionals() {
        let detail: LedgerRecordDetail =
            serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(detail.id, "abc");
        assert!(detail.inputs.is_empty());
        assert!(detail.asset.data.is_null());
    }
}
