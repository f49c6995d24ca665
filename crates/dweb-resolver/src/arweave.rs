//! Arweave record resolution
//!
//! An `arweave://` content hash may point at a PST-style contract whose
//! state holds a `records` map of name prefix -> `{ transactionId }`. The
//! longest prefix of the ENS name wins, then the `@` record, and if neither
//! applies the content hash itself is served.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{ResolverError, Result};
use dweb_core::ArweaveConfig;

/// Reads the current state of an Arweave smart contract
#[async_trait]
pub trait ContractStateReader: Send + Sync {
    async fn read_state(&self, contract_id: &str) -> Result<Value>;
}

/// Contract state from a Warp DRE node: `GET {endpoint}?id={contract}`
pub struct WarpStateReader {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl WarpStateReader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &ArweaveConfig) -> Result<Self> {
        Self::new(
            config.state_endpoint.clone(),
            Duration::from_millis(config.state_timeout_ms),
        )
    }
}

#[async_trait]
impl ContractStateReader for WarpStateReader {
    async fn read_state(&self, contract_id: &str) -> Result<Value> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id", contract_id)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolverError::Timeout {
                        operation: "arweave contract state",
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    e.into()
                }
            })?
            .error_for_status()?;

        let mut body: Value = response.json().await?;
        Ok(body.get_mut("state").map(Value::take).unwrap_or(Value::Null))
    }
}

/// `resolveArweave` capability consumed by the orchestrator
#[async_trait]
pub trait ArweaveRecordResolver: Send + Sync {
    /// Transaction to serve for `ens_name`; never fails, `tx_id` is the
    /// fallback for every lookup problem
    async fn resolve_arweave(&self, tx_id: &str, ens_name: &str) -> String;
}

pub struct ArweaveResolver {
    reader: Arc<dyn ContractStateReader>,
}

impl ArweaveResolver {
    pub fn new(reader: Arc<dyn ContractStateReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl ArweaveRecordResolver for ArweaveResolver {
    async fn resolve_arweave(&self, tx_id: &str, ens_name: &str) -> String {
        let state = match self.reader.read_state(tx_id).await {
            Ok(state) => state,
            Err(e) => {
                info!(tx_id, error = %e, "invalid arweave tx id");
                return tx_id.to_string();
            }
        };

        select_record(&state, tx_id, ens_name).unwrap_or_else(|| tx_id.to_string())
    }
}

/// Pick the transaction for `ens_name` from a contract state
///
/// Prefixes are plain string prefixes: `app` matches `application.eth` too.
fn select_record(state: &Value, tx_id: &str, ens_name: &str) -> Option<String> {
    let records = state.get("records")?.as_object()?;
    if records.is_empty() {
        return None;
    }

    let longest = records
        .keys()
        .filter(|key| ens_name.starts_with(key.as_str()))
        .max_by_key(|key| key.len());

    if let Some(key) = longest {
        match transaction_id(&records[key]) {
            Some(id) => {
                debug!(tx_id, ens_name, key = %key, "arweave prefix record");
                return Some(id);
            }
            None => error!(tx_id, ens_name, key = %key, "invalid arweave record found"),
        }
    }

    if let Some(root) = records.get("@") {
        match transaction_id(root) {
            Some(id) => return Some(id),
            None => error!(tx_id, ens_name, "invalid arweave @ record found"),
        }
    }

    warn!(tx_id, ens_name, "no arweave @ record found");
    None
}

fn transaction_id(record: &Value) -> Option<String> {
    record.get("transactionId")?.as_str().map(str::to_string)
}
