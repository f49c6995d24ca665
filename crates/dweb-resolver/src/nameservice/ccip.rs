//! EIP-3668 (CCIP-read) gateway requests

use std::time::Duration;

use alloy_primitives::{hex, Address, Bytes};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ResolverError, Result};

/// Fetches the answer to an `OffchainLookup` from its gateway URLs
#[async_trait]
pub trait CcipGateway: Send + Sync {
    async fn fetch(&self, sender: Address, urls: &[String], call_data: &Bytes) -> Result<Bytes>;
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    data: String,
}

/// Gateway client over HTTP
///
/// URLs containing `{data}` are fetched with GET, all others with a JSON
/// POST of `{ data, sender }`. A 4xx answer ends the lookup; 5xx and
/// transport errors move on to the next URL.
pub struct HttpCcipGateway {
    client: reqwest::Client,
}

impl HttpCcipGateway {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

/// Expand `{sender}` and `{data}`; `true` when the request is a GET
fn gateway_url(template: &str, sender: &str, data: &str) -> (String, bool) {
    let url = template.replace("{sender}", sender).replace("{data}", data);
    (url, template.contains("{data}"))
}

#[async_trait]
impl CcipGateway for HttpCcipGateway {
    async fn fetch(&self, sender: Address, urls: &[String], call_data: &Bytes) -> Result<Bytes> {
        let sender = hex::encode_prefixed(sender);
        let data = hex::encode_prefixed(call_data);
        let mut last_error = None;

        for template in urls {
            let (url, is_get) = gateway_url(template, &sender, &data);
            let request = if is_get {
                self.client.get(&url)
            } else {
                self.client
                    .post(&url)
                    .json(&json!({ "data": data, "sender": sender }))
            };

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, error = %e, "offchain gateway unreachable");
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            if status.is_client_error() {
                return Err(ResolverError::OffchainLookup(format!("{} answered {}", url, status)));
            }
            if !status.is_success() {
                warn!(url = %url, status = %status, "offchain gateway failed");
                last_error = Some(ResolverError::OffchainLookup(format!("{} answered {}", url, status)));
                continue;
            }

            let body: GatewayResponse = response.json().await?;
            debug!(url = %url, "offchain gateway answered");
            return hex::decode(&body.data)
                .map(Bytes::from)
                .map_err(|e| ResolverError::OffchainLookup(format!("{} returned invalid data: {}", url, e)));
        }

        Err(last_error.unwrap_or_else(|| ResolverError::OffchainLookup("no gateway urls".to_string())))
    }
}
