//! Ethereum `eth_call` providers
//!
//! Name services only ever need read-only contract calls, so the capability
//! they consume is a single [`EthCall::call`]. [`FailoverProvider`] layers a
//! priority/stall/quorum policy over several [`RpcProvider`]s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_rpc_types::BlockNumberOrTag;
use alloy_transport::TransportError;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{ResolverError, Result};
use dweb_core::EthereumConfig;

#[async_trait]
pub trait EthCall: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

/// Single JSON-RPC endpoint
pub struct RpcProvider {
    url: String,
    client: RpcClient,
    timeout: Duration,
}

impl RpcProvider {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::default().connect(url).await?;
        Ok(Self {
            url: url.to_string(),
            client,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EthCall for RpcProvider {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let params = (json!({ "to": to, "data": data }), BlockNumberOrTag::Latest);
        let request = self.client.request("eth_call", params);

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(TransportError::ErrorResp(payload))) => {
                let message = payload.message.to_string();
                Err(match payload.as_revert_data() {
                    Some(data) => ResolverError::Reverted { message, data },
                    None => ResolverError::CallException(message),
                })
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ResolverError::Timeout {
                operation: "eth_call",
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Priority-ordered providers with a stall timeout and an agreement quorum
///
/// With a quorum of 1, providers are asked one at a time: the next one is
/// started when the current one fails or has not answered within the stall
/// timeout, and the first answer from any started provider wins. With a
/// larger quorum every provider is asked at once and at least `quorum` of
/// them must return identical bytes.
pub struct FailoverProvider {
    providers: Vec<Arc<dyn EthCall>>,
    stall_timeout: Duration,
    quorum: usize,
}

impl FailoverProvider {
    pub fn new(providers: Vec<Arc<dyn EthCall>>, stall_timeout: Duration, quorum: usize) -> Self {
        Self {
            providers,
            stall_timeout,
            quorum: quorum.max(1),
        }
    }

    /// Connect to the primary endpoint and any configured failovers
    pub async fn from_config(config: &EthereumConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.provider_timeout_ms);
        let mut providers: Vec<Arc<dyn EthCall>> = Vec::new();
        for (priority, url) in config.endpoints().into_iter().enumerate() {
            if priority > 0 {
                info!(priority, "adding failover provider");
            }
            providers.push(Arc::new(RpcProvider::connect(url, timeout).await?));
        }

        Ok(Self::new(
            providers,
            Duration::from_millis(config.provider_stall_timeout_ms),
            config.quorum,
        ))
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    async fn first_answer(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let mut waiting = self.providers.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut last_error = None;

        loop {
            if let Some((priority, provider)) = waiting.next() {
                let data = data.clone();
                in_flight.push(async move { (priority, provider.call(to, data).await) });
            }

            loop {
                let next = if waiting.len() > 0 {
                    match tokio::time::timeout(self.stall_timeout, in_flight.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            debug!(stall_ms = self.stall_timeout.as_millis() as u64, "provider stalled");
                            break;
                        }
                    }
                } else {
                    in_flight.next().await
                };

                match next {
                    Some((_, Ok(bytes))) => return Ok(bytes),
                    Some((priority, Err(e))) => {
                        warn!(priority, error = %e, "provider call failed");
                        last_error = Some(e);
                        if waiting.len() > 0 {
                            break;
                        }
                    }
                    None => return Err(last_error.unwrap_or(ResolverError::NoProviders)),
                }
            }
        }
    }

    async fn quorum_answer(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let calls = self.providers.iter().map(|p| p.call(to, data.clone()));
        let results = futures::future::join_all(calls).await;

        let mut tally: HashMap<Bytes, usize> = HashMap::new();
        let mut last_error = None;
        for (priority, result) in results.into_iter().enumerate() {
            match result {
                Ok(bytes) => *tally.entry(bytes).or_default() += 1,
                Err(e) => {
                    warn!(priority, error = %e, "provider call failed");
                    last_error = Some(e);
                }
            }
        }

        let best = tally.into_iter().max_by_key(|(_, count)| *count);
        match best {
            Some((bytes, count)) if count >= self.quorum => Ok(bytes),
            Some((_, count)) => Err(ResolverError::QuorumNotReached {
                quorum: self.quorum,
                agreeing: count,
                providers: self.providers.len(),
            }),
            None => Err(last_error.unwrap_or(ResolverError::NoProviders)),
        }
    }
}

#[async_trait]
impl EthCall for FailoverProvider {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        if self.providers.is_empty() {
            return Err(ResolverError::NoProviders);
        }
        if self.quorum == 1 {
            self.first_answer(to, data).await
        } else {
            self.quorum_answer(to, data).await
        }
    }
}
