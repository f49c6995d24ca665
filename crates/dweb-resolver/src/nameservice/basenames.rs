//! Basenames on Base L2 (`.base.eth`)

use std::sync::Arc;

use alloy_primitives::{address, Address};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use super::abi::IEnsResolver;
use super::NameService;
use crate::error::Result;
use crate::provider::EthCall;
use dweb_core::{decode_content_hash, namehash};

/// Basenames L2 resolver on Base mainnet
pub const L2_RESOLVER_ADDRESS: Address = address!("C6d566A56A1aFf6508b41f6c90ff131615583BCD");

pub struct BasenamesService {
    provider: Arc<dyn EthCall>,
    resolver: Address,
}

impl BasenamesService {
    pub fn new(provider: Arc<dyn EthCall>) -> Self {
        Self {
            provider,
            resolver: L2_RESOLVER_ADDRESS,
        }
    }
}

#[async_trait]
impl NameService for BasenamesService {
    fn name(&self) -> &'static str {
        "BasenamesService"
    }

    async fn get_content_hash(&self, name: &str) -> Result<Option<String>> {
        let node = namehash(name);
        debug!(name, node = %node, resolver = %self.resolver, "querying L2 resolver");

        let call = IEnsResolver::contenthashCall { node };
        let out = self.provider.call(self.resolver, call.abi_encode().into()).await?;
        let content_hash = IEnsResolver::contenthashCall::abi_decode_returns(&out)?;
        if content_hash.is_empty() {
            debug!(name, "no contenthash set");
            return Ok(None);
        }

        let decoded = decode_content_hash(&content_hash, name, self.name());
        debug!(name, contenthash = ?decoded, "contenthash resolved");
        Ok(decoded)
    }
}
