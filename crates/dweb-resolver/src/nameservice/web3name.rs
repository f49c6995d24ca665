//! SPACE ID names on Gnosis (`.gno`)

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use super::abi::{IEnsRegistry, IEnsResolver};
use super::NameService;
use crate::error::{ResolverError, Result};
use crate::provider::EthCall;
use dweb_core::{decode_content_hash, namehash, GnosisConfig};

/// ENS-compatible registry lookup against the SID registry on Gnosis
///
/// Content hashes are always run through the full multicodec decoder; the
/// registry returns raw bytes for every codec.
pub struct Web3NameService {
    provider: Arc<dyn EthCall>,
    registry: Address,
    tld_identifier: Option<String>,
}

impl Web3NameService {
    pub fn new(provider: Arc<dyn EthCall>, registry: Address, tld_identifier: Option<String>) -> Self {
        Self {
            provider,
            registry,
            tld_identifier,
        }
    }

    pub fn from_config(provider: Arc<dyn EthCall>, config: &GnosisConfig) -> Result<Self> {
        let registry = config
            .registry
            .parse::<Address>()
            .map_err(|_| ResolverError::InvalidAddress(config.registry.clone()))?;
        let tld_identifier = config
            .tld_identifier
            .as_deref()
            .map(|id| id.trim_start_matches("0x").to_ascii_lowercase());
        Ok(Self::new(provider, registry, tld_identifier))
    }

    /// Node for `name`, scoped to the tld identifier when one is configured
    pub fn node(&self, name: &str) -> B256 {
        match &self.tld_identifier {
            Some(id) => namehash(&format!("{}.[{}]", name, id)),
            None => namehash(name),
        }
    }

    async fn content_hash_bytes(&self, name: &str) -> Result<Option<Bytes>> {
        let node = self.node(name);

        let call = IEnsRegistry::resolverCall { node };
        let out = self.provider.call(self.registry, call.abi_encode().into()).await?;
        let resolver = IEnsRegistry::resolverCall::abi_decode_returns(&out)?;
        if resolver == Address::ZERO {
            debug!(name, "no resolver");
            return Ok(None);
        }

        let call = IEnsResolver::contenthashCall { node };
        let out = match self.provider.call(resolver, call.abi_encode().into()).await {
            Ok(out) => out,
            Err(e) if e.is_call_exception() => {
                debug!(name, error = %e, "contenthash call reverted");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let content_hash = IEnsResolver::contenthashCall::abi_decode_returns(&out)?;
        Ok((!content_hash.is_empty()).then_some(content_hash))
    }
}

#[async_trait]
impl NameService for Web3NameService {
    fn name(&self) -> &'static str {
        "Web3NameSdkService"
    }

    async fn get_content_hash(&self, name: &str) -> Result<Option<String>> {
        let Some(bytes) = self.content_hash_bytes(name).await? else {
            return Ok(None);
        };
        Ok(decode_content_hash(&bytes, name, self.name()))
    }
}
