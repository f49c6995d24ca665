//! Name services and hostname routing

mod abi;
mod basenames;
mod ccip;
mod ens;
#[cfg(test)]
mod mock;
mod web3name;

pub use basenames::{BasenamesService, L2_RESOLVER_ADDRESS};
pub use ccip::{CcipGateway, HttpCcipGateway};
pub use ens::{EnsService, ENS_REGISTRY_ADDRESS};
pub use web3name::Web3NameService;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::provider::{EthCall, FailoverProvider, RpcProvider};
use dweb_core::ResolverConfig;

/// Anything that can look up the content hash of a name
#[async_trait]
pub trait NameService: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// `{codec}://{content}` for `name`, or `None` when the name has no
    /// resolver, no content hash, or one that can not be decoded
    async fn get_content_hash(&self, name: &str) -> Result<Option<String>>;
}

/// Picks the name service for a hostname by suffix
pub struct NameServiceRouter {
    ens: Arc<dyn NameService>,
    web3name: Arc<dyn NameService>,
    basenames: Option<Arc<dyn NameService>>,
}

impl NameServiceRouter {
    pub fn new(
        ens: Arc<dyn NameService>,
        web3name: Arc<dyn NameService>,
        basenames: Option<Arc<dyn NameService>>,
    ) -> Self {
        Self {
            ens,
            web3name,
            basenames,
        }
    }

    /// Build every configured name service with its own RPC providers
    pub async fn from_config(config: &ResolverConfig) -> Result<Self> {
        let ethereum: Arc<dyn EthCall> = Arc::new(FailoverProvider::from_config(&config.ethereum).await?);
        let timeout = Duration::from_millis(config.ethereum.provider_timeout_ms);

        let gnosis: Arc<dyn EthCall> = Arc::new(RpcProvider::connect(&config.gnosis.rpc, timeout).await?);
        let web3name = Web3NameService::from_config(gnosis, &config.gnosis)?;

        let basenames: Option<Arc<dyn NameService>> = match &config.base {
            Some(base) => {
                let provider: Arc<dyn EthCall> = Arc::new(RpcProvider::connect(&base.rpc, timeout).await?);
                Some(Arc::new(BasenamesService::new(provider)))
            }
            None => None,
        };

        let gateway = HttpCcipGateway::new(timeout)?;

        Ok(Self::new(
            Arc::new(EnsService::new(ethereum).with_gateway(Arc::new(gateway))),
            Arc::new(web3name),
            basenames,
        ))
    }

    /// First match wins: `.gno`, then `.base.eth` when Basenames is
    /// configured, then ENS for everything else
    pub fn get_name_service_for_domain(&self, domain: &str) -> &dyn NameService {
        let domain = domain.to_ascii_lowercase();
        let service: &dyn NameService = if domain.ends_with(".gno") {
            self.web3name.as_ref()
        } else {
            match &self.basenames {
                Some(basenames) if domain.ends_with(".base.eth") => basenames.as_ref(),
                _ => self.ens.as_ref(),
            }
        };
        debug!(domain = %domain, service = service.name(), "routing domain");
        service
    }
}
