//! Networked half of the dweb name gateway
//!
//! This crate provides the resolution orchestrator that:
//! 1. Routes a hostname to ENS, Web3Name (`.gno`) or Basenames (`.base.eth`)
//! 2. Reads the content hash over JSON-RPC, with failover between providers
//! 3. Follows Arweave contract records and pre-resolves IPNS names via Kubo
//! 4. Parses the result into a [`dweb_core::Record`] and memoizes it
//!
//! ## Usage
//!
//! ```no_run
//! use dweb_core::{record_to_proxy_record, ProxyConfig, ResolverConfig};
//! use dweb_resolver::EnsResolverService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ResolverConfig::default();
//!     let resolver = EnsResolverService::from_config(&config).await?;
//!     let result = resolver.resolve_ens("vitalik.eth").await?;
//!     if let Some(record) = &result.record {
//!         let outcome = record_to_proxy_record(record, &ProxyConfig::from_config(&config)?)?;
//!         println!("{:?}", outcome);
//!     }
//!     Ok(())
//! }
//! ```

mod arweave;
mod cache;
mod error;
mod kubo;
mod nameservice;
mod provider;
mod service;

pub use arweave::{ArweaveRecordResolver, ArweaveResolver, ContractStateReader, WarpStateReader};
pub use cache::{memoize, CacheService, MemoryCache, PassthroughCache};
pub use error::{ResolverError, Result};
pub use kubo::{IpnsResolver, KuboApiService};
pub use nameservice::{
    BasenamesService, CcipGateway, EnsService, HttpCcipGateway, NameService, NameServiceRouter,
    Web3NameService, ENS_REGISTRY_ADDRESS, L2_RESOLVER_ADDRESS,
};
pub use provider::{EthCall, FailoverProvider, RpcProvider};
pub use service::{EnsResolverService, RESOLVE_ENS_NAMESPACE};
