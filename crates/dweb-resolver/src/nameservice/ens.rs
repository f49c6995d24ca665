//! ENS on Ethereum mainnet

use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes};
use alloy_sol_types::{SolCall, SolError, SolValue};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::abi::{IEnsRegistry, IEnsResolver, IExtendedResolver, OffchainLookup};
use super::ccip::CcipGateway;
use super::NameService;
use crate::error::{ResolverError, Result};
use crate::provider::EthCall;
use dweb_core::{decode_content_hash, dns_encode, namehash, standard_content_hash, UnsupportedContentHash};

pub const ENS_REGISTRY_ADDRESS: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

const EXTENDED_RESOLVER_INTERFACE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

/// Offchain lookups followed for a single resolver call
const MAX_OFFCHAIN_LOOKUPS: usize = 4;

struct Resolver {
    address: Address,
    wildcard: bool,
}

pub struct EnsService {
    provider: Arc<dyn EthCall>,
    registry: Address,
    gateway: Option<Arc<dyn CcipGateway>>,
}

impl EnsService {
    pub fn new(provider: Arc<dyn EthCall>) -> Self {
        Self::with_registry(provider, ENS_REGISTRY_ADDRESS)
    }

    pub fn with_registry(provider: Arc<dyn EthCall>, registry: Address) -> Self {
        Self {
            provider,
            registry,
            gateway: None,
        }
    }

    /// Follow EIP-3668 `OffchainLookup` reverts through `gateway`; without
    /// one such a revert reads as "no content hash"
    pub fn with_gateway(mut self, gateway: Arc<dyn CcipGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    async fn registry_resolver(&self, name: &str) -> Result<Option<Address>> {
        let call = IEnsRegistry::resolverCall { node: namehash(name) };
        let out = self.provider.call(self.registry, call.abi_encode().into()).await?;
        let resolver = IEnsRegistry::resolverCall::abi_decode_returns(&out)?;
        Ok((resolver != Address::ZERO).then_some(resolver))
    }

    /// Registry lookup walking up to parent names; a parent's resolver is
    /// only usable when it implements wildcard resolution
    async fn find_resolver(&self, name: &str) -> Result<Option<Resolver>> {
        let mut current = name;
        loop {
            if current.is_empty() || current == "." || (name != "eth" && current == "eth") {
                return Ok(None);
            }

            if let Some(address) = self.registry_resolver(current).await? {
                let wildcard = self.supports_wildcard(address).await?;
                if current != name && !wildcard {
                    debug!(name, parent = current, "parent resolver does not support wildcards");
                    return Ok(None);
                }
                return Ok(Some(Resolver { address, wildcard }));
            }

            current = current.split_once('.').map_or("", |(_, parent)| parent);
        }
    }

    async fn supports_wildcard(&self, resolver: Address) -> Result<bool> {
        let call = IEnsResolver::supportsInterfaceCall {
            interfaceID: EXTENDED_RESOLVER_INTERFACE.into(),
        };
        match self.provider.call(resolver, call.abi_encode().into()).await {
            Ok(out) => Ok(IEnsResolver::supportsInterfaceCall::abi_decode_returns(&out).unwrap_or(false)),
            Err(e) if e.is_call_exception() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// `eth_call` against a resolver, following offchain lookups
    async fn call_resolver(&self, resolver: Address, calldata: Bytes) -> Result<Bytes> {
        let mut calldata = calldata;
        for _ in 0..MAX_OFFCHAIN_LOOKUPS {
            let err = match self.provider.call(resolver, calldata.clone()).await {
                Ok(out) => return Ok(out),
                Err(e) => e,
            };

            let Some(lookup) = err
                .revert_data()
                .and_then(|data| OffchainLookup::abi_decode(&data).ok())
            else {
                return Err(err);
            };
            let Some(gateway) = &self.gateway else {
                warn!(resolver = %resolver, "offchain lookup requested but no gateway client configured");
                return Err(err);
            };
            if lookup.sender != resolver {
                return Err(ResolverError::OffchainLookup(format!(
                    "sender {} does not match resolver {}",
                    lookup.sender, resolver
                )));
            }

            debug!(resolver = %resolver, urls = ?lookup.urls, "following offchain lookup");
            let response = gateway.fetch(lookup.sender, &lookup.urls, &lookup.callData).await?;
            let mut next = lookup.callbackFunction.to_vec();
            next.extend((response, lookup.extraData).abi_encode_params());
            calldata = next.into();
        }

        Err(ResolverError::OffchainLookup(format!(
            "more than {} lookups for resolver {}",
            MAX_OFFCHAIN_LOOKUPS, resolver
        )))
    }

    async fn read_content_hash(&self, resolver: &Resolver, name: &str) -> Result<Option<Bytes>> {
        let calldata: Bytes = IEnsResolver::contenthashCall { node: namehash(name) }
            .abi_encode()
            .into();
        let calldata = if resolver.wildcard {
            IExtendedResolver::resolveCall {
                name: dns_encode(name).into(),
                data: calldata,
            }
            .abi_encode()
            .into()
        } else {
            calldata
        };

        let out = match self.call_resolver(resolver.address, calldata).await {
            Ok(out) => out,
            Err(e) if e.is_call_exception() => {
                debug!(name, error = %e, "contenthash call reverted");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let out = if resolver.wildcard {
            IExtendedResolver::resolveCall::abi_decode_returns(&out)?
        } else {
            out
        };
        let content_hash = IEnsResolver::contenthashCall::abi_decode_returns(&out)?;
        Ok((!content_hash.is_empty()).then_some(content_hash))
    }
}

#[async_trait]
impl NameService for EnsService {
    fn name(&self) -> &'static str {
        "EnsService"
    }

    async fn get_content_hash(&self, name: &str) -> Result<Option<String>> {
        let Some(resolver) = self.find_resolver(name).await? else {
            debug!(name, "no resolver");
            return Ok(None);
        };

        let Some(bytes) = self.read_content_hash(&resolver, name).await? else {
            debug!(name, resolver = %resolver.address, "no contenthash");
            return Ok(None);
        };

        match standard_content_hash(&bytes) {
            Ok(content_hash) => Ok(Some(content_hash)),
            Err(UnsupportedContentHash { data }) => {
                debug!(name, "entering fallback");
                Ok(decode_content_hash(&data, name, self.name()))
            }
        }
    }
}
