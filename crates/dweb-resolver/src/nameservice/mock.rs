//! In-memory registry and resolver contracts for name service tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{sol, SolCall, SolError, SolValue};
use async_trait::async_trait;

use super::abi::{IEnsRegistry, IEnsResolver, IExtendedResolver, OffchainLookup};
use super::ccip::CcipGateway;
use crate::error::{ResolverError, Result};
use crate::provider::EthCall;
use dweb_core::namehash;

pub(crate) const EXTENDED_RESOLVER_INTERFACE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

sol! {
    interface IOffchainResolver {
        function resolveWithProof(bytes calldata response, bytes calldata extraData) external view returns (bytes memory);
    }
}

#[derive(Default)]
pub(crate) struct MockChain {
    registry: Address,
    resolvers: HashMap<B256, Address>,
    wildcard: HashSet<Address>,
    reverting: HashSet<Address>,
    offchain: HashMap<Address, Vec<String>>,
    content: HashMap<(Address, B256), Bytes>,
    offline: bool,
}

impl MockChain {
    pub fn new(registry: Address) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    pub fn with_resolver(mut self, name: &str, resolver: Address) -> Self {
        self.resolvers.insert(namehash(name), resolver);
        self
    }

    pub fn with_node_resolver(mut self, node: B256, resolver: Address) -> Self {
        self.resolvers.insert(node, resolver);
        self
    }

    pub fn with_wildcard(mut self, resolver: Address) -> Self {
        self.wildcard.insert(resolver);
        self
    }

    pub fn with_reverting(mut self, resolver: Address) -> Self {
        self.reverting.insert(resolver);
        self
    }

    /// Wildcard resolver that answers `resolve` with an `OffchainLookup`
    pub fn with_offchain(mut self, resolver: Address, urls: &[&str]) -> Self {
        self.wildcard.insert(resolver);
        self.offchain
            .insert(resolver, urls.iter().map(|u| u.to_string()).collect());
        self
    }

    pub fn with_content(mut self, resolver: Address, name: &str, bytes: &[u8]) -> Self {
        self.content.insert((resolver, namehash(name)), Bytes::copy_from_slice(bytes));
        self
    }

    pub fn with_node_content(mut self, resolver: Address, node: B256, bytes: &[u8]) -> Self {
        self.content.insert((resolver, node), Bytes::copy_from_slice(bytes));
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn content_of(&self, resolver: Address, node: B256) -> Bytes {
        self.content.get(&(resolver, node)).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl EthCall for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        if self.offline {
            return Err(ResolverError::Timeout {
                operation: "eth_call",
                timeout_ms: 0,
            });
        }

        if to == self.registry {
            let call = IEnsRegistry::resolverCall::abi_decode(&data)?;
            let resolver = self.resolvers.get(&call.node).copied().unwrap_or(Address::ZERO);
            return Ok(resolver.abi_encode().into());
        }

        if self.reverting.contains(&to) {
            return Err(ResolverError::CallException("execution reverted".into()));
        }

        let selector = data.get(..4).unwrap_or_default();
        if let Some(urls) = self.offchain.get(&to) {
            if selector == IExtendedResolver::resolveCall::SELECTOR {
                let lookup = OffchainLookup {
                    sender: to,
                    urls: urls.clone(),
                    callData: data.clone(),
                    callbackFunction: IOffchainResolver::resolveWithProofCall::SELECTOR.into(),
                    extraData: data.clone(),
                };
                return Err(ResolverError::Reverted {
                    message: "execution reverted".into(),
                    data: lookup.abi_encode().into(),
                });
            }
            if selector == IOffchainResolver::resolveWithProofCall::SELECTOR {
                let call = IOffchainResolver::resolveWithProofCall::abi_decode(&data)?;
                return Ok(call.response);
            }
        }

        if selector == IEnsResolver::supportsInterfaceCall::SELECTOR {
            let call = IEnsResolver::supportsInterfaceCall::abi_decode(&data)?;
            let supported = self.wildcard.contains(&to) && call.interfaceID.0 == EXTENDED_RESOLVER_INTERFACE;
            Ok(supported.abi_encode().into())
        } else if selector == IEnsResolver::contenthashCall::SELECTOR {
            let call = IEnsResolver::contenthashCall::abi_decode(&data)?;
            Ok(self.content_of(to, call.node).abi_encode().into())
        } else if selector == IExtendedResolver::resolveCall::SELECTOR && self.wildcard.contains(&to) {
            let call = IExtendedResolver::resolveCall::abi_decode(&data)?;
            let inner = IEnsResolver::contenthashCall::abi_decode(&call.data)?;
            let inner_return = Bytes::from(self.content_of(to, inner.node).abi_encode());
            Ok(inner_return.abi_encode().into())
        } else {
            Err(ResolverError::CallException("unknown selector".into()))
        }
    }
}

/// Offchain gateway answering `resolve(name, contenthash(node))` from memory
#[derive(Default)]
pub(crate) struct MockGateway {
    content: HashMap<B256, Bytes>,
    pub calls: AtomicUsize,
}

impl MockGateway {
    pub fn with_content(mut self, name: &str, bytes: &[u8]) -> Self {
        self.content.insert(namehash(name), Bytes::copy_from_slice(bytes));
        self
    }
}

#[async_trait]
impl CcipGateway for MockGateway {
    async fn fetch(&self, _sender: Address, urls: &[String], call_data: &Bytes) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if urls.is_empty() {
            return Err(ResolverError::OffchainLookup("no gateway urls".into()));
        }
        let call = IExtendedResolver::resolveCall::abi_decode(call_data)?;
        let inner = IEnsResolver::contenthashCall::abi_decode(&call.data)?;
        let content = self.content.get(&inner.node).cloned().unwrap_or_default();
        let inner_return = Bytes::from(content.abi_encode());
        Ok(inner_return.abi_encode().into())
    }
}
