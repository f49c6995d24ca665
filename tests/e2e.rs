//! End-to-end resolution tests
//!
//! Drives the full pipeline against in-memory chains:
//! hostname -> name service -> content hash -> record -> proxy record

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, B256};
use alloy_sol_types::{sol, SolCall, SolValue};
use async_trait::async_trait;
use dweb_core::{
    namehash, record_to_proxy_record, Codec, GatewayUrl, HostnameSubstitution, ProxyConfig, ProxyOutcome,
    Record, ResolverConfig,
};
use dweb_resolver::{
    ArweaveResolver, BasenamesService, ContractStateReader, EnsResolverService, EnsService, EthCall,
    MemoryCache, NameServiceRouter, ResolverError, Result, Web3NameService,
};
use multibase::Base;
use serde_json::{json, Value};

sol! {
    interface Registry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface PublicResolver {
        function contenthash(bytes32 node) external view returns (bytes memory);
        function supportsInterface(bytes4 interfaceID) external view returns (bool);
    }
}

const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");
const SID_REGISTRY: Address = address!("5dC881dDA4e4a8d312be3544AD13118D1a04Cb17");
const PUBLIC_RESOLVER: Address = address!("4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41");

const CID_V0: &str = "QmRAQB6YaCyidP37UdDnjFY5vQuiBrcqdyoW1CuDgwxkD4";
const ARWEAVE_TX: &str = "Gum-G8CFTCIJIeDVJSxAzB9qNy2zv7SC4Cv_bgw7I3g";
const ARWEAVE_SANDBOX: &str = "dlu34g6aqvgcecjb4dksklcazqpwunznwo73jaxafp7w4db3en4a";

/// Registry plus one resolver holding content hashes by node
#[derive(Default)]
struct Chain {
    registry: Address,
    resolvers: HashMap<B256, Address>,
    content: HashMap<B256, Bytes>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl Chain {
    fn new(registry: Address) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    fn with_name(mut self, name: &str, content_hash: Vec<u8>) -> Self {
        self.resolvers.insert(namehash(name), PUBLIC_RESOLVER);
        self.content.insert(namehash(name), content_hash.into());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EthCall for Chain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ResolverError::Timeout {
                operation: "eth_call",
                timeout_ms: 7000,
            });
        }

        if to == self.registry {
            let call = Registry::resolverCall::abi_decode(&data)?;
            let resolver = self.resolvers.get(&call.node).copied().unwrap_or(Address::ZERO);
            return Ok(resolver.abi_encode().into());
        }

        let selector = data.get(..4).unwrap_or_default();
        if selector == PublicResolver::supportsInterfaceCall::SELECTOR {
            Ok(false.abi_encode().into())
        } else if selector == PublicResolver::contenthashCall::SELECTOR {
            let call = PublicResolver::contenthashCall::abi_decode(&data)?;
            let content = self.content.get(&call.node).cloned().unwrap_or_default();
            Ok(content.abi_encode().into())
        } else {
            Err(ResolverError::CallException("execution reverted".into()))
        }
    }
}

/// Contract states by contract id
struct States(HashMap<String, Value>);

#[async_trait]
impl ContractStateReader for States {
    async fn read_state(&self, contract_id: &str) -> Result<Value> {
        self.0
            .get(contract_id)
            .cloned()
            .ok_or_else(|| ResolverError::CallException(format!("unknown contract {}", contract_id)))
    }
}

fn ipfs_content_hash() -> Vec<u8> {
    let mut bytes = vec![0xe3, 0x01, 0x01, 0x70];
    bytes.extend(Base::Base58Btc.decode(CID_V0).unwrap());
    bytes
}

/// `e5 01 01 72 00 <len> <domain>`: a DNSLink name stored as an identity hash
fn legacy_dnslink_content_hash(domain: &str) -> Vec<u8> {
    let mut bytes = vec![0xe5, 0x01, 0x01, 0x72, 0x00, domain.len() as u8];
    bytes.extend_from_slice(domain.as_bytes());
    bytes
}

fn arweave_content_hash(tx_id: &str) -> Vec<u8> {
    let mut bytes = vec![0x90, 0xb2, 0xca, 0x05];
    bytes.extend(Base::Base64Url.decode(tx_id).unwrap());
    bytes
}

struct Harness {
    ethereum: Arc<Chain>,
    gnosis: Arc<Chain>,
    base: Arc<Chain>,
    resolver: EnsResolverService,
    proxy: ProxyConfig,
}

impl Harness {
    fn new(ethereum: Chain, gnosis: Chain, base: Chain, states: HashMap<String, Value>) -> Self {
        let ethereum = Arc::new(ethereum);
        let gnosis = Arc::new(gnosis);
        let base = Arc::new(base);

        let router = NameServiceRouter::new(
            Arc::new(EnsService::with_registry(ethereum.clone(), ENS_REGISTRY)),
            Arc::new(Web3NameService::new(gnosis.clone(), SID_REGISTRY, None)),
            Some(Arc::new(BasenamesService::new(base.clone()))),
        );
        let resolver = EnsResolverService::new(
            router,
            Arc::new(ArweaveResolver::new(Arc::new(States(states)))),
            None,
            Arc::new(MemoryCache::new(Duration::from_secs(300))),
        );

        let mut config = ResolverConfig::default();
        config.ipfs.backend = "http://localhost:8080".to_string();
        config.arweave.backend = "https://arweave.net:8443".to_string();
        config.ens.socials_endpoint = Some("https://landing.nimi.page/?ens={ens}".to_string());
        let proxy = ProxyConfig::from_config(&config).unwrap();

        Self {
            ethereum,
            gnosis,
            base,
            resolver,
            proxy,
        }
    }

    fn ethereum_only(ethereum: Chain) -> Self {
        Self::new(
            ethereum,
            Chain::new(SID_REGISTRY),
            Chain::new(Address::ZERO),
            HashMap::new(),
        )
    }

    async fn proxy_for(&self, hostname: &str) -> (Record, ProxyOutcome) {
        let result = self.resolver.resolve_ens(hostname).await.unwrap();
        let record = result.record.expect("record");
        let outcome = record_to_proxy_record(&record, &self.proxy).unwrap();
        (record, outcome)
    }
}

#[tokio::test]
async fn test_ipfs_name_to_subdomain_gateway() {
    let harness = Harness::ethereum_only(Chain::new(ENS_REGISTRY).with_name("vitalik.eth", ipfs_content_hash()));

    let (record, outcome) = harness.proxy_for("vitalik.eth").await;
    let ProxyOutcome::Proxy(proxy) = outcome else {
        panic!("expected proxy record");
    };
    assert!(proxy.location.starts_with("bafybei"));
    assert!(proxy.location.ends_with(".ipfs.localhost:8080"));
    assert_eq!(proxy.path, "/");
    assert_eq!(proxy.storage_type(&record), Some(Codec::IpfsNs));
}

#[tokio::test]
async fn test_nonexistent_name_redirects_to_socials() {
    let harness = Harness::ethereum_only(Chain::new(ENS_REGISTRY));

    let result = harness.resolver.resolve_ens("nonexistent.eth").await.unwrap();
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "record": { "_tag": "ens-socials-redirect", "ensName": "nonexistent.eth" },
            "resolverExists": false
        })
    );

    let (_, outcome) = harness.proxy_for("nonexistent.eth").await;
    let ProxyOutcome::Proxy(proxy) = outcome else {
        panic!("expected proxy record");
    };
    assert_eq!(proxy.location, "landing.nimi.page");
    assert_eq!(proxy.path, "/?ens=nonexistent.eth/");
}

#[tokio::test]
async fn test_arweave_root_record_on_explicit_port() {
    let contract = Base::Base64Url.encode([0x11u8; 32]);
    let states = HashMap::from([(
        contract.clone(),
        json!({
            "records": {
                "@": { "transactionId": ARWEAVE_TX },
                "blog": { "transactionId": "unused" }
            }
        }),
    )]);
    let harness = Harness::new(
        Chain::new(ENS_REGISTRY).with_name("makesy.eth", arweave_content_hash(&contract)),
        Chain::new(SID_REGISTRY),
        Chain::new(Address::ZERO),
        states,
    );

    let (record, outcome) = harness.proxy_for("makesy.eth").await;
    assert_eq!(record, Record::content(Codec::ArweaveNs, ARWEAVE_TX, "makesy.eth"));
    let ProxyOutcome::Proxy(proxy) = outcome else {
        panic!("expected proxy record");
    };
    assert_eq!(proxy.location, format!("{}.arweave.net:8443", ARWEAVE_SANDBOX));
    assert_eq!(proxy.path, format!("/{}/", ARWEAVE_TX));
}

#[tokio::test]
async fn test_arweave_without_contract_state_serves_tx() {
    let harness = Harness::ethereum_only(
        Chain::new(ENS_REGISTRY).with_name("makesy.eth", arweave_content_hash(ARWEAVE_TX)),
    );

    let (record, _) = harness.proxy_for("makesy.eth").await;
    assert_eq!(record, Record::content(Codec::ArweaveNs, ARWEAVE_TX, "makesy.eth"));
}

#[tokio::test]
async fn test_legacy_dnslink_is_served_by_domain() {
    let harness = Harness::ethereum_only(
        Chain::new(ENS_REGISTRY).with_name("uniswap.eth", legacy_dnslink_content_hash("app.uniswap.org")),
    );

    let (record, outcome) = harness.proxy_for("uniswap.eth").await;
    assert_eq!(record, Record::content(Codec::IpnsNs, "app.uniswap.org", "uniswap.eth"));
    let ProxyOutcome::Proxy(proxy) = outcome else {
        panic!("expected proxy record");
    };
    assert_eq!(proxy.location, "app-uniswap-org.ipns.localhost:8080");
}

#[tokio::test]
async fn test_mixed_case_hostname_resolves() {
    let harness = Harness::ethereum_only(Chain::new(ENS_REGISTRY).with_name("vitalik.eth", ipfs_content_hash()));
    let substitution = HostnameSubstitution::new(ResolverConfig::default().hostname_substitution);

    let hostname = substitution.substitute("Vitalik.ETH");
    let (record, _) = harness.proxy_for(&hostname).await;
    assert_eq!(record.codec(), Some(Codec::IpfsNs));
    assert_eq!(record.ens_name(), "vitalik.eth");

    let (record, _) = harness.proxy_for("VITALIK.eth").await;
    assert_eq!(record.codec(), Some(Codec::IpfsNs));
}

#[tokio::test]
async fn test_names_route_to_their_chains() {
    let harness = Harness::new(
        Chain::new(ENS_REGISTRY),
        Chain::new(SID_REGISTRY).with_name("safe.gno", ipfs_content_hash()),
        Chain::new(Address::ZERO).with_name("jesse.base.eth", ipfs_content_hash()),
        HashMap::new(),
    );

    let (record, _) = harness.proxy_for("safe.gno").await;
    assert_eq!(record.codec(), Some(Codec::IpfsNs));
    let (record, _) = harness.proxy_for("jesse.base.eth").await;
    assert_eq!(record.codec(), Some(Codec::IpfsNs));

    assert_eq!(harness.ethereum.calls(), 0);
    assert!(harness.gnosis.calls() > 0);
    assert!(harness.base.calls() > 0);
}

#[tokio::test]
async fn test_gateway_hostname_is_substituted() {
    let harness = Harness::ethereum_only(Chain::new(ENS_REGISTRY).with_name("vitalik.eth", ipfs_content_hash()));
    let substitution = HostnameSubstitution::new(ResolverConfig::default().hostname_substitution);

    let hostname = substitution.substitute("vitalik.eth.limo");
    assert_eq!(hostname, "vitalik.eth");
    let (record, _) = harness.proxy_for(&hostname).await;
    assert_eq!(record.ens_name(), "vitalik.eth");
}

#[tokio::test]
async fn test_repeat_resolution_is_served_from_cache() {
    let harness = Harness::ethereum_only(Chain::new(ENS_REGISTRY).with_name("vitalik.eth", ipfs_content_hash()));

    let first = harness.resolver.resolve_ens("vitalik.eth").await.unwrap();
    let calls = harness.ethereum.calls();
    let second = harness.resolver.resolve_ens("vitalik.eth").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.ethereum.calls(), calls);
    assert!(harness.resolver.ttl("vitalik.eth").await.is_some());
}

#[tokio::test]
async fn test_upstream_failure_is_retried_after_recovery() {
    let harness = Harness::ethereum_only(Chain::new(ENS_REGISTRY).with_name("vitalik.eth", ipfs_content_hash()));

    harness.ethereum.offline.store(true, Ordering::SeqCst);
    assert!(matches!(
        harness.resolver.resolve_ens("vitalik.eth").await,
        Err(ResolverError::Timeout { .. })
    ));
    assert_eq!(harness.resolver.ttl("vitalik.eth").await, None);

    harness.ethereum.offline.store(false, Ordering::SeqCst);
    let result = harness.resolver.resolve_ens("vitalik.eth").await.unwrap();
    assert!(result.resolver_exists);
}

#[test]
fn test_gateway_port_is_kept_in_location() {
    let gateway = GatewayUrl::parse("https://arweave.net:443").unwrap();
    assert_eq!(gateway.location(), "arweave.net:443");
}
