//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Ethereum mainnet RPC and provider aggregation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EthereumConfig {
    /// Primary JSON-RPC endpoint
    pub rpc: String,
    pub failover_primary: Option<String>,
    pub failover_secondary: Option<String>,
    /// How long a provider may stall before the next one is asked
    pub provider_stall_timeout_ms: u64,
    /// Upper bound on a single request to one provider
    pub provider_timeout_ms: u64,
    /// Number of providers that must return the same answer
    pub quorum: usize,
}

impl Default for EthereumConfig {
    fn default() -> Self {
        Self {
            rpc: "http://localhost:8545".to_string(),
            failover_primary: None,
            failover_secondary: None,
            provider_stall_timeout_ms: 200,
            provider_timeout_ms: 7000,
            quorum: 1,
        }
    }
}

impl EthereumConfig {
    /// All configured endpoints in priority order
    pub fn endpoints(&self) -> Vec<&str> {
        std::iter::once(self.rpc.as_str())
            .chain(self.failover_primary.as_deref())
            .chain(self.failover_secondary.as_deref())
            .collect()
    }
}

/// Gnosis chain, home of `.gno` names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GnosisConfig {
    pub rpc: String,
    /// SID registry contract on Gnosis
    pub registry: String,
    /// Hex tld identifier; when set, names hash as `name.[identifier]`
    pub tld_identifier: Option<String>,
}

impl Default for GnosisConfig {
    fn default() -> Self {
        Self {
            rpc: "https://rpc.gnosischain.com".to_string(),
            registry: "0x5dC881dDA4e4a8d312be3544AD13118D1a04Cb17".to_string(),
            tld_identifier: None,
        }
    }
}

/// Base L2, home of `.base.eth` names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    pub rpc: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            rpc: "https://mainnet.base.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Gateway base URL
    pub backend: String,
    /// Address content as `{id}.ipfs.{gateway}` rather than `/ipfs/{id}/`
    pub subdomain_support: bool,
    /// Kubo RPC API used to pre-resolve IPNS names, e.g. `http://localhost:5001/`
    pub kubo_api_url: Option<String>,
    pub kubo_timeout_ms: u64,
    /// Credential sent verbatim as `Authorization: Basic {kubo_auth}`
    pub kubo_auth: Option<String>,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            backend: "http://localhost:8080".to_string(),
            subdomain_support: true,
            kubo_api_url: None,
            kubo_timeout_ms: 2500,
            kubo_auth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArweaveConfig {
    /// Gateway base URL; an explicit port is kept verbatim
    pub backend: String,
    /// Contract state endpoint queried as `{state_endpoint}?id={tx}`
    pub state_endpoint: String,
    pub state_timeout_ms: u64,
}

impl Default for ArweaveConfig {
    fn default() -> Self {
        Self {
            backend: "https://arweave.net".to_string(),
            state_endpoint: "https://dre-1.warp.cc/contract".to_string(),
            state_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub backend: String,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            backend: "https://api.gateway.ethswarm.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsConfig {
    /// Profile page for names without content; `{ens}` is replaced by the name.
    /// Unset means such names are unable to redirect.
    pub socials_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Complete resolver configuration
///
/// Every section has defaults, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "ipfs": { "backend": "https://dweb.link" }, "base": null }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub ethereum: EthereumConfig,
    pub gnosis: GnosisConfig,
    /// `None` disables the `.base.eth` route; those names go to ENS
    pub base: Option<BaseConfig>,
    pub ipfs: IpfsConfig,
    pub arweave: ArweaveConfig,
    pub swarm: SwarmConfig,
    pub ens: EnsConfig,
    pub cache: CacheConfig,
    /// Gateway hostname suffix -> name-service suffix (`eth.limo` -> `eth`)
    pub hostname_substitution: BTreeMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let hostname_substitution = [
            ("eth.limo", "eth"),
            ("eth.local", "eth"),
            ("gno.limo", "gno"),
            ("gno.local", "gno"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            ethereum: EthereumConfig::default(),
            gnosis: GnosisConfig::default(),
            base: Some(BaseConfig::default()),
            ipfs: IpfsConfig::default(),
            arweave: ArweaveConfig::default(),
            swarm: SwarmConfig::default(),
            ens: EnsConfig::default(),
            cache: CacheConfig::default(),
            hostname_substitution,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
