//! Resolve gateway hostnames to proxy addressing
//!
//! Run with:
//! ```bash
//! cargo run -p dweb-resolver --bin dweb-resolve -- vitalik.eth.limo makesy.eth
//! ```

use anyhow::Context;
use clap::Parser;
use dweb_core::{
    parse_raw_config, record_to_proxy_record, HostnameSubstitution, ProxyConfig, ProxyOutcome, ResolverConfig,
};
use dweb_resolver::EnsResolverService;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dweb-resolve")]
#[command(about = "Resolve ENS, .gno and .base.eth hostnames to content locations")]
struct Args {
    /// Hostnames to resolve (gateway suffixes such as eth.limo are substituted)
    #[arg(required = true)]
    hostnames: Vec<String>,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ethereum JSON-RPC endpoint
    #[arg(long, env = "ETH_RPC_ENDPOINT")]
    eth_rpc: Option<String>,

    #[arg(long, env = "ETH_RPC_ENDPOINT_FAILOVER_PRIMARY")]
    eth_rpc_failover_primary: Option<String>,

    #[arg(long, env = "ETH_RPC_ENDPOINT_FAILOVER_SECONDARY")]
    eth_rpc_failover_secondary: Option<String>,

    /// Gnosis JSON-RPC endpoint for .gno names
    #[arg(long, env = "GNO_RPC_ENDPOINT")]
    gno_rpc: Option<String>,

    /// Base JSON-RPC endpoint for .base.eth names
    #[arg(long, env = "BASE_RPC_ENDPOINT")]
    base_rpc: Option<String>,

    /// IPFS gateway
    #[arg(long, env = "IPFS_TARGET")]
    ipfs_target: Option<String>,

    /// Whether the IPFS gateway serves {cid}.ipfs.{host}
    #[arg(long, env = "IPFS_SUBDOMAIN_SUPPORT")]
    ipfs_subdomain_support: Option<bool>,

    #[arg(long, env = "IPFS_KUBO_API_URL")]
    kubo_api_url: Option<String>,

    #[arg(long, env = "IPFS_AUTH_KEY")]
    kubo_auth: Option<String>,

    /// Arweave gateway
    #[arg(long, env = "ARWEAVE_TARGET")]
    arweave_target: Option<String>,

    /// Swarm gateway
    #[arg(long, env = "SWARM_TARGET")]
    swarm_target: Option<String>,

    /// Profile page for names without content, e.g. https://landing.nimi.page/?ens={ens}
    #[arg(long, env = "ENS_SOCIALS_ENDPOINT")]
    socials_endpoint: Option<String>,

    /// Hostname substitution map as JSON or base64-encoded JSON
    #[arg(long, env = "DOMAINSAPI_HOSTNAME_SUBSTITUTION_CONFIG")]
    hostname_substitution: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(ResolverConfig, Vec<String>, bool)> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ResolverConfig::default(),
        };

        if let Some(rpc) = self.eth_rpc {
            config.ethereum.rpc = rpc;
        }
        if self.eth_rpc_failover_primary.is_some() {
            config.ethereum.failover_primary = self.eth_rpc_failover_primary;
        }
        if self.eth_rpc_failover_secondary.is_some() {
            config.ethereum.failover_secondary = self.eth_rpc_failover_secondary;
        }
        if let Some(rpc) = self.gno_rpc {
            config.gnosis.rpc = rpc;
        }
        if let Some(rpc) = self.base_rpc {
            config.base.get_or_insert_with(Default::default).rpc = rpc;
        }
        if let Some(target) = self.ipfs_target {
            config.ipfs.backend = target;
        }
        if let Some(subdomain_support) = self.ipfs_subdomain_support {
            config.ipfs.subdomain_support = subdomain_support;
        }
        if self.kubo_api_url.is_some() {
            config.ipfs.kubo_api_url = self.kubo_api_url;
        }
        if self.kubo_auth.is_some() {
            config.ipfs.kubo_auth = self.kubo_auth;
        }
        if let Some(target) = self.arweave_target {
            config.arweave.backend = target;
        }
        if let Some(target) = self.swarm_target {
            config.swarm.backend = target;
        }
        if self.socials_endpoint.is_some() {
            config.ens.socials_endpoint = self.socials_endpoint;
        }
        if let Some(raw) = &self.hostname_substitution {
            config.hostname_substitution = parse_raw_config(raw)?;
        }

        Ok((config, self.hostnames, self.print_config))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("dweb_resolver=info".parse()?)
                .add_directive("dweb_core=info".parse()?),
        )
        .init();

    let (config, hostnames, print_config) = Args::parse().into_config()?;
    if print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let proxy_config = ProxyConfig::from_config(&config)?;
    let substitution = HostnameSubstitution::new(config.hostname_substitution.clone());
    let resolver = EnsResolverService::from_config(&config).await?;

    let mut failures = 0;
    for host in &hostnames {
        let hostname = substitution.substitute(host);
        let result = match resolver.resolve_ens(&hostname).await {
            Ok(result) => result,
            Err(e) => {
                println!("[ERR] {}: {}", hostname, e);
                failures += 1;
                continue;
            }
        };

        let Some(record) = &result.record else {
            println!("[--] {}: unsupported content hash", hostname);
            continue;
        };

        match record_to_proxy_record(record, &proxy_config) {
            Ok(ProxyOutcome::Proxy(proxy)) => {
                println!("[OK] {} (resolverExists: {})", hostname, result.resolver_exists);
                for (name, value) in proxy.headers(record) {
                    println!("  {}: {}", name, value);
                }
                if let Some(ttl) = resolver.ttl(&hostname).await {
                    println!("  ttl: {}s", ttl.as_secs());
                }
            }
            Ok(ProxyOutcome::UnableToRedirect) => {
                println!("[--] {}: no content hash and no socials endpoint", hostname);
            }
            Err(e) => {
                println!("[ERR] {}: {}", hostname, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} hostnames failed", failures, hostnames.len());
    }
    Ok(())
}
