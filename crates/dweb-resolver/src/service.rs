//! Resolution orchestrator: hostname -> [`ResolveEnsResult`]

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::arweave::{ArweaveRecordResolver, ArweaveResolver, WarpStateReader};
use crate::cache::{memoize, CacheService, MemoryCache};
use crate::error::Result;
use crate::kubo::{IpnsResolver, KuboApiService};
use crate::nameservice::NameServiceRouter;
use dweb_core::{internal_path_to_canonical, parse_record, ResolveEnsResult, ResolverConfig};

/// Cache namespace for [`EnsResolverService::resolve_ens`]
pub const RESOLVE_ENS_NAMESPACE: &str = "resolveEns";

pub struct EnsResolverService {
    router: NameServiceRouter,
    arweave: Arc<dyn ArweaveRecordResolver>,
    kubo: Option<Arc<dyn IpnsResolver>>,
    cache: Arc<dyn CacheService>,
}

impl EnsResolverService {
    pub fn new(
        router: NameServiceRouter,
        arweave: Arc<dyn ArweaveRecordResolver>,
        kubo: Option<Arc<dyn IpnsResolver>>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            router,
            arweave,
            kubo,
            cache,
        }
    }

    pub async fn from_config(config: &ResolverConfig) -> Result<Self> {
        let router = NameServiceRouter::from_config(config).await?;
        let reader = WarpStateReader::from_config(&config.arweave)?;
        let kubo: Option<Arc<dyn IpnsResolver>> = match config.ipfs.kubo_api_url {
            Some(_) => Some(Arc::new(KuboApiService::from_config(&config.ipfs)?)),
            None => None,
        };
        let cache = MemoryCache::new(Duration::from_secs(config.cache.ttl_secs));

        Ok(Self::new(
            router,
            Arc::new(ArweaveResolver::new(Arc::new(reader))),
            kubo,
            Arc::new(cache),
        ))
    }

    /// Resolve `hostname`, memoized under [`RESOLVE_ENS_NAMESPACE`]
    ///
    /// Names are case-insensitive: the lowercased name is both the cache key
    /// and what the name services hash.
    ///
    /// A name with no content hash is a socials redirect with
    /// `resolver_exists == false`. A content hash that can not be parsed is
    /// `record == None`. Upstream failures propagate and are not cached.
    pub async fn resolve_ens(&self, hostname: &str) -> Result<ResolveEnsResult> {
        let hostname = hostname.to_ascii_lowercase();
        memoize(self.cache.as_ref(), RESOLVE_ENS_NAMESPACE, &hostname, || {
            self.resolve_ens_uncached(&hostname)
        })
        .await
    }

    /// Remaining cache lifetime of a resolution
    pub async fn ttl(&self, hostname: &str) -> Option<Duration> {
        self.cache
            .get_ttl(RESOLVE_ENS_NAMESPACE, &hostname.to_ascii_lowercase())
            .await
    }

    async fn resolve_ens_uncached(&self, hostname: &str) -> Result<ResolveEnsResult> {
        match self.resolve(hostname).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(hostname, error = %e, "resolution failure");
                Err(e)
            }
        }
    }

    async fn resolve(&self, hostname: &str) -> Result<ResolveEnsResult> {
        let service = self.router.get_name_service_for_domain(hostname);
        let content_hash = service.get_content_hash(hostname).await?;
        debug!(hostname, content_hash = ?content_hash, "contenthash");

        let Some(mut content_hash) = content_hash else {
            return Ok(ResolveEnsResult::socials_redirect(hostname));
        };

        if let Some(tx_id) = content_hash.strip_prefix("arweave://") {
            debug!(hostname, ar_id = tx_id, "resolving arweave");
            let resolved = self.arweave.resolve_arweave(tx_id, hostname).await;
            content_hash = format!("arweave://{}", resolved);
        } else if content_hash.starts_with("ipns://") {
            if let Some(kubo) = &self.kubo {
                debug!(hostname, content_hash = %content_hash, "resolving ipns");
                if let Some(path) = kubo.resolve_ipns_name(&content_hash).await {
                    content_hash = internal_path_to_canonical(&path);
                }
            }
        }

        let record = parse_record(&content_hash, hostname);
        debug!(hostname, record = ?record, "record");
        Ok(ResolveEnsResult {
            record,
            resolver_exists: true,
        })
    }
}
