//! IPNS pre-resolution through a Kubo node

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::Result;
use dweb_core::{normalize_url_fragment_for_ipfs_subdomain_gateway, IpfsConfig};

/// Resolves an `ipns://` URI to a gateway path such as `/ipfs/bafy...`
///
/// Best effort: every failure, including a timeout, is `None` and the
/// caller carries on with the unresolved name.
#[async_trait]
pub trait IpnsResolver: Send + Sync {
    async fn resolve_ipns_name(&self, uri: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct NameResolveResponse {
    #[serde(rename = "Path")]
    path: Option<String>,
}

/// Kubo RPC API client (`/api/v0/name/resolve`)
pub struct KuboApiService {
    client: reqwest::Client,
    api_url: Option<String>,
    auth: Option<String>,
}

impl KuboApiService {
    pub fn new(api_url: Option<String>, auth: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        match &api_url {
            Some(url) => info!(url = %url, "Kubo API URL is set"),
            None => info!("Kubo API URL is not set, all requests will be ignored"),
        }
        Ok(Self {
            client,
            api_url,
            auth,
        })
    }

    pub fn from_config(config: &IpfsConfig) -> Result<Self> {
        Self::new(
            config.kubo_api_url.clone(),
            config.kubo_auth.clone(),
            Duration::from_millis(config.kubo_timeout_ms),
        )
    }

    async fn name_resolve(&self, api_url: &str, name: &str) -> Result<Option<String>> {
        let arg = normalize_url_fragment_for_ipfs_subdomain_gateway(name);
        let mut request = self
            .client
            .post(format!("{}api/v0/name/resolve", api_url))
            .query(&[
                ("arg", arg.as_str()),
                ("recursive", "true"),
                ("nocache", "true"),
                ("dht-record-count", "16"),
                ("dht-timeout", "1m0s"),
                ("stream", "false"),
            ]);
        if let Some(auth) = &self.auth {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Basic {}", auth));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            debug!(name, status = %response.status(), "Failed to resolve IPNS name");
            return Ok(None);
        }

        let body: NameResolveResponse = response.json().await?;
        Ok(body.path.filter(|path| !path.is_empty()))
    }
}

#[async_trait]
impl IpnsResolver for KuboApiService {
    async fn resolve_ipns_name(&self, uri: &str) -> Option<String> {
        let Some(api_url) = &self.api_url else {
            debug!(uri, "Kubo API is not configured");
            return None;
        };
        let name = uri.strip_prefix("ipns://").unwrap_or(uri);

        match self.name_resolve(api_url, name).await {
            Ok(path) => path,
            Err(e) => {
                error!(uri, error = %e, "failed to statically resolve IPNS name");
                None
            }
        }
    }
}
