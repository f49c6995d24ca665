//! Proxy record builder: turns a [`Record`] into gateway addressing

use std::fmt;

use tracing::{debug, error};

use crate::arweave::arweave_url_to_sandbox_subdomain;
use crate::codes::MAX_DNS_LABEL;
use crate::config::ResolverConfig;
use crate::normalize::normalize_url_fragment_for_ipfs_subdomain_gateway;
use crate::record::{Codec, ProxyRecord, Record};
use crate::{Error, Result};

/// Gateway base URL that keeps the port exactly as configured
///
/// General-purpose URL parsers drop a port equal to the scheme default
/// (`https://arweave.net:443` becomes `arweave.net`), which changes the
/// location the proxy reports. This type keeps the authority verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayUrl {
    scheme: String,
    host: String,
    port: Option<String>,
    /// Everything after the authority (path, query, fragment), possibly empty
    rest: String,
}

impl GatewayUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidGatewayUrl(input.to_string());

        let (scheme, remainder) = input.split_once("://").ok_or_else(invalid)?;
        let scheme_ok = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(invalid());
        }

        let split = remainder.find(['/', '?', '#']).unwrap_or(remainder.len());
        let (authority, rest) = remainder.split_at(split);
        if authority.contains('@') {
            return Err(invalid());
        }

        let (host, port) = if authority.starts_with('[') {
            let end = authority.find(']').ok_or_else(invalid)?;
            let (host, tail) = authority.split_at(end + 1);
            match tail {
                "" => (host, None),
                tail => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() || host.contains(':') && !host.starts_with('[') {
            return Err(invalid());
        }
        if let Some(port) = port {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
            port: port.map(str::to_string),
            rest: rest.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port as written in the configuration, including default ports
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// `host[:port]`
    pub fn authority(&self) -> String {
        match &self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Path plus query, without fragment; `/` when empty
    pub fn path_and_query(&self) -> String {
        let without_fragment = self.rest.split('#').next().unwrap_or_default();
        if without_fragment.is_empty() {
            "/".to_string()
        } else if without_fragment.starts_with('?') {
            format!("/{}", without_fragment)
        } else {
            without_fragment.to_string()
        }
    }

    /// Location header value: authority plus path, no scheme, no trailing slash
    pub fn location(&self) -> String {
        let path = self.rest.split(['?', '#']).next().unwrap_or_default();
        format!("{}{}", self.authority(), path.trim_end_matches('/'))
    }

    /// Same gateway with `label` prepended to the host
    pub fn with_subdomain(&self, label: &str) -> Self {
        Self {
            host: format!("{}.{}", label, self.host),
            ..self.clone()
        }
    }
}

impl fmt::Display for GatewayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority(), self.rest)
    }
}

/// Gateway settings the proxy builder reads
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub ipfs_gateway: GatewayUrl,
    /// Serve IPFS/IPNS as `{id}.{ipfs|ipns}.{gateway}` instead of `/{ipfs|ipns}/{id}/`
    pub subdomain_support: bool,
    pub arweave_gateway: GatewayUrl,
    pub swarm_gateway: GatewayUrl,
    /// Socials landing page template; `{ens}` is replaced by the name
    pub socials_endpoint: Option<String>,
}

impl ProxyConfig {
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        Ok(Self {
            ipfs_gateway: GatewayUrl::parse(&config.ipfs.backend)?,
            subdomain_support: config.ipfs.subdomain_support,
            arweave_gateway: GatewayUrl::parse(&config.arweave.backend)?,
            swarm_gateway: GatewayUrl::parse(&config.swarm.backend)?,
            socials_endpoint: config.ens.socials_endpoint.clone(),
        })
    }
}

/// Result of [`record_to_proxy_record`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOutcome {
    Proxy(ProxyRecord),
    /// Socials redirect requested but no endpoint configured; the caller
    /// must treat this like an unsupported record
    UnableToRedirect,
}

/// Build proxy addressing for a record
///
/// Fails only when an IPFS/IPNS record can not be placed in a single DNS
/// label at all: neither the identifier nor the escaped ENS name fits, and
/// any other label could resolve back to the origin it is meant to isolate.
pub fn record_to_proxy_record(record: &Record, config: &ProxyConfig) -> Result<ProxyOutcome> {
    match record {
        Record::SocialsRedirect { ens_name } => socials_redirect(ens_name, config),
        Record::Content {
            codec,
            content_identifier,
            ens_name,
        } => {
            let proxy = match codec {
                Codec::IpfsNs | Codec::IpnsNs => {
                    ipfs_family(*codec, content_identifier, ens_name, config)?
                }
                Codec::ArweaveNs => ProxyRecord {
                    location: arweave_url_to_sandbox_subdomain(content_identifier, &config.arweave_gateway)
                        .location(),
                    path: ensure_trailing_slash(&format!("/{}", content_identifier)),
                    override_codec: None,
                },
                Codec::Swarm => ProxyRecord {
                    location: config.swarm_gateway.location(),
                    path: ensure_trailing_slash(&format!("/bzz/{}", content_identifier)),
                    override_codec: None,
                },
            };
            Ok(ProxyOutcome::Proxy(proxy))
        }
    }
}

fn socials_redirect(ens_name: &str, config: &ProxyConfig) -> Result<ProxyOutcome> {
    let Some(template) = &config.socials_endpoint else {
        debug!(ens_name, "no socials endpoint configured");
        return Ok(ProxyOutcome::UnableToRedirect);
    };

    let url = template.replace("{ens}", &encode_uri(ens_name));
    let redirect = GatewayUrl::parse(&url).map_err(|_| Error::InvalidSocialsUrl {
        ens_name: ens_name.to_string(),
        url: url.clone(),
    })?;

    Ok(ProxyOutcome::Proxy(ProxyRecord {
        location: redirect.authority(),
        path: ensure_trailing_slash(&redirect.path_and_query()),
        override_codec: None,
    }))
}

fn ipfs_family(codec: Codec, id: &str, ens_name: &str, config: &ProxyConfig) -> Result<ProxyRecord> {
    let namespace = codec.gateway_namespace().unwrap_or("ipfs");

    if !config.subdomain_support {
        return Ok(ProxyRecord {
            location: config.ipfs_gateway.location(),
            path: format!("/{}/{}/", namespace, id),
            override_codec: None,
        });
    }

    let label = match codec {
        Codec::IpnsNs => normalize_url_fragment_for_ipfs_subdomain_gateway(id),
        _ => id.to_string(),
    };
    if label.len() <= MAX_DNS_LABEL {
        return Ok(ProxyRecord {
            location: config
                .ipfs_gateway
                .with_subdomain(&format!("{}.{}", label, namespace))
                .location(),
            path: "/".to_string(),
            override_codec: None,
        });
    }

    // The gateway re-resolves `{name}.ipns` itself; it must never be the
    // label of the origin hostname or the lookup loops.
    let encoded_name = normalize_url_fragment_for_ipfs_subdomain_gateway(ens_name);
    if encoded_name.len() <= MAX_DNS_LABEL {
        debug!(ens_name, id, "identifier exceeds DNS label, addressing by name");
        return Ok(ProxyRecord {
            location: config
                .ipfs_gateway
                .with_subdomain(&format!("{}.ipns", encoded_name))
                .location(),
            path: "/".to_string(),
            override_codec: Some(Codec::IpnsNs),
        });
    }

    error!(ens_name, id, codec = %codec, "IPNS name can not be encoded as a DNS fragment");
    Err(Error::UnencodableDnsLabel {
        ens_name: ens_name.to_string(),
    })
}

fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Percent-encode the way JavaScript's `encodeURI` does
fn encode_uri(input: &str) -> String {
    const UNESCAPED: &str = "-_.!~*'();/?:@&=+$,#";
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || UNESCAPED.contains(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).as_bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}
