//! Resolution records and proxy addressing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend a content record points at
///
/// The codec dictates how the record's content identifier is read:
/// - `IpfsNs`: CIDv1, base32 (a valid DNS label)
/// - `IpnsNs`: CIDv1 peer id in base36, or a DNSLink name passed through
/// - `ArweaveNs`: raw Arweave transaction id (base64url)
/// - `Swarm`: raw Swarm reference (hex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    #[serde(rename = "ipfs-ns")]
    IpfsNs,
    #[serde(rename = "ipns-ns")]
    IpnsNs,
    #[serde(rename = "arweave-ns")]
    ArweaveNs,
    #[serde(rename = "swarm")]
    Swarm,
}

impl Codec {
    /// Wire name, as sent in `X-Content-Storage-Type`
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::IpfsNs => "ipfs-ns",
            Codec::IpnsNs => "ipns-ns",
            Codec::ArweaveNs => "arweave-ns",
            Codec::Swarm => "swarm",
        }
    }

    /// Gateway namespace segment for IPFS-family codecs
    pub fn gateway_namespace(&self) -> Option<&'static str> {
        match self {
            Codec::IpfsNs => Some("ipfs"),
            Codec::IpnsNs => Some("ipns"),
            Codec::ArweaveNs | Codec::Swarm => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving a hostname
///
/// An unsupported or unparseable content hash is represented by the absence
/// of a record (`Option<Record>::None`), not by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum Record {
    /// Content stored on one of the supported backends
    #[serde(rename = "Record", rename_all = "camelCase")]
    Content {
        codec: Codec,
        content_identifier: String,
        ens_name: String,
    },
    /// Name exists but has no content hash; redirect to a profile page
    #[serde(rename = "ens-socials-redirect", rename_all = "camelCase")]
    SocialsRedirect { ens_name: String },
}

impl Record {
    pub fn content(codec: Codec, content_identifier: impl Into<String>, ens_name: impl Into<String>) -> Self {
        Record::Content {
            codec,
            content_identifier: content_identifier.into(),
            ens_name: ens_name.into(),
        }
    }

    pub fn ens_name(&self) -> &str {
        match self {
            Record::Content { ens_name, .. } | Record::SocialsRedirect { ens_name } => ens_name,
        }
    }

    pub fn codec(&self) -> Option<Codec> {
        match self {
            Record::Content { codec, .. } => Some(*codec),
            Record::SocialsRedirect { .. } => None,
        }
    }
}

/// Where and how the HTTP layer should fetch a record's content
///
/// `location` is a bare authority (`host[:port]`, no scheme) and `path`
/// always starts and ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub location: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_codec: Option<Codec>,
}

impl ProxyRecord {
    /// Value of `X-Content-Storage-Type` for this proxy record
    pub fn storage_type(&self, record: &Record) -> Option<Codec> {
        match record {
            Record::SocialsRedirect { .. } => None,
            Record::Content { codec, .. } => Some(self.override_codec.unwrap_or(*codec)),
        }
    }

    /// Response headers handed to the proxy in front of the gateway
    pub fn headers(&self, record: &Record) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-Content-Location", self.location.clone()),
            ("X-Content-Path", self.path.clone()),
        ];
        if let Some(codec) = self.storage_type(record) {
            headers.push(("X-Content-Storage-Type", codec.to_string()));
        }
        headers
    }
}

/// Result of `resolveEns`, as stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveEnsResult {
    pub record: Option<Record>,
    #[serde(rename = "resolverExists")]
    pub resolver_exists: bool,
}

impl ResolveEnsResult {
    /// Name with no resolver or no content hash
    pub fn socials_redirect(hostname: &str) -> Self {
        Self {
            record: Some(Record::SocialsRedirect {
                ens_name: hostname.to_string(),
            }),
            resolver_exists: false,
        }
    }
}
