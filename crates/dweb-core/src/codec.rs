//! Content-hash decoding (ENSIP-7)
//!
//! Two decoders live here:
//! - [`standard_content_hash`]: the narrow set of encodings a stock ENS
//!   client understands (dag-pb IPFS, libp2p-key IPNS, Swarm manifests).
//! - [`decode_content_hash`]: the full multicodec table, used as the fallback
//!   when the standard decoder gives up and for name services that only
//!   return raw bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use cid::Cid;
use multibase::Base;
use thiserror::Error;
use tracing::{debug, error};

use crate::codes::{
    ARWEAVE_NS, IDENTITY, IPFS_NS, IPNS_NS, LIBP2P_KEY, ONION, ONION3, PUBLIC_KEY_TAG, SKYNET_NS,
    SWARM_NS,
};

const IPFS_DAG_PB_PREFIX: [u8; 4] = [0xe3, 0x01, 0x01, 0x70];
const IPNS_LIBP2P_PREFIX: [u8; 4] = [0xe5, 0x01, 0x01, 0x72];
const SWARM_KECCAK_PREFIX: [u8; 7] = [0xe4, 0x01, 0x01, 0xfa, 0x01, 0x1b, 0x20];

/// The standard decoder does not understand this content hash
///
/// Carries the raw bytes so callers can retry with [`decode_content_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported content hash data (0x{})", hex::encode(.data))]
pub struct UnsupportedContentHash {
    pub data: Vec<u8>,
}

/// Decode a content hash the way a stock ENS client does
///
/// IPFS and IPNS are rendered as a base58btc multihash, Swarm as the hex
/// keccak digest. Everything else (Arweave, legacy DNSLink names stored as
/// an identity hash, onion, ...) is [`UnsupportedContentHash`].
pub fn standard_content_hash(bytes: &[u8]) -> Result<String, UnsupportedContentHash> {
    for (scheme, prefix) in [("ipfs", &IPFS_DAG_PB_PREFIX), ("ipns", &IPNS_LIBP2P_PREFIX)] {
        if let Some(multihash) = bytes.strip_prefix(prefix.as_slice()) {
            let is_dnslink = scheme == "ipns"
                && multihash.first() == Some(&(IDENTITY as u8))
                && multihash.get(2) != Some(&PUBLIC_KEY_TAG);
            if !is_dnslink && multihash.len() >= 2 && multihash[1] as usize == multihash.len() - 2 {
                return Ok(format!("{}://{}", scheme, Base::Base58Btc.encode(multihash)));
            }
        }
    }

    if let Some(hash) = bytes.strip_prefix(SWARM_KECCAK_PREFIX.as_slice()) {
        if hash.len() == 32 {
            return Ok(format!("bzz://{}", hex::encode(hash)));
        }
    }

    Err(UnsupportedContentHash {
        data: bytes.to_vec(),
    })
}

/// Decode raw content-hash bytes into `{codec}://{content}`
///
/// Unknown codecs and undecodable payloads are logged and yield `None`;
/// callers treat that as "unsupported", not as a failure.
pub fn decode_content_hash(bytes: &[u8], name: &str, service: &str) -> Option<String> {
    let Some((codec, content)) = decode_multicodec(bytes) else {
        error!(
            name,
            service,
            data = %hex::encode(bytes),
            "unsupported fallback decode operation"
        );
        return None;
    };

    let content_hash = format!("{}://{}", uri_scheme(codec), content);
    debug!(name, service, content_hash = %content_hash, "getContentHash");
    Some(content_hash)
}

/// The multicodec table names Swarm `swarm`; every URI in the pipeline uses `bzz`
fn uri_scheme(codec: &'static str) -> &'static str {
    match codec {
        "swarm" => "bzz",
        other => other,
    }
}

fn decode_multicodec(bytes: &[u8]) -> Option<(&'static str, String)> {
    let (code, value) = unsigned_varint::decode::u64(bytes).ok()?;
    match code {
        IPFS_NS => {
            let cid = Cid::try_from(value).ok()?;
            Some(("ipfs", cid.to_string()))
        }
        IPNS_NS => Some(("ipns", decode_ipns(value)?)),
        SWARM_NS => {
            let cid = Cid::try_from(value).ok()?;
            Some(("swarm", hex::encode(cid.hash().digest())))
        }
        ARWEAVE_NS => Some(("arweave", URL_SAFE_NO_PAD.encode(value))),
        SKYNET_NS => Some(("skynet", URL_SAFE_NO_PAD.encode(value))),
        ONION => Some(("onion", String::from_utf8(value.to_vec()).ok()?)),
        ONION3 => Some(("onion3", String::from_utf8(value.to_vec()).ok()?)),
        _ => None,
    }
}

/// IPNS names are libp2p-key CIDs, except for legacy DNSLink names stored
/// as an identity multihash over the UTF-8 domain
fn decode_ipns(value: &[u8]) -> Option<String> {
    let cid = Cid::try_from(value).ok()?.into_v1().ok()?;
    let hash = cid.hash();

    if cid.codec() == LIBP2P_KEY && hash.code() == IDENTITY && hash.digest().first() != Some(&PUBLIC_KEY_TAG) {
        if let Ok(name) = std::str::from_utf8(hash.digest()) {
            return Some(name.to_string());
        }
    }

    cid.to_string_of_base(Base::Base36Lower).ok()
}
