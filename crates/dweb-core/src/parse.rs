//! Content-hash URI -> [`Record`]

use tracing::{debug, error};

use crate::normalize::{format_cid, get_peer_id, CidFormat};
use crate::record::{Codec, Record};

/// Parse a `{scheme}://{id}` content hash into a typed record for `hostname`
///
/// Returns `None` for unknown schemes and for identifiers that do not
/// normalize. IPNS names that look like DNSLink domains are kept verbatim.
pub fn parse_record(content: &str, hostname: &str) -> Option<Record> {
    if let Some(value) = content.strip_prefix("ipfs://") {
        let cid = format_cid(value, hostname, CidFormat::Content)?;
        return Some(Record::content(Codec::IpfsNs, cid, hostname));
    }

    if let Some(value) = content.strip_prefix("ipns://") {
        let Some(peer_id) = get_peer_id(value, hostname) else {
            error!(ipnsval = value, hostname, "not supported");
            return None;
        };
        return Some(Record::content(Codec::IpnsNs, peer_id, hostname));
    }

    if let Some(tx_id) = content.strip_prefix("arweave://") {
        return Some(Record::content(Codec::ArweaveNs, tx_id, hostname));
    }

    if let Some(reference) = content.strip_prefix("bzz://") {
        return Some(Record::content(Codec::Swarm, reference, hostname));
    }

    debug!(content, hostname, "unsupported content hash scheme");
    None
}

/// Rewrite a gateway path (`/ipns/x`, `/ipfs/x`) to `ipns://x` / `ipfs://x`
///
/// A local IPFS node answers name lookups with the internal path form;
/// anything else is returned unchanged.
pub fn internal_path_to_canonical(content: &str) -> String {
    if let Some(rest) = content.strip_prefix("/ipns/") {
        format!("ipns://{}", rest)
    } else if let Some(rest) = content.strip_prefix("/ipfs/") {
        format!("ipfs://{}", rest)
    } else {
        content.to_string()
    }
}
