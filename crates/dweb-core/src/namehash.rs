//! ENS namehash and DNS wire-format names

use alloy_primitives::{keccak256, B256};

/// ENS namehash (EIP-137)
///
/// A label written as `[<64 hex chars>]` is taken as an already-hashed
/// label, which is how tld-scoped registries encode their identifier.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }

    for label in name.rsplit('.') {
        let label_hash = encoded_labelhash(label).unwrap_or_else(|| keccak256(label.as_bytes()));
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

fn encoded_labelhash(label: &str) -> Option<B256> {
    let hex_part = label.strip_prefix('[')?.strip_suffix(']')?;
    if hex_part.len() != 64 {
        return None;
    }
    let bytes = hex::decode(hex_part).ok()?;
    Some(B256::from_slice(&bytes))
}

/// DNS wire-format encoding of a name (ENSIP-10 `resolve(bytes name, ...)`)
///
/// Labels longer than 255 bytes can not be length-prefixed and are replaced
/// by their encoded labelhash, as ENS clients do.
pub fn dns_encode(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|l| !l.is_empty()) {
        if label.len() > 255 {
            let hashed = format!("[{}]", hex::encode(keccak256(label.as_bytes())));
            out.push(hashed.len() as u8);
            out.extend_from_slice(hashed.as_bytes());
        } else {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
    }
    out.push(0);
    out
}
