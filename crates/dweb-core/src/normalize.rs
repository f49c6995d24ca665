//! CID and PeerID normalization
//!
//! Identifiers end up as DNS labels on a subdomain gateway, so everything is
//! re-encoded as CIDv1 in a case-insensitive base: base32 for content, base36
//! for IPNS peer ids (shorter, and what gateways expect for `.ipns.`).

use cid::Cid;
use multibase::Base;
use multihash::Multihash;
use thiserror::Error;
use tracing::{error, info};

use crate::codes::{IDENTITY, LIBP2P_KEY, PUBLIC_KEY_TAG, SHA2_256};

/// Target encoding for [`format_cid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CidFormat {
    /// CIDv1, base32
    #[default]
    Content,
    /// CIDv1, base36
    PeerId,
}

impl CidFormat {
    fn base(self) -> Base {
        match self {
            CidFormat::Content => Base::Base32Lower,
            CidFormat::PeerId => Base::Base36Lower,
        }
    }
}

#[derive(Debug, Error)]
enum CidError {
    #[error("Base prefix lookup failed {0:?}")]
    UnknownPrefix(Option<char>),

    #[error(transparent)]
    Cid(#[from] cid::Error),
}

#[derive(Debug, Error)]
enum PeerIdError {
    #[error("Unable to decode multibase string {0:?}")]
    UnknownMultibase(String),

    #[error("Non-base36 character")]
    NonBase36,

    #[error("Invalid {0:?} encoding")]
    InvalidEncoding(Base),

    #[error("Supplied PeerID CID has codec {0:#x}, expected libp2p-key")]
    NotLibp2pKey(u64),

    #[error("Identity PeerID digest is not a public key")]
    NotPublicKey,

    #[error(transparent)]
    Multihash(#[from] multihash::Error),

    #[error(transparent)]
    Cid(#[from] cid::Error),
}

/// Re-encode a CID string as CIDv1 in the base selected by `format`
///
/// The leading character is looked up in the multibase prefix table. A `Q`
/// with no multibase match is a legacy base58btc CIDv0 and is upgraded to
/// CIDv1 base32. Anything else is logged and yields `None`.
pub fn format_cid(value: &str, hostname: &str, format: CidFormat) -> Option<String> {
    match reencode_cid(value, format) {
        Ok(cid) => Some(cid),
        Err(e) => {
            error!(value, hostname, error = %e, "Error converting IPFS multihash");
            None
        }
    }
}

fn reencode_cid(value: &str, format: CidFormat) -> Result<String, CidError> {
    let prefix = value.chars().next();
    match prefix.and_then(|c| Base::from_code(c).ok()) {
        Some(_) => {
            let cid = Cid::try_from(value)?.into_v1()?;
            Ok(cid.to_string_of_base(format.base())?)
        }
        None if prefix == Some('Q') => {
            let cid = Cid::try_from(value)?.into_v1()?;
            Ok(cid.to_string())
        }
        None => Err(CidError::UnknownPrefix(prefix)),
    }
}

/// Normalize an IPNS name to a base36 CIDv1 peer id
///
/// Two parse failures are not errors and hand back `value` untouched, since
/// the name is most likely a DNSLink domain rather than a key:
/// - the string is not multibase at all
/// - the string claims base36 but contains a non-base36 character
///
/// Any other failure is logged and yields `None`.
pub fn get_peer_id(value: &str, hostname: &str) -> Option<String> {
    let cid = match peer_id_to_cid(value) {
        Ok(cid) => cid,
        Err(PeerIdError::UnknownMultibase(_)) => {
            info!(
                value,
                hostname,
                "Unable to decode multibase string, probably using another ENS record for hostname"
            );
            return Some(value.to_string());
        }
        Err(PeerIdError::NonBase36) => {
            info!(value, hostname, "Non-base36 character, probably using DNSLink");
            return Some(value.to_string());
        }
        Err(e) => {
            error!(value, hostname, error = %e, "Error converting IPNS PeerID");
            return None;
        }
    };

    format_cid(&cid.to_string(), hostname, CidFormat::PeerId)
}

/// Decode a peer id; an identity-hashed id must embed a public key
fn peer_id_to_cid(value: &str) -> Result<Cid, PeerIdError> {
    let cid = decode_peer_id(value)?;
    let hash = cid.hash();
    if hash.code() == IDENTITY && hash.digest().first() != Some(&PUBLIC_KEY_TAG) {
        return Err(PeerIdError::NotPublicKey);
    }
    Ok(cid)
}

fn decode_peer_id(value: &str) -> Result<Cid, PeerIdError> {
    let Some(first) = value.chars().next() else {
        return Err(PeerIdError::UnknownMultibase(value.to_string()));
    };

    // Bare base58btc multihash: `Qm...` (RSA) or `12D3...` (ed25519)
    if first == '1' || first == 'Q' {
        let bytes = Base::Base58Btc
            .decode(value)
            .map_err(|_| PeerIdError::InvalidEncoding(Base::Base58Btc))?;
        let hash = Multihash::<64>::from_bytes(&bytes)?;
        return Ok(Cid::new_v1(LIBP2P_KEY, hash));
    }

    let base = Base::from_code(first).map_err(|_| PeerIdError::UnknownMultibase(value.to_string()))?;
    let bytes = base.decode(&value[first.len_utf8()..]).map_err(|_| match base {
        Base::Base36Lower | Base::Base36Upper => PeerIdError::NonBase36,
        other => PeerIdError::InvalidEncoding(other),
    })?;

    peer_id_from_bytes(&bytes)
}

fn peer_id_from_bytes(bytes: &[u8]) -> Result<Cid, PeerIdError> {
    if let Ok(hash) = Multihash::<64>::from_bytes(bytes) {
        if hash.code() == IDENTITY || hash.code() == SHA2_256 {
            return Ok(Cid::new_v1(LIBP2P_KEY, hash));
        }
    }

    let cid = Cid::try_from(bytes)?;
    if cid.codec() != LIBP2P_KEY {
        return Err(PeerIdError::NotLibp2pKey(cid.codec()));
    }
    Ok(cid)
}

/// Escape an identifier into a single DNS label for a subdomain gateway
///
/// `-` becomes `--` and `.` becomes `-`. Not idempotent: applying it twice
/// doubles every `--` again.
pub fn normalize_url_fragment_for_ipfs_subdomain_gateway(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        match c {
            '.' => out.push('-'),
            '-' => out.push_str("--"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID_V0: &str = "QmRAQB6YaCyidP37UdDnjFY5vQuiBrcqdyoW1CuDgwxkD4";

    fn ed25519_peer_multihash() -> Multihash<64> {
        // protobuf PublicKey { Type: Ed25519, Data: [0x2a; 32] }
        let mut key = vec![0x08, 0x01, 0x12, 0x20];
        key.extend_from_slice(&[0x2a; 32]);
        Multihash::wrap(IDENTITY, &key).unwrap()
    }

    #[test]
    fn test_dns_label_escape() {
        assert_eq!(normalize_url_fragment_for_ipfs_subdomain_gateway("a.b"), "a-b");
        assert_eq!(normalize_url_fragment_for_ipfs_subdomain_gateway("a--b"), "a----b");
        assert_eq!(
            normalize_url_fragment_for_ipfs_subdomain_gateway("vitalik.jsonapi.eth"),
            "vitalik-jsonapi-eth"
        );
    }

    #[test]
    fn test_dns_label_escape_is_not_idempotent() {
        let once = normalize_url_fragment_for_ipfs_subdomain_gateway("my-site.eth");
        let twice = normalize_url_fragment_for_ipfs_subdomain_gateway(&once);
        assert_eq!(once, "my--site-eth");
        assert_eq!(twice, "my----site--eth");
    }

    #[test]
    fn test_cidv0_upgrades_to_base32_v1_with_same_multihash() {
        let v1 = format_cid(CID_V0, "x.eth", CidFormat::Content).unwrap();
        assert!(v1.starts_with("bafybei"));

        let original = Cid::try_from(CID_V0).unwrap();
        let upgraded = Cid::try_from(v1.as_str()).unwrap();
        assert_eq!(original.hash(), upgraded.hash());
        assert_eq!(upgraded.version(), cid::Version::V1);
    }

    #[test]
    fn test_base32_cid_is_stable() {
        let v1 = format_cid(CID_V0, "x.eth", CidFormat::Content).unwrap();
        assert_eq!(format_cid(&v1, "x.eth", CidFormat::Content).unwrap(), v1);
    }

    #[test]
    fn test_peer_id_format_uses_base36() {
        let v1 = format_cid(CID_V0, "x.eth", CidFormat::Content).unwrap();
        let b36 = format_cid(&v1, "x.eth", CidFormat::PeerId).unwrap();
        assert!(b36.starts_with('k'));
        assert_eq!(
            Cid::try_from(b36.as_str()).unwrap().hash(),
            Cid::try_from(CID_V0).unwrap().hash()
        );
    }

    #[test]
    fn test_unknown_prefix_is_rejected() {
        assert_eq!(format_cid("xyz", "x.eth", CidFormat::Content), None);
        assert_eq!(format_cid("", "x.eth", CidFormat::Content), None);
        assert_eq!(format_cid("Qnotacid", "x.eth", CidFormat::Content), None);
    }

    #[test]
    fn test_base58_peer_id_becomes_base36_cid() {
        let hash = ed25519_peer_multihash();
        let peer_id = Base::Base58Btc.encode(hash.to_bytes());
        assert!(peer_id.starts_with("12D3KooW"));

        let normalized = get_peer_id(&peer_id, "x.eth").unwrap();
        assert!(normalized.starts_with("k51qzi5uqu5d"));

        let cid = Cid::try_from(normalized.as_str()).unwrap();
        assert_eq!(cid.codec(), LIBP2P_KEY);
        assert_eq!(cid.hash(), &hash);
    }

    #[test]
    fn test_base36_peer_id_is_stable() {
        let cid = Cid::new_v1(LIBP2P_KEY, ed25519_peer_multihash());
        let b36 = cid.to_string_of_base(Base::Base36Lower).unwrap();
        assert_eq!(get_peer_id(&b36, "x.eth").unwrap(), b36);
    }

    #[test]
    fn test_dnslink_names_pass_through() {
        // not multibase at all
        assert_eq!(get_peer_id("app.uniswap.org", "uniswap.eth").unwrap(), "app.uniswap.org");
        // base36 prefix with a non-base36 character
        assert_eq!(get_peer_id("kitty.example", "kitty.eth").unwrap(), "kitty.example");
    }

    #[test]
    fn test_non_libp2p_cid_is_not_a_peer_id() {
        let content = format_cid(CID_V0, "x.eth", CidFormat::Content).unwrap();
        assert_eq!(get_peer_id(&content, "x.eth"), None);
    }

    #[test]
    fn test_identity_peer_id_must_embed_public_key() {
        let hash = Multihash::<64>::wrap(IDENTITY, b"app.uniswap.org").unwrap();
        let base58 = Base::Base58Btc.encode(hash.to_bytes());
        assert_eq!(get_peer_id(&base58, "uniswap.eth"), None);

        let b36 = Cid::new_v1(LIBP2P_KEY, hash)
            .to_string_of_base(Base::Base36Lower)
            .unwrap();
        assert_eq!(get_peer_id(&b36, "uniswap.eth"), None);
    }

    #[test]
    fn test_invalid_base58_peer_id_is_an_error() {
        assert_eq!(get_peer_id("Q0OIl", "x.eth"), None);
    }
}
