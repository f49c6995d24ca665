//! Arweave sandbox subdomains
//!
//! Every Arweave transaction is served from `{base32(txid)}.{gateway}` so
//! unrelated content never shares cookies or storage. The gateway uses the
//! same derivation, so the label must match it byte for byte.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use multibase::Base;
use tracing::error;

use crate::proxy::GatewayUrl;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Lowercase, unpadded base32 of the base64-decoded transaction id
pub fn arweave_tx_id_to_sandbox_subdomain_id(tx_id: &str) -> Option<String> {
    let decoded = URL_SAFE_LENIENT
        .decode(tx_id)
        .or_else(|_| STANDARD_LENIENT.decode(tx_id));

    match decoded {
        Ok(bytes) if !bytes.is_empty() => Some(Base::Base32Lower.encode(bytes)),
        Ok(_) => {
            error!(tx_id, "invalid arweave tx id: empty");
            None
        }
        Err(e) => {
            error!(tx_id, error = %e, "invalid arweave tx id");
            None
        }
    }
}

/// Prefix the gateway host with the sandbox label for `tx_id`
///
/// If the id can not be encoded the bare gateway is returned: isolation is
/// lost but the content stays reachable.
pub fn arweave_url_to_sandbox_subdomain(tx_id: &str, gateway: &GatewayUrl) -> GatewayUrl {
    match arweave_tx_id_to_sandbox_subdomain_id(tx_id) {
        Some(subdomain) => gateway.with_subdomain(&subdomain),
        None => gateway.clone(),
    }
}
