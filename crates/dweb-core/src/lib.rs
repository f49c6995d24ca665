//! dweb-core: name-to-content pipeline for Web3 name gateways
//!
//! This crate holds the synchronous half of the resolver: everything that
//! turns an on-chain content hash into the addressing an HTTP gateway needs,
//! without touching the network.
//!
//! - Codec decoding: raw ENS `contenthash` bytes -> `{codec}://{content}`
//! - CID / PeerID normalization across multibase encodings
//! - Record parsing: content-hash URI -> typed [`Record`]
//! - Proxy addressing: [`Record`] -> [`ProxyRecord`] (location + path)
//! - Arweave sandbox subdomains, ENS namehash, hostname substitution
//!
//! # Isolation model
//!
//! Every piece of content is served from its own DNS label on the gateway
//! (`{cid}.ipfs.gateway`, `{base32(txid)}.arweave.gateway`) so that unrelated
//! sites never share a browser origin. A DNS label holds at most 63 bytes;
//! identifiers that do not fit fall back to the escaped ENS name, and when
//! neither fits the builder refuses to produce a location at all.
//!
//! | Codec        | Location                          | Path              |
//! |--------------|-----------------------------------|-------------------|
//! | `ipfs-ns`    | `{cid-b32}.ipfs.{gateway}`        | `/`               |
//! | `ipns-ns`    | `{escaped-peer-id}.ipns.{gateway}`| `/`               |
//! | `arweave-ns` | `{base32(txid)}.{gateway}`        | `/{txid}/`        |
//! | `swarm`      | `{gateway}`                       | `/bzz/{ref}/`     |

mod arweave;
mod codec;
mod config;
mod error;
mod hostname;
mod namehash;
mod normalize;
mod parse;
mod proxy;
mod record;

pub use arweave::{arweave_tx_id_to_sandbox_subdomain_id, arweave_url_to_sandbox_subdomain};
pub use codec::{decode_content_hash, standard_content_hash, UnsupportedContentHash};
pub use config::{
    ArweaveConfig, BaseConfig, CacheConfig, EnsConfig, EthereumConfig, GnosisConfig, IpfsConfig,
    ResolverConfig, SwarmConfig,
};
pub use error::Error;
pub use hostname::{parse_raw_config, HostnameSubstitution};
pub use namehash::{dns_encode, namehash};
pub use normalize::{format_cid, get_peer_id, normalize_url_fragment_for_ipfs_subdomain_gateway, CidFormat};
pub use parse::{internal_path_to_canonical, parse_record};
pub use proxy::{record_to_proxy_record, GatewayUrl, ProxyConfig, ProxyOutcome};
pub use record::{Codec, ProxyRecord, Record, ResolveEnsResult};

pub type Result<T> = std::result::Result<T, Error>;

/// Multicodec and multihash codes used across the pipeline
pub mod codes {
    /// dag-pb, the codec of every CIDv0
    pub const DAG_PB: u64 = 0x70;

    /// libp2p-key, the codec of CIDv1 peer ids
    pub const LIBP2P_KEY: u64 = 0x72;

    /// Swarm manifest codec
    pub const SWARM_MANIFEST: u64 = 0xfa;

    /// Identity multihash (digest is the raw payload)
    pub const IDENTITY: u64 = 0x00;

    /// First byte of a protobuf-encoded libp2p public key (KeyType field tag)
    pub const PUBLIC_KEY_TAG: u8 = 0x08;

    /// sha2-256 multihash
    pub const SHA2_256: u64 = 0x12;

    /// keccak-256 multihash
    pub const KECCAK_256: u64 = 0x1b;

    /// Content-hash namespace codes (ENSIP-7)
    pub const IPFS_NS: u64 = 0xe3;
    pub const SWARM_NS: u64 = 0xe4;
    pub const IPNS_NS: u64 = 0xe5;
    pub const ONION: u64 = 0x01bc;
    pub const ONION3: u64 = 0x01bd;
    pub const SKYNET_NS: u64 = 0xb19910;
    pub const ARWEAVE_NS: u64 = 0xb29910;

    /// Longest permitted DNS label
    pub const MAX_DNS_LABEL: usize = 63;
}
