//! Error types for dweb-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid gateway URL: {0}")]
    InvalidGatewayUrl(String),

    #[error("Invalid socials redirect URL for {ens_name}: {url}")]
    InvalidSocialsUrl { ens_name: String, url: String },

    #[error("IPNS name can not be encoded as a DNS fragment: {ens_name}")]
    UnencodableDnsLabel { ens_name: String },

    #[error("Invalid hostname substitution configuration: {0}")]
    InvalidHostnameSubstitution(String),
}
