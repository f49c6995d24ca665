//! Error types for dweb-resolver

use alloy_primitives::Bytes;
use alloy_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("RPC error: {0}")]
    Rpc(#[from] TransportError),

    /// JSON-RPC error response from the node, e.g. a reverted `eth_call`
    #[error("Call exception: {0}")]
    CallException(String),

    /// Reverted call that returned revert data
    #[error("Call reverted: {message}")]
    Reverted { message: String, data: Bytes },

    #[error("Offchain lookup failed: {0}")]
    OffchainLookup(String),

    #[error("ABI decode error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Quorum of {quorum} not reached: best answer had {agreeing} of {providers} providers")]
    QuorumNotReached {
        quorum: usize,
        agreeing: usize,
        providers: usize,
    },

    #[error("No RPC providers configured")]
    NoProviders,

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Core(#[from] dweb_core::Error),
}

impl ResolverError {
    /// The node answered the call with an error, as opposed to the request
    /// never getting an answer
    pub fn is_call_exception(&self) -> bool {
        matches!(
            self,
            ResolverError::CallException(_)
                | ResolverError::Reverted { .. }
                | ResolverError::Rpc(TransportError::ErrorResp(_))
        )
    }

    /// ABI-encoded revert data carried by a reverted call, if any
    pub fn revert_data(&self) -> Option<Bytes> {
        match self {
            ResolverError::Reverted { data, .. } => Some(data.clone()),
            ResolverError::Rpc(TransportError::ErrorResp(payload)) => payload.as_revert_data(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
