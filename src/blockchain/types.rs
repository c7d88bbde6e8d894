//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Errors that can occur during blockchain reads.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// No client is configured for this chain.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),

    /// A transaction hash reported by the backend could not be parsed.
    #[error("Invalid transaction hash: {0}")]
    InvalidHash(String),

    /// Bad chain configuration (URL, registry address).
    #[error("Invalid chain configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// The part of a delivery-chain receipt the reconciler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// `true` when the transaction executed, `false` when it reverted.
    pub status: bool,
    /// Block the transaction was mined in.
    pub block_number: Option<u64>,
}
