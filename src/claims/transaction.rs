//! Tracked claim transactions.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Passed,
    Failed,
}

impl TransactionStatus {
    /// `passed` and `failed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position in the lifecycle. Writes may only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Queued by the backend, no settlement hash yet.
    Submitted,
    /// Settlement hash known, waiting for the receipt.
    Broadcast,
    /// `passed` or `failed`.
    Settled,
}

/// Store identity of a transaction: one record per event per address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxIdentity {
    pub key: String,
    pub address: Address,
}

/// A claim being tracked from submission to settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Key of the owning event.
    pub key: String,
    /// Checksummed claimant address.
    pub address: Address,
    /// Backend queue entry.
    pub queue_uid: String,
    /// Delivery-chain hash, set once the queue reports a settlement attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub status: TransactionStatus,
}

impl Transaction {
    /// A freshly submitted claim: pending, no hash.
    pub fn new(key: impl Into<String>, address: Address, queue_uid: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            address,
            queue_uid: queue_uid.into(),
            hash: None,
            status: TransactionStatus::Pending,
        }
    }

    pub fn identity(&self) -> TxIdentity {
        TxIdentity {
            key: self.key.clone(),
            address: self.address,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn stage(&self) -> Stage {
        match (self.status.is_terminal(), &self.hash) {
            (true, _) => Stage::Settled,
            (false, Some(_)) => Stage::Broadcast,
            (false, None) => Stage::Submitted,
        }
    }

    /// Same claim with the settlement hash recorded; still pending.
    pub fn with_hash(&self, hash: impl Into<String>) -> Self {
        Self {
            hash: Some(hash.into()),
            ..self.clone()
        }
    }

    /// Same claim in a terminal status.
    pub fn settled(&self, status: TransactionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
