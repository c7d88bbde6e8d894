//! Delivery queue wire types and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend acknowledgement of a claim submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAck {
    /// Queue entry created for the claim. Empty when the backend omitted it.
    #[serde(default)]
    pub queue_uid: String,
}

/// State of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    #[serde(rename = "IN_PROCESS", alias = "pending")]
    Pending,
    #[serde(rename = "FINISH", alias = "finished")]
    Finished,
    #[serde(rename = "FINISH_WITH_ERROR", alias = "finished_with_error")]
    FinishedWithError,
}

/// Settlement attempt reported by the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Delivery-chain transaction hash, if one was broadcast.
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// A queue entry as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    #[serde(default)]
    pub uid: Option<String>,
    pub status: QueueStatus,
    #[serde(default)]
    pub result: Option<DeliveryResult>,
}

impl QueueRecord {
    /// The settlement hash, ignoring empty strings.
    pub fn tx_hash(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.tx_hash.as_deref())
            .filter(|h| !h.is_empty())
    }
}

/// Errors from the delivery queue API.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The backend answered 2xx with a body we could not use.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Bad client configuration.
    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;
