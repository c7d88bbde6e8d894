//! Backend delivery queue.
//!
//! # Data Flow
//! ```text
//! ClaimSubmitter ── POST claim ──▶ backend ── queue_uid ──▶ Transaction
//! Reconciler ── GET queue/{uid} ──▶ QueueRecord { status, result.tx_hash }
//! ```

pub mod client;
pub mod types;

pub use client::{DeliveryQueueClient, HttpQueueClient};
pub use types::{ClaimAck, DeliveryResult, QueueError, QueueRecord, QueueResult, QueueStatus};
