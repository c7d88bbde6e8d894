//! Claim submission.

use std::sync::Arc;

use alloy::primitives::Address;
use thiserror::Error;

use crate::claims::transaction::Transaction;
use crate::observability::metrics;
use crate::queue::{DeliveryQueueClient, QueueError};

/// Submission failed; nothing was queued as far as the caller knows.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Network failure, backend rejection or an unusable acknowledgement.
    #[error("Claim submission failed: {0}")]
    SubmissionFailed(#[source] QueueError),
}

/// Sends one claim to the delivery queue.
///
/// Never retries: a retry is a new user-initiated submission.
#[derive(Clone)]
pub struct ClaimSubmitter {
    queue: Arc<dyn DeliveryQueueClient>,
}

impl ClaimSubmitter {
    pub fn new(queue: Arc<dyn DeliveryQueueClient>) -> Self {
        Self { queue }
    }

    /// Submit `address` for `delivery_id` and build the pending transaction.
    ///
    /// Makes exactly one network call. Persisting the result is the caller's job.
    pub async fn submit(
        &self,
        event_key: &str,
        delivery_id: u64,
        address: Address,
    ) -> Result<Transaction, SubmissionError> {
        let outcome = match self.queue.submit_claim(delivery_id, address).await {
            Ok(ack) if !ack.queue_uid.is_empty() => Ok(ack.queue_uid),
            Ok(_) => Err(QueueError::Malformed("No queue_uid in acknowledgement".to_string())),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(queue_uid) => {
                metrics::record_submission("accepted");
                tracing::info!(
                    event_key,
                    delivery_id,
                    address = %address,
                    queue_uid = %queue_uid,
                    "Claim submitted"
                );
                Ok(Transaction::new(event_key, address, queue_uid))
            }
            Err(e) => {
                metrics::record_submission("failed");
                tracing::error!(
                    event_key,
                    delivery_id,
                    address = %address,
                    error = %e,
                    "Error while claiming"
                );
                Err(SubmissionError::SubmissionFailed(e))
            }
        }
    }
}
