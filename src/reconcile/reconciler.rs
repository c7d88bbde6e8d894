//! The reconciliation loop.
//!
//! # State Transitions
//! ```text
//! pending, no hash ── queue FINISH + hash ─────────▶ pending, hash
//! pending, no hash ── queue FINISH_WITH_ERROR ─────▶ failed          (terminal)
//! pending, hash ───── receipt status = 1 ──────────▶ passed          (terminal)
//! pending, hash ───── receipt status = 0 ──────────▶ failed          (terminal)
//! anything else ──────────────────────────────────▶ unchanged, retried next tick
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use crate::blockchain::{ChainReader, Receipt};
use crate::claims::{Transaction, TransactionStatus};
use crate::config::ReconcilerConfig;
use crate::lifecycle::TeardownSignal;
use crate::observability::metrics;
use crate::queue::{DeliveryQueueClient, QueueRecord, QueueStatus};
use crate::reconcile::notify::{Notification, Notifier};
use crate::store::TransactionStore;

/// A state change and the notification announcing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Transaction,
    pub notice: Notification,
}

/// Apply a queue record to a transaction that has no hash yet.
pub fn on_queue_record(tx: &Transaction, record: &QueueRecord) -> Option<Transition> {
    if tx.is_terminal() || tx.hash.is_some() {
        return None;
    }
    match record.status {
        QueueStatus::Pending => None,
        QueueStatus::Finished => record.tx_hash().map(|hash| Transition {
            next: tx.with_hash(hash),
            notice: Notification::delivery_in_progress(),
        }),
        QueueStatus::FinishedWithError => {
            let mut next = tx.settled(TransactionStatus::Failed);
            next.hash = record.tx_hash().map(str::to_string);
            Some(Transition {
                next,
                notice: Notification::delivery_failed(),
            })
        }
    }
}

/// Apply a receipt lookup to a transaction that has a hash.
pub fn on_receipt(tx: &Transaction, receipt: Option<&Receipt>) -> Option<Transition> {
    if tx.is_terminal() || tx.hash.is_none() {
        return None;
    }
    receipt.map(|r| {
        if r.status {
            Transition {
                next: tx.settled(TransactionStatus::Passed),
                notice: Notification::delivered(),
            }
        } else {
            Transition {
                next: tx.settled(TransactionStatus::Failed),
                notice: Notification::delivery_reverted(),
            }
        }
    })
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Non-terminal transactions polled this tick.
    pub in_flight: usize,
    pub advanced: usize,
    pub unchanged: usize,
    /// Lookups that failed or timed out; retried next tick.
    pub errors: usize,
    pub skipped_terminal: usize,
}

enum Poll {
    Transition(Transition),
    NoChange,
    Failed,
}

enum Outcome {
    Advanced,
    Unchanged,
    Errored,
}

/// Advances every tracked transaction of one event.
pub struct Reconciler {
    event_key: String,
    store: TransactionStore,
    queue: Arc<dyn DeliveryQueueClient>,
    chain: Arc<dyn ChainReader>,
    notifier: Notifier,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl Reconciler {
    pub fn new(
        event_key: impl Into<String>,
        store: TransactionStore,
        queue: Arc<dyn DeliveryQueueClient>,
        chain: Arc<dyn ChainReader>,
        notifier: Notifier,
        config: &ReconcilerConfig,
    ) -> Self {
        Self {
            event_key: event_key.into(),
            store,
            queue,
            chain,
            notifier,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn event_key(&self) -> &str {
        &self.event_key
    }

    /// Run one pass over the event's transactions.
    ///
    /// Terminal transactions cost nothing. In-flight ones are polled
    /// concurrently and each result is written to the store as soon as it
    /// arrives.
    pub async fn tick(&self) -> TickReport {
        let (terminal, in_flight): (Vec<Transaction>, Vec<Transaction>) = self
            .store
            .list_for_event(&self.event_key)
            .into_iter()
            .partition(Transaction::is_terminal);

        let mut report = TickReport {
            in_flight: in_flight.len(),
            skipped_terminal: terminal.len(),
            ..TickReport::default()
        };
        metrics::record_inflight(&self.event_key, in_flight.len());

        let outcomes = join_all(in_flight.into_iter().map(|tx| self.reconcile_one(tx))).await;
        for outcome in outcomes {
            match outcome {
                Outcome::Advanced => report.advanced += 1,
                Outcome::Unchanged => report.unchanged += 1,
                Outcome::Errored => report.errors += 1,
            }
        }

        tracing::trace!(event_key = %self.event_key, ?report, "Tick finished");
        report
    }

    /// Tick every `poll_interval` until `teardown` fires.
    ///
    /// A tick still running at teardown is dropped together with its
    /// pending lookups, so nothing it would have written lands afterwards.
    pub async fn run<F>(self, mut teardown: TeardownSignal, mut after_tick: F)
    where
        F: FnMut(&TickReport) + Send,
    {
        tracing::info!(
            event_key = %self.event_key,
            interval_ms = self.poll_interval.as_millis() as u64,
            "Reconciler starting"
        );

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = teardown.wait() => break,
            }
            tokio::select! {
                report = self.tick() => after_tick(&report),
                _ = teardown.wait() => {
                    tracing::debug!(event_key = %self.event_key, "Teardown during tick, discarding results");
                    break;
                }
            }
        }

        tracing::info!(event_key = %self.event_key, "Reconciler stopped");
    }

    async fn reconcile_one(&self, tx: Transaction) -> Outcome {
        let poll = if tx.hash.is_none() {
            self.poll_queue(&tx).await
        } else {
            self.poll_receipt(&tx).await
        };

        match poll {
            Poll::Transition(Transition { next, notice }) => {
                let status = next.status;
                let hash = next.hash.clone();
                if !self.store.save(next).is_applied() {
                    return Outcome::Unchanged;
                }
                metrics::record_transition(status.as_str());
                tracing::info!(
                    event_key = %tx.key,
                    queue_uid = %tx.queue_uid,
                    address = %tx.address,
                    hash = ?hash,
                    %status,
                    "Claim advanced"
                );
                self.notifier.publish(notice);
                Outcome::Advanced
            }
            Poll::NoChange => Outcome::Unchanged,
            Poll::Failed => Outcome::Errored,
        }
    }

    async fn poll_queue(&self, tx: &Transaction) -> Poll {
        match timeout(self.request_timeout, self.queue.queue_status(&tx.queue_uid)).await {
            Ok(Ok(record)) => {
                if record.status == QueueStatus::Finished && record.tx_hash().is_none() {
                    tracing::warn!(queue_uid = %tx.queue_uid, "Queue finished without a transaction hash");
                }
                on_queue_record(tx, &record).map_or(Poll::NoChange, Poll::Transition)
            }
            Ok(Err(e)) => {
                metrics::record_poll_error("queue", "error");
                tracing::warn!(queue_uid = %tx.queue_uid, error = %e, "Queue status lookup failed");
                Poll::Failed
            }
            Err(_) => {
                metrics::record_poll_error("queue", "timeout");
                tracing::warn!(queue_uid = %tx.queue_uid, "Queue status lookup timed out");
                Poll::Failed
            }
        }
    }

    async fn poll_receipt(&self, tx: &Transaction) -> Poll {
        let Some(hash) = tx.hash.as_deref() else {
            return Poll::NoChange;
        };
        match timeout(self.request_timeout, self.chain.get_transaction_receipt(hash)).await {
            Ok(Ok(receipt)) => {
                if receipt.is_none() {
                    tracing::debug!(hash, "Delivery transaction not mined yet");
                }
                on_receipt(tx, receipt.as_ref()).map_or(Poll::NoChange, Poll::Transition)
            }
            Ok(Err(e)) => {
                metrics::record_poll_error("chain", "error");
                tracing::warn!(hash, error = %e, "Receipt lookup failed");
                Poll::Failed
            }
            Err(_) => {
                metrics::record_poll_error("chain", "timeout");
                tracing::warn!(hash, "Receipt lookup timed out");
                Poll::Failed
            }
        }
    }
}
