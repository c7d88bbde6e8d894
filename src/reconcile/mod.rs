//! Reconciliation of claim state.
//!
//! # Data Flow
//! ```text
//! every tick:
//!   TransactionStore (event's non-terminal transactions)
//!     → no hash:  DeliveryQueueClient.queue_status(queue_uid)
//!     → has hash: ChainReader.get_transaction_receipt(hash)
//!     → TransactionStore.save (forward-only) → Notifier
//! ```
//!
//! # Design Decisions
//! - Polling is the only retry mechanism; a failed lookup waits for the next tick
//! - One lookup per in-flight transaction per tick, run concurrently
//! - Terminal transactions are never looked up again

pub mod notify;
pub mod reconciler;

pub use notify::{Notification, Notifier, Severity};
pub use reconciler::{on_queue_record, on_receipt, Reconciler, TickReport, Transition};
