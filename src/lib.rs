//! Reward claim tracking library.
//!
//! Validates a claimant address (hex or ENS name) against an event's
//! eligibility list, submits the claim to a backend delivery queue, and
//! reconciles each claim through queue processing and on-chain settlement.

pub mod blockchain;
pub mod claims;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod queue;
pub mod reconcile;
pub mod store;
pub mod view;

pub use claims::{AddressResolver, ClaimSubmitter, Event, Transaction, TransactionStatus};
pub use config::ClaimConfig;
pub use reconcile::{Notification, Notifier, Reconciler, TickReport};
pub use store::TransactionStore;
pub use view::ClaimView;
