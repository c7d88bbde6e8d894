//! Transaction persistence.
//!
//! # Design Decisions
//! - One record per `(event key, address)`, whole-record replacement on write
//! - Writes that would move a record backwards are dropped, so late results
//!   from an earlier tick cannot undo a later one
//! - Readers get a broadcast of every applied write instead of polling

pub mod transactions;

pub use transactions::{IgnoreReason, SaveOutcome, StoreError, StoreSummary, TransactionStore};
