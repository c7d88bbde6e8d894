//! Claim data model, address resolution and submission.
//!
//! # Data Flow
//! ```text
//! user input ─▶ resolver.rs (AddressResolver) ─▶ ResolvedAddress
//!            ─▶ submitter.rs (ClaimSubmitter) ─▶ Transaction { pending, no hash }
//!            ─▶ TransactionStore
//! ```

pub mod catalog;
pub mod event;
pub mod resolver;
pub mod submitter;
pub mod transaction;

pub use catalog::{rewards_to_claim, RewardCatalog, RewardEvent};
pub use event::{eligibility_key, Event};
pub use resolver::{parse_address, AddressResolver, ResolutionError, ResolvedAddress};
pub use submitter::{ClaimSubmitter, SubmissionError};
pub use transaction::{Stage, Transaction, TransactionStatus, TxIdentity};
