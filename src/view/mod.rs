//! Claim session subsystem.
//!
//! # Data Flow
//! ```text
//! set_input → validate (AddressResolver) → Confirmation
//!   → submit (ClaimSubmitter) → TransactionStore
//! start → Reconciler task ──tick──▶ refresh (claimed indicator, claim guard)
//! teardown → Reconciler stops
//! ```

pub mod session;

pub use session::{ClaimView, FormState, Phase, ViewDeps, ViewError};
