//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ChainConfig (identity chain, delivery chain)
//!     → client.rs (RPC connection with failover and timeouts)
//!     → ens.rs (name → address on the identity chain)
//!     → reader.rs (ChainReader: name resolution + receipt lookup)
//! ```
//!
//! # Constraints
//! - Read-only: nothing here signs or broadcasts
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when a chain is unreachable

pub mod client;
pub mod ens;
pub mod reader;
pub mod types;

pub use client::BlockchainClient;
pub use reader::{AlloyChainReader, ChainReader};
pub use types::{ChainError, ChainResult, ChainId, Receipt};
