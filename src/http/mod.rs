//! Status API subsystem.
//!
//! # Data Flow
//! ```text
//! GET /status               → store summary + uptime
//! GET /transactions         → every tracked transaction
//! GET /transactions/{key}   → one event's transactions
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, StatusServer};
