//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Claim view (teardown.rs):
//!     view created → reconciler spawned with a TeardownSignal
//!     view torn down → signal fires → loop exits, in-flight tick dropped
//!
//! Process (signals.rs):
//!     SIGTERM/SIGINT → tear down every view → exit
//! ```

pub mod signals;
pub mod teardown;

pub use signals::wait_for_shutdown;
pub use teardown::{Teardown, TeardownSignal};
