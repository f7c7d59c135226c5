//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build BridgeContext → Start metrics → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Teardown context
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal (missing credential included)
//! - Pending tasks are not persisted; teardown only reports what is dropped

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
