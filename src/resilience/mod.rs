//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to backend or reply sink:
//!     → timeouts.rs (per-call deadline, total poll budget)
//!     → caller classifies the timeout into its own error kind
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries here: a failed submission is reported, not repeated

pub mod timeouts;

pub use timeouts::{PollBudget, TimedOut, TimeoutGovernor};
