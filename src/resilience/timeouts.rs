//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every backend call and sink delivery with a hard deadline
//! - Track the total poll budget of one job on a monotonic clock
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities and `tokio::time::Instant`
//! - Timeout errors are distinct from other errors
//! - The total budget check is `elapsed >= total`

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{timeout, Instant};

use crate::config::TimeoutConfig;

/// The wrapped operation did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Supplies bounded-duration wrappers and poll budgets.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGovernor {
    submit: Duration,
    poll: Duration,
    total: Duration,
    delivery: Duration,
}

impl TimeoutGovernor {
    pub fn new(config: &TimeoutConfig) -> Self {
        Self {
            submit: config.submit(),
            poll: config.poll(),
            total: config.total(),
            delivery: config.delivery(),
        }
    }

    /// Run `fut`, abandoning it once `limit` elapses.
    pub async fn bounded<F, T>(limit: Duration, fut: F) -> Result<T, TimedOut>
    where
        F: Future<Output = T>,
    {
        timeout(limit, fut).await.map_err(|_| TimedOut(limit))
    }

    pub fn submit_timeout(&self) -> Duration {
        self.submit
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll
    }

    pub fn delivery_timeout(&self) -> Duration {
        self.delivery
    }

    pub fn total_timeout(&self) -> Duration {
        self.total
    }

    /// Start the total budget for one poll loop. The clock is read once, here.
    pub fn start_budget(&self) -> PollBudget {
        PollBudget::start(self.total)
    }
}

/// Elapsed-time guard for a long-running loop.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    started: Instant,
    total: Duration,
}

impl PollBudget {
    pub fn start(total: Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn exhausted(&self) -> bool {
        self.elapsed() >= self.total
    }

    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed())
    }

    /// Shrink a per-call timeout so the call cannot outlive the budget.
    pub fn clamp(&self, per_call: Duration) -> Duration {
        per_call.min(self.remaining())
    }
}
