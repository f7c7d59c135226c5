//! Job status polling.
//!
//! # States
//! ```text
//! Waiting  → (budget left) sleep poll_interval → Querying
//!          → (budget spent)                    → Finished(TimedOut)
//! Querying → (budget spent)                    → Finished(TimedOut)
//!          → terminal backend status           → Finished(..)
//!          → pending status / transient miss   → Waiting
//! ```
//!
//! # Design Decisions
//! - The first poll happens only after the first sleep
//! - The budget is checked before sleeping and again before each call
//! - Each call's timeout, and each progress delivery, is clamped to the
//!   remaining budget
//! - A failed or timed-out poll is a transient miss; only the total budget
//!   abandons a job

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendResponse, JobBackend, ResultReply};
use crate::engine::job::PollOutcome;
use crate::engine::progress::ProgressReporter;
use crate::observability::metrics;
use crate::resilience::TimeoutGovernor;

enum PollState {
    Waiting,
    Querying,
    Finished(PollOutcome),
}

/// Classification of one poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Terminal(PollOutcome),
    /// Job still running; may carry partial output.
    Pending { partial: Option<String> },
    /// Response said nothing usable; keep polling.
    Transient(String),
}

/// Drives one job's poll loop to a terminal outcome.
pub struct ResultPoller {
    backend: Arc<dyn JobBackend>,
    governor: TimeoutGovernor,
    interval: Duration,
}

impl ResultPoller {
    pub fn new(backend: Arc<dyn JobBackend>, governor: TimeoutGovernor, interval: Duration) -> Self {
        Self {
            backend,
            governor,
            interval,
        }
    }

    /// Poll `task_id` until the backend reports a terminal status or the
    /// total budget runs out.
    ///
    /// `last_displayed` is the progress value last shown to the caller and
    /// is threaded through to the reporter.
    pub async fn poll_until_terminal(
        &self,
        task_id: &str,
        progress: &ProgressReporter<'_>,
        last_displayed: &mut String,
    ) -> PollOutcome {
        let budget = self.governor.start_budget();
        let mut state = PollState::Waiting;
        let mut polls: u32 = 0;

        loop {
            state = match state {
                PollState::Waiting if budget.exhausted() => PollState::Finished(PollOutcome::TimedOut),
                PollState::Waiting => {
                    tokio::time::sleep(self.interval).await;
                    PollState::Querying
                }
                PollState::Querying if budget.exhausted() => PollState::Finished(PollOutcome::TimedOut),
                PollState::Querying => {
                    polls += 1;
                    let limit = budget.clamp(self.governor.poll_timeout());
                    let step = match TimeoutGovernor::bounded(limit, self.backend.fetch_result(task_id)).await {
                        Ok(Ok(response)) => classify_poll(&response),
                        Ok(Err(e)) => PollStep::Transient(e.to_string()),
                        Err(e) => PollStep::Transient(e.to_string()),
                    };

                    match step {
                        PollStep::Terminal(outcome) => PollState::Finished(outcome),
                        PollStep::Pending { partial } => {
                            metrics::record_poll("pending");
                            progress
                                .report(partial.as_deref(), last_displayed, budget.remaining())
                                .await;
                            PollState::Waiting
                        }
                        PollStep::Transient(reason) => {
                            metrics::record_poll("transient");
                            tracing::debug!(task_id = %task_id, poll = polls, reason = %reason, "Transient poll miss");
                            PollState::Waiting
                        }
                    }
                }
                PollState::Finished(outcome) => {
                    metrics::record_poll(outcome.status().as_str());
                    tracing::debug!(
                        task_id = %task_id,
                        polls,
                        elapsed_ms = budget.elapsed().as_millis() as u64,
                        outcome = %outcome.status(),
                        "Poll loop finished"
                    );
                    return outcome;
                }
            };
        }
    }
}

/// Classify one `/result/{id}` response.
pub fn classify_poll(response: &BackendResponse) -> PollStep {
    if response.is_not_found() {
        return PollStep::Terminal(PollOutcome::NotFound);
    }

    let reply = match serde_json::from_str::<ResultReply>(&response.body) {
        Ok(reply) => reply,
        Err(e) if response.is_success() => {
            return PollStep::Terminal(PollOutcome::PollError(format!("unparseable result body: {e}")));
        }
        Err(_) => return PollStep::Transient(format!("status {} without a result body", response.status)),
    };

    let token = reply.status.as_deref().map(str::trim).unwrap_or_default();
    match token.to_ascii_lowercase().as_str() {
        "completed" => PollStep::Terminal(PollOutcome::Completed(reply.output.unwrap_or_default())),
        "error" | "failed" => {
            let message = reply
                .output
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| token.to_string());
            PollStep::Terminal(PollOutcome::Failed(message))
        }
        "notfound" | "not_found" => PollStep::Terminal(PollOutcome::NotFound),
        "" if !response.is_success() => PollStep::Transient(format!("status {} without a job status", response.status)),
        _ => PollStep::Pending {
            partial: reply.partial,
        },
    }
}
