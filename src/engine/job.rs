//! Job lifecycle types and the user-facing error taxonomy.
//!
//! # State Transitions
//! ```text
//! Queued → Submitting → SubmitFailed                       (terminal)
//!                     → Polling → Completed | Failed | NotFound
//!                                 | TimedOut | PollError   (terminal)
//! ```
//!
//! A terminal state is never left or overwritten.

use thiserror::Error;
use tokio::time::Instant;

use crate::engine::submitter::SubmitError;

/// Lifecycle position of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Submitting,
    Polling,
    Completed,
    Failed,
    NotFound,
    TimedOut,
    SubmitFailed,
    PollError,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::Failed
                | Self::NotFound
                | Self::TimedOut
                | Self::SubmitFailed
                | Self::PollError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
            Self::TimedOut => "timed_out",
            Self::SubmitFailed => "submit_failed",
            Self::PollError => "poll_error",
        }
    }

    fn allows(self, next: JobStatus) -> bool {
        match (self, next) {
            (Self::Queued, Self::Submitting) => true,
            (Self::Submitting, Self::Polling | Self::SubmitFailed) => true,
            (Self::Polling, next) => next.is_terminal() && next != Self::SubmitFailed,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Backend finished; carries its output (possibly empty).
    Completed(String),
    /// Backend reported `error`/`failed`; carries output or the status token.
    Failed(String),
    NotFound,
    TimedOut,
    /// Unclassifiable response; carries a diagnostic for logs.
    PollError(String),
}

impl PollOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Completed(_) => JobStatus::Completed,
            Self::Failed(_) => JobStatus::Failed,
            Self::NotFound => JobStatus::NotFound,
            Self::TimedOut => JobStatus::TimedOut,
            Self::PollError(_) => JobStatus::PollError,
        }
    }
}

/// Per-task failure, always rendered to the caller as bounded text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("request error")]
    SubmitFailed(#[source] SubmitError),

    #[error("task not found")]
    NotFound,

    #[error("{0}")]
    BackendFailed(String),

    #[error("timeout")]
    TimedOut,

    #[error("error")]
    PollError(String),
}

impl TaskError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubmitFailed(_) => "submit_failed",
            Self::NotFound => "not_found",
            Self::BackendFailed(_) => "backend_failed",
            Self::TimedOut => "timed_out",
            Self::PollError(_) => "poll_error",
        }
    }
}

/// Attempted to move a job along an edge the lifecycle does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One in-flight unit of backend work, owned by the runner that created it.
#[derive(Debug)]
pub struct Job {
    id: Option<String>,
    status: JobStatus,
    final_output: String,
    last_partial: String,
    error: Option<TaskError>,
    started_at: Instant,
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: None,
            status: JobStatus::Queued,
            final_output: String::new(),
            last_partial: String::new(),
            error: None,
            started_at: Instant::now(),
        }
    }

    /// Backend job id, known once submission succeeded.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn final_output(&self) -> &str {
        &self.final_output
    }

    pub fn last_partial(&self) -> &str {
        &self.last_partial
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.allows(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<(), TransitionError> {
        self.transition(JobStatus::Submitting)
    }

    pub fn submitted(&mut self, id: String) -> Result<(), TransitionError> {
        self.transition(JobStatus::Polling)?;
        self.id = Some(id);
        Ok(())
    }

    pub fn submit_failed(&mut self, error: SubmitError) -> Result<(), TransitionError> {
        self.transition(JobStatus::SubmitFailed)?;
        self.error = Some(TaskError::SubmitFailed(error));
        Ok(())
    }

    pub fn record_partial(&mut self, partial: &str) {
        if !self.is_finished() {
            self.last_partial = partial.to_string();
        }
    }

    pub fn finish(&mut self, outcome: PollOutcome) -> Result<(), TransitionError> {
        self.transition(outcome.status())?;
        match outcome {
            PollOutcome::Completed(output) => self.final_output = output,
            PollOutcome::Failed(message) => self.error = Some(TaskError::BackendFailed(message)),
            PollOutcome::NotFound => self.error = Some(TaskError::NotFound),
            PollOutcome::TimedOut => self.error = Some(TaskError::TimedOut),
            PollOutcome::PollError(detail) => self.error = Some(TaskError::PollError(detail)),
        }
        Ok(())
    }

    /// Final output or the failure class. `None` while the job is still live.
    pub fn result(&self) -> Option<Result<&str, &TaskError>> {
        if !self.is_finished() {
            return None;
        }
        Some(match &self.error {
            Some(error) => Err(error),
            None => Ok(self.final_output.as_str()),
        })
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
