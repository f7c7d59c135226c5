//! Prompt submission.
//!
//! # Responsibilities
//! - Trim and bound the prompt
//! - Issue one bounded `/generate` call under the process-wide submission lock
//! - Classify the response into a job id or a [`SubmitError`]
//!
//! # Design Decisions
//! - The lock covers the submission call only, never the poll phase
//! - No retries: the caller decides what a failed submission means

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::backend::{BackendResponse, GenerateReply, GenerateRequest, JobBackend};
use crate::engine::text::bound_prompt;
use crate::observability::metrics;
use crate::resilience::TimeoutGovernor;

/// Why a prompt did not become a backend job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("submission timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    /// Non-2xx status without a usable job id in the body.
    #[error("backend rejected submission with status {status}")]
    Rejected { status: u16 },

    /// 2xx status but the body names no job.
    #[error("backend accepted submission without a task id")]
    MissingTaskId,
}

impl SubmitError {
    fn label(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "empty_prompt",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Malformed(_) => "malformed",
            Self::Rejected { .. } => "rejected",
            Self::MissingTaskId => "missing_task_id",
        }
    }
}

/// Turns prompts into backend job ids, one submission at a time.
pub struct TaskSubmitter {
    backend: Arc<dyn JobBackend>,
    lock: Mutex<()>,
    submit_timeout: Duration,
    max_prompt_chars: usize,
    generation_max_length: u32,
}

impl TaskSubmitter {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        submit_timeout: Duration,
        max_prompt_chars: usize,
        generation_max_length: u32,
    ) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
            submit_timeout,
            max_prompt_chars,
            generation_max_length,
        }
    }

    /// Submit `raw_prompt` and return the backend's job id.
    pub async fn submit(&self, raw_prompt: &str) -> Result<String, SubmitError> {
        let prompt = bound_prompt(raw_prompt, self.max_prompt_chars);
        if prompt.is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }

        let request = GenerateRequest {
            prompt,
            max_length: self.generation_max_length,
        };

        let response = {
            let _permit = self.lock.lock().await;
            TimeoutGovernor::bounded(self.submit_timeout, self.backend.submit(&request)).await
        };

        let result = match response {
            Ok(Ok(response)) => classify_submission(&response),
            Ok(Err(e)) => Err(SubmitError::Transport(e.to_string())),
            Err(_) => Err(SubmitError::Timeout(self.submit_timeout)),
        };

        match &result {
            Ok(task_id) => {
                tracing::debug!(task_id = %task_id, prompt_chars = request.prompt.chars().count(), "Job submitted");
                metrics::record_submission("accepted");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed");
                metrics::record_submission(e.label());
            }
        }
        result
    }
}

/// Extract a job id from a `/generate` response.
///
/// Some backends acknowledge async work with a non-2xx status and still
/// include the id, so the body is inspected regardless of status.
pub fn classify_submission(response: &BackendResponse) -> Result<String, SubmitError> {
    match serde_json::from_str::<GenerateReply>(&response.body) {
        Ok(reply) => match reply.task_id() {
            Some(task_id) => Ok(task_id),
            None if response.is_success() => Err(SubmitError::MissingTaskId),
            None => Err(SubmitError::Rejected {
                status: response.status,
            }),
        },
        Err(e) if response.is_success() => Err(SubmitError::Malformed(e.to_string())),
        Err(_) => Err(SubmitError::Rejected {
            status: response.status,
        }),
    }
}
