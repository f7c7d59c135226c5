//! Process-scoped state.
//!
//! Everything shared between concurrent jobs lives here: the backend client,
//! the submission lock (inside the submitter) and the pending queue. The
//! context is built once at startup, handed to the surface behind an `Arc`,
//! and torn down at shutdown.

use std::sync::Arc;

use crate::backend::{BackendResult, HttpBackend, JobBackend};
use crate::config::BridgeConfig;
use crate::engine::drain::{QueueDrainWorker, TaskReport};
use crate::engine::job::TaskError;
use crate::engine::poller::ResultPoller;
use crate::engine::progress::ReplySink;
use crate::engine::queue::PendingQueue;
use crate::engine::runner::JobRunner;
use crate::engine::submitter::TaskSubmitter;
use crate::engine::text::clip_for_display;
use crate::resilience::TimeoutGovernor;

/// Reply to the liveness check.
pub const PING_REPLY: &str = "Pong";

/// Final reply when the backend completes with no text.
pub const EMPTY_OUTPUT_REPLY: &str = "(no output)";

pub struct BridgeContext {
    config: BridgeConfig,
    runner: JobRunner,
    queue: PendingQueue,
}

impl BridgeContext {
    /// Build the context with the real HTTP backend.
    pub fn from_config(config: BridgeConfig) -> BackendResult<Self> {
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        Ok(Self::with_backend(config, backend))
    }

    /// Build the context over any backend implementation.
    pub fn with_backend(config: BridgeConfig, backend: Arc<dyn JobBackend>) -> Self {
        let governor = TimeoutGovernor::new(&config.timeouts);
        let submitter = TaskSubmitter::new(
            backend.clone(),
            config.timeouts.submit(),
            config.limits.max_prompt_chars,
            config.backend.generation_max_length,
        );
        let poller = ResultPoller::new(backend, governor, config.timeouts.poll_interval());
        let runner = JobRunner::new(
            submitter,
            poller,
            config.limits.max_partial_chars,
            config.timeouts.delivery(),
        );
        let queue = PendingQueue::new(config.limits.max_prompt_chars);

        Self {
            config,
            runner,
            queue,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Immediate ask: submit, stream partial output to `progress`, return
    /// the bounded final reply. Failures come back as reply text.
    pub async fn ask(&self, prompt: &str, progress: &dyn ReplySink) -> String {
        let job = self.runner.run(prompt, Some(progress)).await;
        let text = match job.result() {
            Some(Ok("")) => EMPTY_OUTPUT_REPLY.to_string(),
            Some(Ok(output)) => output.to_string(),
            Some(Err(error)) => error.to_string(),
            None => TaskError::PollError("job did not finish".into()).to_string(),
        };
        clip_for_display(&text, self.config.limits.max_reply_chars)
    }

    /// Deferred enqueue: stage `prompt` and return its task id.
    pub fn enqueue(&self, prompt: &str) -> String {
        self.queue.enqueue(prompt)
    }

    /// Drain every staged prompt, one report per task, in enqueue order.
    pub async fn drain(&self, reports: &dyn ReplySink) -> Vec<TaskReport> {
        QueueDrainWorker::new(
            &self.runner,
            &self.queue,
            self.config.timeouts.delivery(),
            self.config.limits.max_reply_chars,
        )
        .drain(reports)
        .await
    }

    pub fn ping(&self) -> &'static str {
        PING_REPLY
    }

    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Release the backend client. Staged prompts are dropped, not persisted.
    pub fn teardown(self) {
        let discarded = self.queue.len();
        if discarded > 0 {
            tracing::warn!(discarded, "Discarding pending tasks at shutdown");
        }
        drop(self.runner);
        tracing::info!("Bridge context released");
    }
}
