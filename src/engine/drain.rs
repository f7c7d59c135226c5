//! Sequential processing of staged prompts.
//!
//! # Responsibilities
//! - Fix the work list from one queue snapshot
//! - Run each task to a terminal outcome before touching the next
//! - Report exactly once per task and always remove it afterwards
//!
//! # Design Decisions
//! - Ids enqueued during a drain are left for the next drain
//! - No retry of a failed submission; the failure is the task's report

use std::time::Duration;

use crate::engine::job::{Job, JobStatus, TaskError};
use crate::engine::progress::ReplySink;
use crate::engine::queue::PendingQueue;
use crate::engine::runner::JobRunner;
use crate::engine::text::clip_for_display;
use crate::resilience::TimeoutGovernor;

/// Per-task drain result, in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// Report text for a finished job on the drain path.
pub fn drain_text(job: &Job) -> String {
    match job.result() {
        Some(Ok(output)) => output.to_string(),
        Some(Err(error)) => error.to_string(),
        None => TaskError::PollError("job did not finish".into()).to_string(),
    }
}

/// Drains a [`PendingQueue`] through a [`JobRunner`].
pub struct QueueDrainWorker<'a> {
    runner: &'a JobRunner,
    queue: &'a PendingQueue,
    delivery_timeout: Duration,
    max_reply_chars: usize,
}

impl<'a> QueueDrainWorker<'a> {
    pub fn new(
        runner: &'a JobRunner,
        queue: &'a PendingQueue,
        delivery_timeout: Duration,
        max_reply_chars: usize,
    ) -> Self {
        Self {
            runner,
            queue,
            delivery_timeout,
            max_reply_chars,
        }
    }

    /// Process every task present at the start of the call.
    ///
    /// Each report is also sent to `sink` as `Task {id}: {text}`; a failed
    /// send is logged and does not stop the drain.
    pub async fn drain(&self, sink: &dyn ReplySink) -> Vec<TaskReport> {
        let ids = self.queue.snapshot_ids();
        tracing::info!(tasks = ids.len(), "Drain started");

        let mut reports = Vec::with_capacity(ids.len());
        for task_id in ids {
            let Some(prompt) = self.queue.get(&task_id) else {
                tracing::debug!(task_id = %task_id, "Task already removed, skipping");
                continue;
            };

            let job = self.runner.run(&prompt, None).await;
            let text = drain_text(&job);
            let message = clip_for_display(&format!("Task {task_id}: {text}"), self.max_reply_chars);

            match TimeoutGovernor::bounded(self.delivery_timeout, sink.deliver(message.clone())).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(task_id = %task_id, error = %e, "Drain report not delivered"),
                Err(e) => tracing::warn!(task_id = %task_id, error = %e, "Drain report delivery timed out"),
            }

            self.queue.remove(&task_id);
            reports.push(TaskReport {
                task_id,
                status: job.status(),
                message,
            });
        }

        tracing::info!(processed = reports.len(), remaining = self.queue.len(), "Drain finished");
        reports
    }
}
