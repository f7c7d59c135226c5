//! One job, end to end: submit, poll, settle.

use std::time::Duration;

use crate::engine::job::{Job, TransitionError};
use crate::engine::poller::ResultPoller;
use crate::engine::progress::{ProgressReporter, ReplySink};
use crate::engine::submitter::TaskSubmitter;
use crate::observability::metrics;

/// Drives a [`Job`] through its lifecycle.
pub struct JobRunner {
    submitter: TaskSubmitter,
    poller: ResultPoller,
    max_partial_chars: usize,
    delivery_timeout: Duration,
}

impl JobRunner {
    pub fn new(
        submitter: TaskSubmitter,
        poller: ResultPoller,
        max_partial_chars: usize,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            submitter,
            poller,
            max_partial_chars,
            delivery_timeout,
        }
    }

    /// Run `prompt` to a terminal state.
    ///
    /// Partial output goes to `progress` when given. The returned job is
    /// always finished.
    pub async fn run(&self, prompt: &str, progress: Option<&dyn ReplySink>) -> Job {
        let mut job = Job::new();
        if let Err(e) = self.drive(&mut job, prompt, progress).await {
            // Only reachable through a lifecycle bug; the job keeps its last state.
            tracing::error!(error = %e, "Job lifecycle violated");
        }

        let elapsed = job.started_at().elapsed();
        metrics::record_job(job.status().as_str(), elapsed);
        tracing::info!(
            task_id = job.id().unwrap_or("-"),
            status = %job.status(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Job finished"
        );
        job
    }

    async fn drive(
        &self,
        job: &mut Job,
        prompt: &str,
        progress: Option<&dyn ReplySink>,
    ) -> Result<(), TransitionError> {
        job.begin_submit()?;
        let task_id = match self.submitter.submit(prompt).await {
            Ok(task_id) => task_id,
            Err(e) => return job.submit_failed(e),
        };
        job.submitted(task_id.clone())?;

        let reporter = ProgressReporter::new(progress, self.max_partial_chars, self.delivery_timeout);
        let mut last_displayed = String::new();
        let outcome = self
            .poller
            .poll_until_terminal(&task_id, &reporter, &mut last_displayed)
            .await;

        job.record_partial(&last_displayed);
        job.finish(outcome)
    }
}
