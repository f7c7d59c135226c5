//! In-process fakes shared by the engine's unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::backend::{BackendError, BackendResponse, BackendResult, GenerateRequest, JobBackend};
use crate::config::TimeoutConfig;
use crate::engine::poller::ResultPoller;
use crate::engine::progress::{DeliveryError, ReplySink};
use crate::engine::runner::JobRunner;
use crate::engine::submitter::TaskSubmitter;
use crate::resilience::TimeoutGovernor;

/// One scripted backend reaction.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(u16, String),
    Fail,
    Hang,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::Respond(status, body.to_string())
    }

    pub fn accepted(task_id: &str) -> Self {
        Self::json(200, json!({ "task_id": task_id }))
    }

    pub fn running(partial: Option<&str>) -> Self {
        match partial {
            Some(p) => Self::json(200, json!({ "status": "running", "partial": p })),
            None => Self::json(200, json!({ "status": "running" })),
        }
    }

    pub fn completed(output: &str) -> Self {
        Self::json(200, json!({ "status": "completed", "output": output }))
    }

    pub fn not_found() -> Self {
        Self::Respond(404, String::new())
    }

    async fn resolve(self) -> BackendResult<BackendResponse> {
        match self {
            Reply::Respond(status, body) => Ok(BackendResponse::new(status, body)),
            Reply::Fail => Err(BackendError::Transport("connection reset".into())),
            Reply::Hang => futures_util::future::pending().await,
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Backend double with per-task poll scripts and call accounting.
///
/// Unscripted submissions are accepted as `job-{n}`. A task's last poll
/// reply repeats once its script runs out; unknown tasks get a 404.
#[derive(Default)]
pub struct ScriptedBackend {
    submits: Mutex<VecDeque<Reply>>,
    polls: Mutex<HashMap<String, VecDeque<Reply>>>,
    submit_delay: Duration,
    prompts: Mutex<Vec<GenerateRequest>>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn on_submit(self, reply: Reply) -> Self {
        self.submits.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_poll(self, task_id: &str, replies: Vec<Reply>) -> Self {
        self.polls
            .lock()
            .unwrap()
            .insert(task_id.to_string(), replies.into_iter().collect());
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
    }

    fn next_poll(&self, task_id: &str) -> Reply {
        let mut polls = self.polls.lock().unwrap();
        match polls.get_mut(task_id) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap_or_else(Reply::not_found),
            None => Reply::not_found(),
        }
    }
}

impl JobBackend for ScriptedBackend {
    fn submit<'a>(&'a self, request: &'a GenerateRequest) -> BoxFuture<'a, BackendResult<BackendResponse>> {
        async move {
            self.prompts.lock().unwrap().push(request.clone());
            let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            tokio::time::sleep(self.submit_delay).await;
            let reply = self
                .submits
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Reply::accepted(&format!("job-{n}")));
            reply.resolve().await
        }
        .boxed()
    }

    fn fetch_result<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, BackendResult<BackendResponse>> {
        async move {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            self.next_poll(task_id).resolve().await
        }
        .boxed()
    }
}

/// Runner over `backend` with default timeouts and limits.
pub fn scripted_runner(backend: Arc<ScriptedBackend>) -> JobRunner {
    let timeouts = TimeoutConfig::default();
    JobRunner::new(
        TaskSubmitter::new(backend.clone(), timeouts.submit(), 4000, 64),
        ResultPoller::new(backend, TimeoutGovernor::new(&timeouts), timeouts.poll_interval()),
        1900,
        timeouts.delivery(),
    )
}

enum SinkMode {
    Record,
    Fail,
    Stall,
}

/// Reply sink that records every delivery attempt.
pub struct RecordingSink {
    mode: SinkMode,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn with_mode(mode: SinkMode) -> Self {
        Self {
            mode,
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        Self::with_mode(SinkMode::Record)
    }

    pub fn failing() -> Self {
        Self::with_mode(SinkMode::Fail)
    }

    pub fn stalled() -> Self {
        Self::with_mode(SinkMode::Stall)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

impl ReplySink for RecordingSink {
    fn deliver(&self, text: String) -> BoxFuture<'_, Result<(), DeliveryError>> {
        async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                SinkMode::Record => {
                    self.delivered.lock().unwrap().push(text);
                    Ok(())
                }
                SinkMode::Fail => Err(DeliveryError::Closed),
                SinkMode::Stall => futures_util::future::pending().await,
            }
        }
        .boxed()
    }
}
