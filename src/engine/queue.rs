//! Deferred prompt store.
//!
//! The queue owns its tasks; callers only see the four operations below plus
//! a length read. One lock serializes them and is released before any method
//! returns, so it can never be held across a network call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use uuid::Uuid;

use crate::engine::text::bound_prompt;
use crate::observability::metrics;

/// A prompt staged for later submission.
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub id: String,
    pub prompt: String,
    pub enqueued_at: SystemTime,
}

/// Lock-guarded `id -> prompt` store, kept in enqueue order.
#[derive(Debug)]
pub struct PendingQueue {
    tasks: Mutex<Vec<PendingTask>>,
    max_prompt_chars: usize,
}

impl PendingQueue {
    pub fn new(max_prompt_chars: usize) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            max_prompt_chars,
        }
    }

    fn locked(&self) -> MutexGuard<'_, Vec<PendingTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stage a prompt and return its fresh id. Nothing is submitted here.
    pub fn enqueue(&self, prompt: &str) -> String {
        let prompt = bound_prompt(prompt, self.max_prompt_chars);
        let mut tasks = self.locked();

        let mut id = Uuid::new_v4().to_string();
        while tasks.iter().any(|t| t.id == id) {
            id = Uuid::new_v4().to_string();
        }

        tasks.push(PendingTask {
            id: id.clone(),
            prompt,
            enqueued_at: SystemTime::now(),
        });
        metrics::record_pending_tasks(tasks.len());
        tracing::debug!(task_id = %id, pending = tasks.len(), "Task enqueued");
        id
    }

    /// Ids present right now, oldest first.
    pub fn snapshot_ids(&self) -> Vec<String> {
        self.locked().iter().map(|t| t.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<String> {
        self.locked()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.prompt.clone())
    }

    /// Delete `id` if present. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) {
        let mut tasks = self.locked();
        tasks.retain(|t| t.id != id);
        metrics::record_pending_tasks(tasks.len());
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
