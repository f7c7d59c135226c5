//! Asynchronous job lifecycle engine.
//!
//! # Data Flow
//! ```text
//! direct path:   prompt → submitter → poller ─┬→ final reply
//!                                             └→ progress → reply sink
//!
//! deferred path: prompt → queue.enqueue → id
//!                later:  drain → snapshot → (runner per id) → report → remove
//! ```
//!
//! # Design Decisions
//! - Submissions are serialized; polling is not
//! - Every await is bounded by the resilience timeouts
//! - Failures resolve to [`TaskError`] text and never escape a task

pub mod drain;
pub mod job;
pub mod poller;
pub mod progress;
pub mod queue;
pub mod runner;
pub mod submitter;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use drain::{QueueDrainWorker, TaskReport};
pub use job::{Job, JobStatus, PollOutcome, TaskError};
pub use poller::ResultPoller;
pub use progress::{DeliveryError, ProgressReporter, ReplySink};
pub use queue::{PendingQueue, PendingTask};
pub use runner::JobRunner;
pub use submitter::{SubmitError, TaskSubmitter};
