//! Partial-output filter and best-effort delivery.

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::engine::text::clip_for_display;
use crate::observability::metrics;
use crate::resilience::TimeoutGovernor;

/// Why a reply could not be handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The caller went away (closed stream, dropped session).
    #[error("reply channel closed")]
    Closed,

    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Caller-side channel receiving progress updates and drain reports.
pub trait ReplySink: Send + Sync {
    fn deliver(&self, text: String) -> BoxFuture<'_, Result<(), DeliveryError>>;
}

/// What the reporter did with one poll response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressAction {
    /// Nothing new to show.
    Skipped,
    Delivered,
    /// Delivery failed or timed out; the poll loop carries on.
    Dropped,
}

/// Deduplicating, truncating progress filter.
///
/// Holds no state of its own: the last displayed value is owned by the
/// poll loop and passed in on every call.
pub struct ProgressReporter<'s> {
    sink: Option<&'s dyn ReplySink>,
    max_chars: usize,
    delivery_timeout: Duration,
}

impl<'s> ProgressReporter<'s> {
    pub fn new(sink: Option<&'s dyn ReplySink>, max_chars: usize, delivery_timeout: Duration) -> Self {
        Self {
            sink,
            max_chars,
            delivery_timeout,
        }
    }

    /// Forward `partial` if it is non-empty and differs from `last_displayed`.
    ///
    /// `last_displayed` is updated before delivery is attempted, so the same
    /// value never produces a second attempt even if the first one failed.
    /// Delivery waits at most the shorter of the delivery timeout and
    /// `remaining`, the time left in the caller's poll budget.
    pub async fn report(
        &self,
        partial: Option<&str>,
        last_displayed: &mut String,
        remaining: Duration,
    ) -> ProgressAction {
        let partial = match partial {
            Some(p) if !p.is_empty() && p != last_displayed.as_str() => p,
            _ => return ProgressAction::Skipped,
        };
        last_displayed.clear();
        last_displayed.push_str(partial);

        let Some(sink) = self.sink else {
            return ProgressAction::Skipped;
        };

        let text = clip_for_display(partial, self.max_chars);
        let limit = self.delivery_timeout.min(remaining);
        let action = match TimeoutGovernor::bounded(limit, sink.deliver(text)).await {
            Ok(Ok(())) => ProgressAction::Delivered,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Progress update not delivered");
                ProgressAction::Dropped
            }
            Err(e) => {
                tracing::debug!(error = %e, "Progress update delivery timed out");
                ProgressAction::Dropped
            }
        };
        metrics::record_progress_update(action == ProgressAction::Delivered);
        action
    }
}
