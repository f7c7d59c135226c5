//! Server-sent event plumbing.
//!
//! Engine output reaches the client through a bounded channel: a
//! [`ChannelSink`] pushes named events into it, and [`event_stream`] turns the
//! receiving end into the SSE response body. When the client goes away the
//! receiver is dropped and every further delivery reports
//! [`DeliveryError::Closed`].

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, Stream};
use futures_util::FutureExt;
use tokio::sync::mpsc;

use crate::engine::progress::{DeliveryError, ReplySink};
use crate::resilience::TimeoutGovernor;

pub const PARTIAL_EVENT: &str = "partial";
pub const REPLY_EVENT: &str = "reply";
pub const REPORT_EVENT: &str = "report";
pub const DONE_EVENT: &str = "done";

/// Events buffered per response before deliveries start waiting.
pub const EVENT_BUFFER: usize = 16;

/// Reply sink that emits every delivery as one named SSE event.
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
    event: &'static str,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Event>, event: &'static str) -> Self {
        Self { tx, event }
    }

    /// Deliver `text`, giving up once `limit` elapses.
    pub async fn deliver_within(&self, text: String, limit: Duration) -> Result<(), DeliveryError> {
        TimeoutGovernor::bounded(limit, self.deliver(text))
            .await
            .unwrap_or_else(|e| Err(DeliveryError::Failed(e.to_string())))
    }
}

impl ReplySink for ChannelSink {
    fn deliver(&self, text: String) -> BoxFuture<'_, Result<(), DeliveryError>> {
        async move {
            let event = Event::default().event(self.event).data(text);
            self.tx.send(event).await.map_err(|_| DeliveryError::Closed)
        }
        .boxed()
    }
}

/// Wrap the receiving end of an event channel as an SSE response.
///
/// The stream ends once every sender has been dropped.
pub fn event_stream(rx: mpsc::Receiver<Event>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(event), rx))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
