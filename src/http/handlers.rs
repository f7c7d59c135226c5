use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::http::server::AppState;
use crate::http::sse::{
    event_stream, ChannelSink, DONE_EVENT, EVENT_BUFFER, PARTIAL_EVENT, REPLY_EVENT, REPORT_EVENT,
};

#[derive(Debug, Deserialize)]
pub struct PromptBody {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedTask {
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BridgeStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub pending_tasks: usize,
}

fn empty_prompt() -> Response {
    (StatusCode::BAD_REQUEST, "Prompt must not be empty").into_response()
}

/// Immediate ask, streamed as `partial` events and one final `reply`.
pub async fn ask(State(state): State<AppState>, Json(body): Json<PromptBody>) -> Response {
    if body.prompt.trim().is_empty() {
        return empty_prompt();
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let context = state.context.clone();

    // The job outlives a disconnected client; its own timeouts bound it.
    tokio::spawn(
        async move {
            let partials = ChannelSink::new(tx.clone(), PARTIAL_EVENT);
            let reply = context.ask(&body.prompt, &partials).await;
            let delivery = context.config().timeouts.delivery();
            if let Err(e) = ChannelSink::new(tx, REPLY_EVENT).deliver_within(reply, delivery).await {
                tracing::debug!(error = %e, "Final reply not delivered");
            }
        }
        .in_current_span(),
    );

    event_stream(rx).into_response()
}

pub async fn queue(State(state): State<AppState>, Json(body): Json<PromptBody>) -> Response {
    if body.prompt.trim().is_empty() {
        return empty_prompt();
    }

    let task_id = state.context.enqueue(&body.prompt);
    let queued = QueuedTask {
        message: format!("Task added: {task_id}"),
        task_id,
    };
    (StatusCode::ACCEPTED, Json(queued)).into_response()
}

/// Drain the pending queue, one `report` event per task, then `done`.
pub async fn run_queue(State(state): State<AppState>) -> Response {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let context = state.context.clone();

    tokio::spawn(
        async move {
            let reports = ChannelSink::new(tx.clone(), REPORT_EVENT);
            let drained = context.drain(&reports).await;
            let summary = format!("{} task(s) processed", drained.len());
            let delivery = context.config().timeouts.delivery();
            if let Err(e) = ChannelSink::new(tx, DONE_EVENT).deliver_within(summary, delivery).await {
                tracing::debug!(error = %e, "Drain summary not delivered");
            }
        }
        .in_current_span(),
    );

    event_stream(rx).into_response()
}

pub async fn ping(State(state): State<AppState>) -> &'static str {
    state.context.ping()
}

pub async fn status(State(state): State<AppState>) -> Json<BridgeStatus> {
    Json(BridgeStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        pending_tasks: state.context.pending_tasks(),
    })
}
