//! Backend wire types and error definitions.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST {base}/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_length: u32,
}

/// Acceptance body. The id may also arrive alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReply {
    #[serde(default)]
    pub task_id: Option<serde_json::Value>,
}

impl GenerateReply {
    /// The job id as text. Numeric ids are accepted; blank ids are not.
    pub fn task_id(&self) -> Option<String> {
        match self.task_id.as_ref()? {
            serde_json::Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Body of `GET {base}/result/{task_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub partial: Option<String>,
}

/// Raw HTTP outcome of one backend call. Classification happens upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Errors that can occur talking to the inference backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Connection, TLS or body read failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Base URL cannot be used to build endpoint URLs.
    #[error("invalid backend URL '{0}'")]
    InvalidUrl(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// The two calls the job engine makes against the backend.
///
/// Implementations report transport-level failures only; status codes and
/// bodies are returned as-is for the engine to classify. Deadlines are
/// applied by the caller.
pub trait JobBackend: Send + Sync {
    fn submit<'a>(&'a self, request: &'a GenerateRequest) -> BoxFuture<'a, BackendResult<BackendResponse>>;

    fn fetch_result<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, BackendResult<BackendResponse>>;
}
