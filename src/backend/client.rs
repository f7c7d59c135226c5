//! HTTP client for the inference backend.
//!
//! # Responsibilities
//! - Build `/generate` and `/result/{id}` URLs from the configured base
//! - Issue the raw calls and hand back status + body
//! - Leave deadlines and classification to the engine

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use url::Url;

use crate::backend::types::{
    BackendError, BackendResponse, BackendResult, GenerateRequest, JobBackend,
};
use crate::config::BackendConfig;

/// reqwest-backed implementation of [`JobBackend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| BackendError::InvalidUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("inference-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        tracing::info!(base_url = %base_url, "Backend client initialized");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read(response: reqwest::Response) -> BackendResult<BackendResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(BackendResponse { status, body })
    }

    async fn post_generate(&self, request: &GenerateRequest) -> BackendResult<BackendResponse> {
        let url = self.endpoint(&["generate"])?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::read(response).await
    }

    async fn get_result(&self, task_id: &str) -> BackendResult<BackendResponse> {
        let url = self.endpoint(&["result", task_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::read(response).await
    }
}

impl JobBackend for HttpBackend {
    fn submit<'a>(&'a self, request: &'a GenerateRequest) -> BoxFuture<'a, BackendResult<BackendResponse>> {
        self.post_generate(request).boxed()
    }

    fn fetch_result<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, BackendResult<BackendResponse>> {
        self.get_result(task_id).boxed()
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
