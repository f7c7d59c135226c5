//! Inference backend integration.
//!
//! # Data Flow
//! ```text
//! engine (submitter / poller)
//!     → JobBackend trait (types.rs)
//!     → HttpBackend (client.rs, reqwest)
//!     → POST {base}/generate, GET {base}/result/{id}
//! ```
//!
//! The backend is an opaque HTTP service; nothing here interprets its
//! status values.

pub mod client;
pub mod types;

pub use client::HttpBackend;
pub use types::{
    BackendError, BackendResponse, BackendResult, GenerateReply, GenerateRequest, JobBackend,
    ResultReply,
};
