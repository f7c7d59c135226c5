//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing)
//!     → auth.rs (bearer token, every route but /ping)
//!     → handlers.rs (ask / queue / runqueue / status)
//!     → BridgeContext
//!     → sse.rs (partial, reply, report and done events)
//! ```
//!
//! # Design Decisions
//! - Engine failures arrive as reply text, never as HTTP errors
//! - Only malformed input (empty prompt, bad JSON) and auth produce 4xx

pub mod auth;
pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{AppState, HttpServer};
