//! Inference bridge library.
//!
//! Submits prompts to a remote text-generation backend as asynchronous jobs,
//! polls them to completion under layered timeouts, streams partial output
//! and drains a queue of deferred prompts.

pub mod backend;
pub mod config;
pub mod context;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::BridgeConfig;
pub use context::BridgeContext;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
