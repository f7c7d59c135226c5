//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the inference bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Interactive surface settings (bind address, access credential).
    pub listener: ListenerConfig,

    /// Inference backend location and request parameters.
    pub backend: BackendConfig,

    /// Per-call and total timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Text length bounds for prompts and replies.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Bearer token callers must present. Required at startup.
    pub access_token: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            access_token: String::new(),
        }
    }
}

/// Inference backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; `/generate` and `/result/{id}` are resolved against it.
    pub base_url: String,

    /// Value sent as `max_length` with every submission.
    pub generation_max_length: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://kakspex-dc-ai.hf.space".to_string(),
            generation_max_length: 64,
        }
    }
}

/// Timeout configuration for the job lifecycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on one submission round trip, in milliseconds.
    pub submit_ms: u64,

    /// Bound on one status poll round trip, in milliseconds.
    pub poll_ms: u64,

    /// Bound on the whole poll loop of one job, in milliseconds.
    pub total_ms: u64,

    /// Delay before each status poll, in milliseconds.
    pub poll_interval_ms: u64,

    /// Bound on delivering one progress update or report, in milliseconds.
    pub delivery_ms: u64,
}

impl TimeoutConfig {
    pub fn submit(&self) -> Duration {
        Duration::from_millis(self.submit_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn delivery(&self) -> Duration {
        Duration::from_millis(self.delivery_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            submit_ms: 30_000,
            poll_ms: 20_000,
            total_ms: 180_000,
            poll_interval_ms: 800,
            delivery_ms: 5_000,
        }
    }
}

/// Text length bounds, counted in characters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Prompts are cut to this length before leaving the process.
    pub max_prompt_chars: usize,

    /// Display bound for partial output updates.
    pub max_partial_chars: usize,

    /// Display bound for final replies.
    pub max_reply_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: 4000,
            max_partial_chars: 1900,
            max_reply_chars: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
