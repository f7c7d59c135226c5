//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits consistent)
//! - Check the backend URL and the access credential
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.access_token is required")]
    MissingAccessToken,

    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("backend.base_url '{url}' is invalid: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("timeouts.total_ms ({total}) must be at least timeouts.poll_interval_ms ({interval})")]
    BudgetShorterThanInterval { total: u64, interval: u64 },

    #[error("limits.{0} must be at least 4 characters to fit an ellipsis")]
    DisplayLimitTooSmall(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.access_token.trim().is_empty() {
        errors.push(ValidationError::MissingAccessToken);
    }

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.backend.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidBackendUrl {
            url: config.backend.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidBackendUrl {
            url: config.backend.base_url.clone(),
            reason: e.to_string(),
        }),
    }

    let t = &config.timeouts;
    for (name, value) in [
        ("timeouts.submit_ms", t.submit_ms),
        ("timeouts.poll_ms", t.poll_ms),
        ("timeouts.total_ms", t.total_ms),
        ("timeouts.poll_interval_ms", t.poll_interval_ms),
        ("timeouts.delivery_ms", t.delivery_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }
    if t.total_ms < t.poll_interval_ms {
        errors.push(ValidationError::BudgetShorterThanInterval {
            total: t.total_ms,
            interval: t.poll_interval_ms,
        });
    }

    if config.limits.max_prompt_chars == 0 {
        errors.push(ValidationError::Zero("limits.max_prompt_chars"));
    }
    if config.limits.max_partial_chars < 4 {
        errors.push(ValidationError::DisplayLimitTooSmall("max_partial_chars"));
    }
    if config.limits.max_reply_chars < 4 {
        errors.push(ValidationError::DisplayLimitTooSmall("max_reply_chars"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
