//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Keep the scheme allow-list inside http/https
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::guard::target::DEFAULT_SCHEMES;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.fetch_ms", timeouts.fetch_ms),
        ("timeouts.dns_ms", timeouts.dns_ms),
        ("timeouts.connect_ms", timeouts.connect_ms),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if timeouts.fetch_ms + timeouts.dns_ms > timeouts.request_secs.saturating_mul(1000) {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must cover timeouts.fetch_ms plus timeouts.dns_ms",
        ));
    }

    if config.fetch.max_body_bytes == 0 {
        errors.push(ValidationError::new("fetch.max_body_bytes", "must be greater than zero"));
    }

    if config.fetch.allowed_schemes.is_empty() {
        errors.push(ValidationError::new("fetch.allowed_schemes", "must not be empty"));
    }
    for scheme in &config.fetch.allowed_schemes {
        if !DEFAULT_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
            errors.push(ValidationError::new(
                "fetch.allowed_schemes",
                format!("scheme {:?} is not supported", scheme),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
