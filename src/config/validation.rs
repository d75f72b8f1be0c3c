//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and the backend URL
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, SinkKind};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("backend.base_url: {0}")]
    InvalidBackendUrl(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("filter.tags[{index}] is empty")]
    EmptyTag { index: usize },

    #[error("observability.statsd_address is required for the statsd sink")]
    MissingStatsdAddress,
}

/// Check a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if let Err(reason) = check_backend_url(&config.backend.base_url) {
        errors.push(ValidationError::InvalidBackendUrl(reason));
    }

    for (field, value) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.idle_secs", config.timeouts.idle_secs),
        ("timeouts.shutdown_secs", config.timeouts.shutdown_secs),
        ("limits.max_body_bytes", config.limits.max_body_bytes as u64),
        ("limits.max_decompressed_bytes", config.limits.max_decompressed_bytes as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    for (index, tag) in config.filter.tags.iter().enumerate() {
        if tag.trim().is_empty() {
            errors.push(ValidationError::EmptyTag { index });
        }
    }

    let observability = &config.observability;
    if observability.sink == SinkKind::Statsd && observability.statsd_address.trim().is_empty() {
        errors.push(ValidationError::MissingStatsdAddress);
    }
    if observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}' does not parse: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("scheme '{}' is not supported, use http or https", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("'{raw}' has no host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!("'{raw}' must not carry a query or fragment"));
    }
    Ok(())
}
