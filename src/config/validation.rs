//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Check URLs and contract addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClaimConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::{ChainConfig, ClaimConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClaimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_chain("identity_chain", &config.identity_chain, true, &mut errors);
    validate_chain("delivery_chain", &config.delivery_chain, false, &mut errors);

    if url::Url::parse(&config.queue.api_url).is_err() {
        errors.push(ValidationError::new("queue.api_url", "not a valid URL"));
    }
    for (field, path) in [
        ("queue.claim_path", &config.queue.claim_path),
        ("queue.queue_path", &config.queue.queue_path),
        ("queue.events_path", &config.queue.events_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }
    if config.queue.request_timeout_secs == 0 {
        errors.push(ValidationError::new("queue.request_timeout_secs", "must be greater than 0"));
    }

    if config.reconciler.poll_interval_ms == 0 {
        errors.push(ValidationError::new("reconciler.poll_interval_ms", "must be greater than 0"));
    }
    if config.reconciler.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "reconciler.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a valid socket address",
        ));
    }
    if config.status_api.enabled && config.status_api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("status_api.bind_address", "not a valid socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_chain(
    section: &str,
    chain: &ChainConfig,
    needs_registry: bool,
    errors: &mut Vec<ValidationError>,
) {
    if !chain.enabled {
        return;
    }
    if url::Url::parse(&chain.rpc_url).is_err() {
        errors.push(ValidationError::new(format!("{section}.rpc_url"), "not a valid URL"));
    }
    for (i, failover) in chain.failover_urls.iter().enumerate() {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                format!("{section}.failover_urls[{i}]"),
                "not a valid URL",
            ));
        }
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{section}.rpc_timeout_secs"),
            "must be greater than 0",
        ));
    }
    if needs_registry && chain.ens_registry.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            format!("{section}.ens_registry"),
            "not a valid address",
        ));
    }
}
