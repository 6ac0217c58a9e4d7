//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (debounce window, addresses, levels)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Longest accepted debounce window (ms).
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("store.debounce_ms must be between 1 and {max}, got {value}")]
    DebounceOutOfRange { value: u64, max: u64 },

    #[error("store.path must not be empty")]
    EmptyPath,

    #[error("store.override_var must not be empty")]
    EmptyOverrideVar,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("observability.log_level '{0}' is not a recognised level")]
    InvalidLogLevel(String),
}

/// Check every semantic rule and report all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let store = &config.store;

    if store.debounce_ms == 0 || store.debounce_ms > MAX_DEBOUNCE_MS {
        errors.push(ValidationError::DebounceOutOfRange {
            value: store.debounce_ms,
            max: MAX_DEBOUNCE_MS,
        });
    }

    if store.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
        errors.push(ValidationError::EmptyPath);
    }

    if store.override_var.as_ref().is_some_and(|v| v.trim().is_empty()) {
        errors.push(ValidationError::EmptyOverrideVar);
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            obs.metrics_address.clone(),
        ));
    }

    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(obs.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
