//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check prefix tables are absolute paths
//! - Refuse production configs without a signing secret
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{GatewayConfig, MAX_ADMIN_TTL_HOURS, MAX_SESSION_TTL_DAYS};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("{field}: must be at most {max}")]
    TooLarge { field: &'static str, max: i64 },

    #[error("{field}: prefix '{value}' must start with '/'")]
    RelativePrefix { field: &'static str, value: String },

    #[error("auth.jwt_secret: required in production (set JWT_SECRET)")]
    MissingSecret,

    #[error("upstream.identity_header: '{0}' is not a valid header name")]
    InvalidHeaderName(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::NonPositive { field: "timeouts.connect_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NonPositive { field: "timeouts.request_secs" });
    }
    check_ttl(&mut errors, "auth.session_ttl_days", config.auth.session_ttl_days, MAX_SESSION_TTL_DAYS);
    check_ttl(&mut errors, "admin.session_ttl_hours", config.admin.session_ttl_hours, MAX_ADMIN_TTL_HOURS);
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::NonPositive { field: "security.max_body_size" });
    }

    let gate = &config.gate;
    check_prefixes(&mut errors, "gate.excluded_prefixes", &gate.excluded_prefixes);
    check_prefixes(&mut errors, "gate.protected_prefixes", &gate.protected_prefixes);
    check_prefixes(&mut errors, "gate.auth_prefixes", &gate.auth_prefixes);
    check_prefixes(&mut errors, "gate.admin_prefix", std::slice::from_ref(&gate.admin_prefix));
    check_prefixes(
        &mut errors,
        "gate.admin_login_path",
        std::slice::from_ref(&gate.admin_login_path),
    );

    let has_secret = config
        .auth
        .jwt_secret
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    if config.environment.is_production() && !has_secret {
        errors.push(ValidationError::MissingSecret);
    }

    let header = &config.upstream.identity_header;
    if !header.is_empty() && axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(header.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_ttl(errors: &mut Vec<ValidationError>, field: &'static str, value: i64, max: i64) {
    if value <= 0 {
        errors.push(ValidationError::NonPositive { field });
    } else if value > max {
        errors.push(ValidationError::TooLarge { field, max });
    }
}

fn check_prefixes(errors: &mut Vec<ValidationError>, field: &'static str, values: &[String]) {
    for value in values {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePrefix {
                field,
                value: value.clone(),
            });
        }
    }
}
