//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_ADMIN_EMAIL: &str = "ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub const ENV_ENVIRONMENT: &str = "GATE_ENV";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults plus the environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay secrets and the environment name from process variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(secret) = get(ENV_JWT_SECRET) {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(email) = get(ENV_ADMIN_EMAIL) {
        config.admin.email = Some(email);
    }
    if let Some(password) = get(ENV_ADMIN_PASSWORD) {
        config.admin.password = Some(password);
    }
    if let Some(env) = get(ENV_ENVIRONMENT) {
        config.environment = env.parse().map_err(|reason| ConfigError::Env {
            var: ENV_ENVIRONMENT,
            reason,
        })?;
    }
    Ok(())
}
