//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Secret used when no `JWT_SECRET` is configured in development.
pub const DEV_FALLBACK_SECRET: &str = "fallback_secret_only_for_dev";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment; controls cookie `Secure` and secret fallback.
    pub environment: Environment,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// The dashboard application requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Route classification tables.
    pub gate: GateConfig,

    /// Session credential settings.
    pub auth: AuthConfig,

    /// Admin credential settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Header carrying the verified user id to the upstream.
    /// Empty disables identity forwarding.
    pub identity_header: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
            identity_header: "x-user-id".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for draining connections on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Prefix tables used by the route classifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Paths that never pass through the gate.
    pub excluded_prefixes: Vec<String>,

    /// Everything below this prefix requires the admin credential.
    pub admin_prefix: String,

    /// Admin login page (exact match).
    pub admin_login_path: String,

    /// Pages requiring a valid session credential.
    pub protected_prefixes: Vec<String>,

    /// Login and registration pages.
    pub auth_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec![
                "/api".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
                "/assets".to_string(),
            ],
            admin_prefix: "/admin".to_string(),
            admin_login_path: "/admin/login".to_string(),
            protected_prefixes: vec![
                "/profile".to_string(),
                "/analysis".to_string(),
                "/predict".to_string(),
                "/notifications".to_string(),
                "/feedback".to_string(),
            ],
            auth_prefixes: vec!["/auth/login".to_string(), "/auth/register".to_string()],
        }
    }
}

/// Longest accepted session token lifetime.
pub const MAX_SESSION_TTL_DAYS: i64 = 365;

/// Longest accepted admin cookie lifetime.
pub const MAX_ADMIN_TTL_HOURS: i64 = 8760;

/// Session credential configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Overridden by `JWT_SECRET`.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Lifetime in days of tokens minted by `gate-cli mint`.
    pub session_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            session_ttl_days: 7,
        }
    }
}

impl AuthConfig {
    /// Lifetime of minted session tokens, `None` when not representable.
    pub fn session_ttl(&self) -> Option<chrono::TimeDelta> {
        chrono::TimeDelta::try_days(self.session_ttl_days)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("session_ttl_days", &self.session_ttl_days)
            .finish()
    }
}

/// How the admin credential is represented.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdminCredentialMode {
    /// Cookie value is the literal `authenticated`.
    #[default]
    Sentinel,
    /// Cookie value is a signed, expiring admin token.
    Signed,
}

/// Admin credential configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub credential_mode: AdminCredentialMode,

    /// Admin login email. Overridden by `ADMIN_EMAIL`.
    pub email: Option<String>,

    /// Admin login password. Overridden by `ADMIN_PASSWORD`.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Admin cookie lifetime in hours.
    pub session_ttl_hours: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            credential_mode: AdminCredentialMode::Sentinel,
            email: None,
            password: None,
            session_ttl_hours: 24,
        }
    }
}

impl AdminConfig {
    /// Local admin login is served only when both credentials are present.
    pub fn login_enabled(&self) -> bool {
        matches!((&self.email, &self.password), (Some(e), Some(p)) if !e.is_empty() && !p.is_empty())
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("credential_mode", &self.credential_mode)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
