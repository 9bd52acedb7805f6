//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into a Gate, shared via ArcSwap
//!
//! On file change or SIGHUP:
//!     watcher.rs loads + validates the new file
//!     → mpsc channel to the server
//!     → atomic swap of the compiled Gate
//! ```
//!
//! # Design Decisions
//! - Secrets come from the environment when set (`JWT_SECRET`, `ADMIN_*`)
//! - All fields have defaults to allow minimal configs
//! - An invalid reload never replaces a running config

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, AdminCredentialMode, AuthConfig, Environment, GateConfig, GatewayConfig,
    ListenerConfig, LogFormat, ObservabilityConfig, SecurityConfig, TimeoutConfig, TlsConfig,
    UpstreamConfig,
};
