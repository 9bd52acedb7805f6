//! Request gate for the climate dashboard.
//!
//! Classifies every request path, verifies the credential the route needs,
//! and either forwards the request to the upstream application or answers
//! with a redirect.

pub mod admin;
pub mod config;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use gate::{Gate, SharedGate};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
