//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID, trace span)
//!     → gate middleware (forward or redirect)
//!     → local handler (/healthz, /api/admin/*) or forward.rs (upstream)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod server;

pub use forward::{ForwardError, Upstream};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
