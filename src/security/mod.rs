//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → body limit (tower-http)
//!     → gate (credentials, redirects)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → upstream
//!
//! Outgoing response:
//!     → headers.rs (strip hop-by-hop, add hardening headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a credential that cannot be verified is no credential
//! - No trust in client input, including identity headers

pub mod headers;
