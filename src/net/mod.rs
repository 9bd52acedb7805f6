//! Listener-side transport concerns.

pub mod tls;
