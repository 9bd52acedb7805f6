//! Local admin session endpoints.
//!
//! # Data Flow
//! ```text
//! POST /api/admin/login  → auth.rs (compare with configured credentials)
//!                        → Gate::admin_cookie_value → Set-Cookie admin_token
//! POST /api/admin/logout → Set-Cookie admin_token expired
//! ```
//!
//! Both paths sit under the excluded `/api` prefix, so the gate never
//! redirects them.

pub mod auth;
pub mod handlers;

use std::time::Duration;

use axum::{routing::post, Router};
use tower_http::timeout::TimeoutLayer;

use crate::http::server::AppState;

pub const LOGIN_PATH: &str = "/api/admin/login";
pub const LOGOUT_PATH: &str = "/api/admin/logout";

#[allow(deprecated)]
pub fn router(request_timeout: Duration) -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, post(handlers::login))
        .route(LOGOUT_PATH, post(handlers::logout))
        .layer(TimeoutLayer::new(request_timeout))
}
