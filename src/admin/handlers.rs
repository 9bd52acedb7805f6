use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::auth::{check_credentials, LoginRequest};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

fn message(status: StatusCode, message: &'static str) -> Response {
    (status, Json(Message { message })).into_response()
}

/// Admin login. Without configured credentials the request belongs to the
/// upstream application and is forwarded untouched.
pub async fn login(State(state): State<AppState>, request: Request<Body>) -> Response {
    let inner = state.inner.load_full();
    if !inner.config.admin.login_enabled() {
        return state.forward(request).await;
    }

    // The body limit layer already capped the size.
    let bytes = match to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return message(StatusCode::BAD_REQUEST, "Invalid request body"),
    };
    let Ok(login) = serde_json::from_slice::<LoginRequest>(&bytes) else {
        return message(StatusCode::BAD_REQUEST, "Invalid request body");
    };

    if !check_credentials(&inner.config.admin, &login) {
        tracing::warn!(email = %login.email, "Admin login failed");
        return message(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let gate = state.gate.load_full();
    let cookie = match gate.admin_cookie_value() {
        Ok(value) => gate.cookies().admin_cookie(&value),
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue admin credential");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let Ok(cookie) = cookie else {
        tracing::error!("Admin credential is not a valid cookie value");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    tracing::info!(email = %login.email, mode = ?gate.admin_mode(), "Admin logged in");
    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(Message {
            message: "Login successful",
        }),
    )
        .into_response()
}

pub async fn logout(State(state): State<AppState>) -> Response {
    let gate = state.gate.load_full();
    (
        StatusCode::OK,
        [(SET_COOKIE, gate.cookies().clear_admin_cookie())],
        Json(Message {
            message: "Logged out",
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::config::{AdminCredentialMode, GatewayConfig};
    use crate::http::HttpServer;
    use axum::body::Body;
    use axum::http::{header::SET_COOKIE, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use tower::ServiceExt;

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = Some("admin-secret".into());
        config.admin.email = Some("ops@climate.example".into());
        config.admin.password = Some("hunter22".into());
        // Nothing listens here; forwarded requests fail fast.
        config.upstream.address = "127.0.0.1:9".into();
        config
    }

    async fn post(router: &Router, path: &str, body: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json(res: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(res.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn login_sets_admin_cookie() {
        let router = HttpServer::new(config()).unwrap().router();
        let res = post(
            &router,
            "/api/admin/login",
            r#"{"email":"ops@climate.example","password":"hunter22"}"#,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("admin_token=authenticated;"));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(json(res).await["message"], "Login successful");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let router = HttpServer::new(config()).unwrap().router();
        let res = post(
            &router,
            "/api/admin/login",
            r#"{"email":"ops@climate.example","password":"nope"}"#,
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(SET_COOKIE).is_none());
        assert_eq!(json(res).await["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let router = HttpServer::new(config()).unwrap().router();
        let res = post(&router, "/api/admin/login", "{email").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_mode_issues_verifiable_token() {
        let mut config = config();
        config.admin.credential_mode = AdminCredentialMode::Signed;
        let server = HttpServer::new(config).unwrap();
        let res = post(
            &server.router(),
            "/api/admin/login",
            r#"{"email":"ops@climate.example","password":"hunter22"}"#,
        )
        .await;

        let cookie = res.headers()[SET_COOKIE].to_str().unwrap();
        let token = cookie
            .strip_prefix("admin_token=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(server.gate().load().signer().verify_admin(token).is_ok());
    }

    #[tokio::test]
    async fn logout_expires_cookie() {
        let router = HttpServer::new(config()).unwrap().router();
        let res = post(&router, "/api/admin/logout", "").await;

        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("admin_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn disabled_login_goes_upstream() {
        let mut config = config();
        config.admin.password = None;
        let router = HttpServer::new(config).unwrap().router();
        let res = post(&router, "/api/admin/login", "{}").await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}
