//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: local endpoints plus upstream fallback
//! - Wire up middleware (gate, metrics, body limit, tracing, request ID)
//! - Apply reloaded configurations without dropping connections
//! - Serve plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::admin;
use crate::config::GatewayConfig;
use crate::gate::{gate_middleware, Gate, SharedGate};
use crate::http::forward::{build_client, ForwardError, Upstream, UpstreamClient};
use crate::http::request::{make_span, with_request_id};
use crate::observability::metrics;
use crate::security::headers::with_security_headers;

/// Per-config state that is swapped as a whole on reload.
#[derive(Debug)]
pub struct Inner {
    pub config: GatewayConfig,
    pub upstream: Upstream,
}

impl Inner {
    fn from_config(config: GatewayConfig) -> Result<Self, ForwardError> {
        let upstream = Upstream::new(
            &config.upstream.address,
            Duration::from_secs(config.timeouts.request_secs),
            config.listener.tls.is_some(),
        )?;
        Ok(Self { config, upstream })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: SharedGate,
    pub inner: Arc<ArcSwap<Inner>>,
    pub client: UpstreamClient,
}

impl AppState {
    /// Forward `request` to the current upstream.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let inner = self.inner.load_full();
        match inner.upstream.forward(&self.client, request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    /// Compile `config` and swap it in. A config the server cannot use is
    /// rejected and the running one kept.
    pub fn apply(&self, config: GatewayConfig) -> Result<(), ForwardError> {
        let inner = Inner::from_config(config)?;
        self.gate.store(Arc::new(Gate::from_config(&inner.config)));
        self.inner.store(Arc::new(inner));
        Ok(())
    }

    /// `apply` a reloaded config, logging and counting the outcome.
    pub fn reload(&self, config: GatewayConfig) -> bool {
        let applied = self.apply(config);
        metrics::record_config_reload(applied.is_ok());
        match applied {
            Ok(()) => {
                tracing::info!("Configuration reloaded");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected reloaded configuration");
                false
            }
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    shutdown_grace: Duration,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ForwardError> {
        let client = build_client(Duration::from_secs(config.timeouts.connect_secs));
        let gate = Gate::shared(Gate::from_config(&config));
        let shutdown_grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
        let max_body_size = config.security.max_body_size;
        let security_headers = config.security.enable_headers;
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);

        let state = AppState {
            gate,
            inner: Arc::new(ArcSwap::from_pointee(Inner::from_config(config)?)),
            client,
        };

        let router = Self::build_router(state.clone(), request_timeout, max_body_size, security_headers);
        Ok(Self {
            router,
            state,
            shutdown_grace,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layer settings are read once; changing them needs a restart.
    fn build_router(
        state: AppState,
        request_timeout: Duration,
        max_body_size: usize,
        security_headers: bool,
    ) -> Router {
        let router = Router::new()
            .route("/healthz", get(healthz))
            .merge(admin::router(request_timeout))
            .fallback(proxy_handler)
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state.gate.clone(), gate_middleware))
            .layer(middleware::from_fn(track_metrics))
            .layer(RequestBodyLimitLayer::new(max_body_size))
            .layer(TraceLayer::new_for_http().make_span_with(make_span));

        let router = with_request_id(router);
        if security_headers {
            with_security_headers(router)
        } else {
            router
        }
    }

    /// The router without a listener, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gate(&self) -> SharedGate {
        self.state.gate.clone()
    }

    /// Apply configs from `updates` until the channel closes.
    fn spawn_reload_loop(&self, mut updates: mpsc::UnboundedReceiver<GatewayConfig>) {
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = updates.recv().await {
                state.reload(config);
            }
        });
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.spawn_reload_loop(config_updates);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        self.spawn_reload_loop(config_updates);

        let handle = axum_server::Handle::new();
        let grace = self.shutdown_grace;
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Draining connections");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Everything not served locally goes upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.forward(request).await
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, StatusCode};
    use tower::ServiceExt;

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = Some("server-secret".into());
        config
    }

    #[tokio::test]
    async fn healthz_is_served_locally() {
        let server = HttpServer::new(config()).unwrap();
        let res = server
            .router()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        assert!(res.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn gate_runs_before_fallback() {
        let server = HttpServer::new(config()).unwrap();
        let res = server
            .router()
            .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[LOCATION], "/auth/login?callbackUrl=%2Fprofile");
    }

    #[tokio::test]
    async fn apply_swaps_gate_and_rejects_bad_upstream() {
        let server = HttpServer::new(config()).unwrap();

        let mut next = config();
        next.gate.protected_prefixes.push("/reports".into());
        server.state.apply(next).unwrap();
        let res = server
            .router()
            .oneshot(Request::builder().uri("/reports/q3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);

        let mut broken = config();
        broken.upstream.address = "not an address".into();
        assert!(server.state.apply(broken).is_err());
        assert_eq!(
            server.state.inner.load().upstream.authority().as_str(),
            "127.0.0.1:3000"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = config();
        config.security.max_body_size = 8;
        let server = HttpServer::new(config).unwrap();

        let res = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/login")
                    .header("content-length", "64")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn reload_counts_each_config_once() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let server = HttpServer::new(config()).unwrap();

        let mut broken = config();
        broken.upstream.address = "not an address".into();
        ::metrics::with_local_recorder(&recorder, || {
            assert!(!server.state.reload(broken));
            assert!(server.state.reload(config()));
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"gate_config_reloads_total{outcome="rejected"} 1"#));
        assert!(rendered.contains(r#"gate_config_reloads_total{outcome="applied"} 1"#));
    }

}
