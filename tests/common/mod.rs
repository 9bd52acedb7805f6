//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use climate_gate::config::GatewayConfig;
use climate_gate::gate::TokenSigner;
use climate_gate::http::HttpServer;
use climate_gate::lifecycle::Shutdown;

pub const SECRET: &str = "integration-secret";

/// Start a mock upstream that answers every request with
/// `<path-and-query>|<x-user-id or ->`.
pub async fn start_echo_upstream(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                let body = echo_body(&head);

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
}

fn echo_body(head: &str) -> String {
    let mut lines = head.lines();
    let target = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("?")
        .to_string();
    let user = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("x-user-id"))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{}|{}", target, user)
}

pub fn config(gate_addr: SocketAddr, upstream_addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = gate_addr.to_string();
    config.upstream.address = upstream_addr.to_string();
    config.auth.jwt_secret = Some(SECRET.to_string());
    config.observability.metrics_enabled = false;
    config
}

pub struct RunningGate {
    pub base: String,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
    pub shutdown: Shutdown,
}

/// Start the gateway on `config.listener.bind_address`.
pub async fn start_gate(config: GatewayConfig) -> RunningGate {
    let addr: SocketAddr = config.listener.bind_address.parse().unwrap();
    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    RunningGate {
        base: format!("http://{}", addr),
        updates,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn signer() -> TokenSigner {
    TokenSigner::new(&secrecy::SecretString::from(SECRET.to_string()))
}

#[allow(dead_code)]
pub fn session_token(user_id: &str) -> String {
    signer()
        .issue_session(user_id, Some("ana@climate.example"), None, chrono::Duration::days(7))
        .unwrap()
}

#[allow(dead_code)]
pub fn expired_token(user_id: &str) -> String {
    signer()
        .issue_session(user_id, None, None, chrono::Duration::hours(-1))
        .unwrap()
}
