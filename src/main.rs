//! climate-gate
//!
//! Request gate in front of the climate dashboard application.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 CLIMATE GATE                 │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ─────────────────┼─▶│  http   │──▶│   gate   │──▶│  forward  │──┼──▶ Upstream
//!                    │  │ server  │   │classify/ │   │ (hyper    │  │    application
//!                    │  └─────────┘   │ verify/  │   │  client)  │  │
//!   Client Response  │                │ decide   │   └───────────┘  │
//!   ◀────────────────┼── redirect ◀───┴──────────┘                  │
//!                    │                                              │
//!                    │  config (watch + SIGHUP) · observability     │
//!                    │  lifecycle (signals, graceful shutdown)      │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use climate_gate::config::watcher::ConfigWatcher;
use climate_gate::config::{load_config, load_from_env};
use climate_gate::http::HttpServer;
use climate_gate::lifecycle::signals::{reload_on_hangup, shutdown_on_signal};
use climate_gate::lifecycle::Shutdown;
use climate_gate::net::tls::load_tls_config;
use climate_gate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "climate-gate")]
#[command(about = "Request gate for the climate dashboard", version)]
struct Args {
    /// TOML config file. Without one, defaults plus environment are used.
    #[arg(short, long, env = "GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "climate-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        environment = ?config.environment,
        admin_mode = ?config.admin.credential_mode,
        admin_login = config.admin.login_enabled(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    // Keep the watcher alive for the life of the process.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(reload_on_hangup(
                path.clone(),
                watcher.sender(),
                shutdown.subscribe(),
            ));
            let watcher = watcher
                .run()
                .map_err(|e| tracing::warn!(error = %e, "Config file watching disabled"))
                .ok();
            (watcher, updates)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(&tls).await?;
            server
                .run_tls(addr, rustls, config_updates, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, config_updates, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
