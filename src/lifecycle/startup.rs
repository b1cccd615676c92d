//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Load credentials and open the ledger channel before any traffic
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::{ConfigError, GatewayConfig};
use crate::fabric::{Gateway, GatewayError};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::net::{self, ListenerError, TlsError};
use crate::observability::metrics;
use crate::resilience::DeadlinePolicy;

/// Errors that stop the process before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger gateway unavailable: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("Listener TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Load identity material, open the channel and bind the gateway session.
pub async fn build_gateway(config: &GatewayConfig) -> Result<Arc<Gateway>, StartupError> {
    let start = Instant::now();
    let deadlines = DeadlinePolicy::from(&config.deadlines);
    let gateway = Gateway::connect(&config.fabric, deadlines).await?;

    tracing::info!(
        peer_endpoint = %config.fabric.peer_endpoint,
        evaluate_ms = config.deadlines.evaluate_ms,
        endorse_ms = config.deadlines.endorse_ms,
        submit_ms = config.deadlines.submit_ms,
        commit_ms = config.deadlines.commit_ms,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Ledger gateway ready"
    );
    Ok(Arc::new(gateway))
}

fn start_metrics(config: &GatewayConfig) -> Result<(), StartupError> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }
    let addr: SocketAddr = config
        .observability
        .metrics_address
        .parse()
        .map_err(|e| {
            StartupError::Metrics(format!("{}: {}", config.observability.metrics_address, e))
        })?;
    metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))
}

/// Bring the process up and serve until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    start_metrics(&config)?;

    let gateway = build_gateway(&config).await?;
    let server = HttpServer::new(config.clone(), gateway);

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    match &config.listener.tls {
        Some(tls) => {
            let rustls = net::load_tls_config(tls).await?;
            let addr = net::bind_address(&config.listener)?;
            server.run_tls(addr, rustls, receiver).await?;
        }
        None => {
            let listener = net::bind(&config.listener).await?;
            server.run(listener, receiver).await?;
        }
    }

    Ok(())
}
