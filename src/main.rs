//! Ledger gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ net ─▶ http ─▶ handlers ─▶ fabric::Gateway │
//!                             │                                  │           │
//!                             │                       evaluate / submit      │
//!                             │                                  ▼           │
//!     Client Response         │   response ◀── decoder ◀── gRPC transport ◀──┼── Fabric peer
//!     ◀───────────────────────┼──                                            │   (Gateway service)
//!                             │  config · observability · resilience ·      │
//!                             │  lifecycle                                   │
//!                             └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use ledger_gateway::config::{load_config, GatewayConfig};
use ledger_gateway::lifecycle;
use ledger_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "ledger-gateway")]
#[command(about = "HTTP gateway to a Hyperledger Fabric asset contract", long_about = None)]
struct Args {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration, print it and exit.
    #[arg(long)]
    check_config: bool,
}

fn print_config(config: &GatewayConfig) -> ExitCode {
    match toml::to_string_pretty(config) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render configuration: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ledger-gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        return print_config(&config);
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ledger-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        channel = %config.fabric.channel_name,
        contract = %config.fabric.chaincode_name,
        msp_id = %config.fabric.msp_id,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
