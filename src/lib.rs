//! Ledger transaction gateway library.
//!
//! Exposes a small HTTP API over the asset contract of a Hyperledger Fabric
//! channel. Every request becomes a signed proposal sent through the Fabric
//! Gateway service: reads are evaluated on one peer, writes are endorsed,
//! ordered and awaited until commit.

pub mod assets;
pub mod config;
pub mod fabric;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use fabric::{Gateway, GatewayError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
