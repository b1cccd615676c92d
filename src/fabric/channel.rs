//! TLS connection to the gateway peer.
//!
//! # Responsibilities
//! - Dial the peer endpoint once at startup over TLS
//! - Verify the peer certificate against the configured root, checking the
//!   host alias instead of the dialled address
//! - Hand out cheap clones of the multiplexed channel
//!
//! # Design Decisions
//! - Failure to connect is fatal; there is no startup retry loop
//! - No reconnect logic here: tonic re-dials lazily if the connection drops,
//!   and calls made while the peer is down fail with their phase's error

use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

use crate::fabric::types::{GatewayError, GatewayResult};

/// Parameters for opening the channel.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Peer address, `host:port` or a full `https://` URI.
    pub endpoint: String,
    /// PEM root certificate of the peer's TLS CA.
    pub tls_root_certificate: Vec<u8>,
    /// Name the peer certificate must be issued for.
    pub host_alias: String,
    pub connect_timeout: Duration,
}

/// The single long-lived connection shared by all transactions.
#[derive(Debug, Clone)]
pub struct SecureChannel {
    channel: Channel,
}

impl SecureChannel {
    /// Perform the TLS handshake and return the connected channel.
    pub async fn open(options: ChannelOptions) -> GatewayResult<Self> {
        let endpoint = build_endpoint(&options)?;

        let channel = endpoint.connect().await.map_err(|e| {
            GatewayError::Connection(format!(
                "failed to connect to {} (TLS name {}): {}",
                options.endpoint, options.host_alias, e
            ))
        })?;

        tracing::info!(
            endpoint = %options.endpoint,
            host_alias = %options.host_alias,
            "Ledger channel established"
        );

        Ok(Self { channel })
    }

    /// A handle to the underlying multiplexed channel.
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }
}

fn endpoint_uri(address: &str) -> String {
    if address.starts_with("https://") || address.starts_with("http://") {
        address.to_string()
    } else {
        format!("https://{}", address)
    }
}

fn build_endpoint(options: &ChannelOptions) -> GatewayResult<Endpoint> {
    let tls = ClientTlsConfig::new()
        .ca_certificate(Certificate::from_pem(&options.tls_root_certificate))
        .domain_name(options.host_alias.clone());

    Endpoint::from_shared(endpoint_uri(&options.endpoint))
        .map_err(|e| {
            GatewayError::Connection(format!("invalid endpoint '{}': {}", options.endpoint, e))
        })?
        .tls_config(tls)
        .map_err(|e| GatewayError::Connection(format!("invalid TLS configuration: {}", e)))
        .map(|endpoint| {
            endpoint
                .connect_timeout(options.connect_timeout)
                .tcp_keepalive(Some(Duration::from_secs(30)))
                .http2_keep_alive_interval(Duration::from_secs(30))
                .keep_alive_timeout(Duration::from_secs(10))
                .keep_alive_while_idle(true)
        })
}
