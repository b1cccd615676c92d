//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the ledger gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// HTTP layer timeouts.
    pub timeouts: TimeoutConfig,

    /// Cross-origin policy for browser clients.
    pub cors: CorsConfig,

    /// Ledger network identity and endpoint settings.
    pub fabric: FabricConfig,

    /// Per-phase transaction deadlines.
    pub deadlines: DeadlineConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            tls: None,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for the HTTP layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one HTTP request/response in seconds.
    ///
    /// Must cover a full submit (endorse + submit + commit deadlines).
    pub request_secs: u64,

    /// Time allowed for in-flight requests to drain on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            shutdown_grace_secs: 10,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5000".to_string()],
        }
    }
}

/// Ledger network configuration.
///
/// Paths left unset are derived from `crypto_path` using the
/// test-network directory layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Ledger channel the session is bound to.
    pub channel_name: String,

    /// Deployed contract (chaincode) name.
    pub chaincode_name: String,

    /// Membership service provider id of the client organization.
    pub msp_id: String,

    /// Root of the organization's crypto material.
    pub crypto_path: PathBuf,

    /// Directory holding the client private key.
    pub key_directory_path: Option<PathBuf>,

    /// Directory holding the client signing certificate.
    pub cert_directory_path: Option<PathBuf>,

    /// TLS root certificate of the peer.
    pub tls_cert_path: Option<PathBuf>,

    /// Gateway peer address (host:port).
    pub peer_endpoint: String,

    /// Hostname expected in the peer's TLS certificate.
    pub peer_host_alias: String,

    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            channel_name: "mychannel".to_string(),
            chaincode_name: "basic".to_string(),
            msp_id: "Org1MSP".to_string(),
            crypto_path: PathBuf::from(
                "../test-network/organizations/peerOrganizations/org1.example.com",
            ),
            key_directory_path: None,
            cert_directory_path: None,
            tls_cert_path: None,
            peer_endpoint: "localhost:7051".to_string(),
            peer_host_alias: "peer0.org1.example.com".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

impl FabricConfig {
    /// Directory holding the private key.
    pub fn key_directory(&self) -> PathBuf {
        self.key_directory_path.clone().unwrap_or_else(|| {
            self.crypto_path
                .join("users/User1@org1.example.com/msp/keystore")
        })
    }

    /// Directory holding the signing certificate.
    pub fn cert_directory(&self) -> PathBuf {
        self.cert_directory_path.clone().unwrap_or_else(|| {
            self.crypto_path
                .join("users/User1@org1.example.com/msp/signcerts")
        })
    }

    /// TLS root certificate file.
    pub fn tls_cert(&self) -> PathBuf {
        self.tls_cert_path.clone().unwrap_or_else(|| {
            self.crypto_path
                .join("peers/peer0.org1.example.com/tls/ca.crt")
        })
    }
}

/// Per-phase transaction deadlines in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeadlineConfig {
    /// Read-only evaluation against one peer.
    pub evaluate_ms: u64,

    /// Collecting endorsements for a submit.
    pub endorse_ms: u64,

    /// Handing the endorsed transaction to ordering.
    pub submit_ms: u64,

    /// Waiting for the commit status.
    pub commit_ms: u64,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            evaluate_ms: 10_000,
            endorse_ms: 20_000,
            submit_ms: 10_000,
            commit_ms: 60_000,
        }
    }
}

impl DeadlineConfig {
    /// Worst-case duration of one submit in milliseconds.
    pub fn submit_total_ms(&self) -> u64 {
        self.endorse_ms
            .saturating_add(self.submit_ms)
            .saturating_add(self.commit_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_network() {
        let config = GatewayConfig::default();
        assert_eq!(config.fabric.channel_name, "mychannel");
        assert_eq!(config.fabric.chaincode_name, "basic");
        assert_eq!(config.fabric.msp_id, "Org1MSP");
        assert_eq!(config.fabric.peer_endpoint, "localhost:7051");
        assert_eq!(config.deadlines.evaluate_ms, 10_000);
        assert_eq!(config.deadlines.endorse_ms, 20_000);
        assert_eq!(config.deadlines.submit_ms, 10_000);
        assert_eq!(config.deadlines.commit_ms, 60_000);
    }

    #[test]
    fn test_derived_paths() {
        let mut fabric = FabricConfig::default();
        fabric.crypto_path = PathBuf::from("/crypto");
        assert_eq!(
            fabric.tls_cert(),
            PathBuf::from("/crypto/peers/peer0.org1.example.com/tls/ca.crt")
        );

        fabric.key_directory_path = Some(PathBuf::from("/keys"));
        assert_eq!(fabric.key_directory(), PathBuf::from("/keys"));
    }

    #[test]
    fn test_partial_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [deadlines]
            evaluate_ms = 250

            [fabric]
            channel_name = "assets"
            "#,
        )
        .unwrap();
        assert_eq!(config.deadlines.evaluate_ms, 250);
        assert_eq!(config.deadlines.commit_ms, 60_000);
        assert_eq!(config.fabric.channel_name, "assets");
        assert_eq!(config.fabric.chaincode_name, "basic");
    }
}
