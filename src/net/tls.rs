//! TLS for the HTTP listener.
//!
//! # Responsibilities
//! - Check the configured certificate chain and private key before serving
//! - Build the rustls server config used by axum-server

use axum_server::tls_rustls::RustlsConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::TlsConfig;

/// Why the listener TLS material could not be used.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("TLS file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No PEM certificates in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("No PEM private key in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("Failed to load TLS material: {0}")]
    Io(#[from] std::io::Error),
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    if !path.exists() {
        return Err(TlsError::NotFound(path.to_path_buf()));
    }
    Ok(BufReader::new(File::open(path)?))
}

/// Confirm both files hold what their names promise.
pub fn check_pem_files(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    let certs = rustls_pemfile::certs(&mut open(cert_path)?).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }
    if rustls_pemfile::private_key(&mut open(key_path)?)?.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }
    Ok(())
}

/// Load the listener's TLS configuration.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let cert_path = Path::new(&config.cert_path);
    let key_path = Path::new(&config.key_path);
    check_pem_files(cert_path, key_path)?;

    let rustls = RustlsConfig::from_pem_file(cert_path, key_path).await?;
    tracing::info!(cert = %config.cert_path, "Listener TLS configured");
    Ok(rustls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(path: &str) -> String {
        format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), path)
    }

    #[tokio::test]
    async fn test_loads_matching_pair() {
        let config = TlsConfig {
            cert_path: fixture("msp/signcerts/cert.pem"),
            key_path: fixture("msp/keystore/priv_sk"),
        };
        assert!(load_tls_config(&config).await.is_ok());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = check_pem_files(
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key.pem"),
        )
        .unwrap_err();
        assert!(matches!(err, TlsError::NotFound(_)));
    }

    #[test]
    fn test_key_file_in_cert_slot_is_rejected() {
        let key = fixture("msp/keystore/priv_sk");
        let err = check_pem_files(Path::new(&key), Path::new(&key)).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }

    #[test]
    fn test_cert_file_in_key_slot_is_rejected() {
        let cert = fixture("msp/signcerts/cert.pem");
        let err = check_pem_files(Path::new(&cert), Path::new(&cert)).unwrap_err();
        assert!(matches!(err, TlsError::NoPrivateKey(_)));
    }
}
