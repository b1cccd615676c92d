//! Credential loading from the organization's MSP directories.
//!
//! # Responsibilities
//! - Resolve the single credential file in a keystore/signcerts directory
//! - Read signing certificate, private key and TLS root certificate bytes
//! - Build the client `Identity` presented in every proposal
//!
//! # Security
//! - Key bytes are handed straight to the signer and never logged

use prost::Message;
use std::fs;
use std::path::{Path, PathBuf};

use crate::fabric::proto::SerializedIdentity;
use crate::fabric::types::{GatewayError, GatewayResult};

/// The client identity: MSP id plus PEM signing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    msp_id: String,
    credentials: Vec<u8>,
}

impl Identity {
    /// Build an identity from an MSP id and certificate bytes.
    pub fn new(msp_id: impl Into<String>, credentials: Vec<u8>) -> Self {
        Self {
            msp_id: msp_id.into(),
            credentials,
        }
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    /// Protobuf `SerializedIdentity`, used as proposal creator.
    pub fn serialize(&self) -> Vec<u8> {
        SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.credentials.clone(),
        }
        .encode_to_vec()
    }
}

/// Pick the first regular file of `dir` in name order.
///
/// Fails with `NotFound` when the directory is missing or holds no files.
pub fn first_file_in(dir: &Path) -> GatewayResult<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|_| GatewayError::NotFound(dir.to_path_buf()))?;

    // `is_file` follows symlinks, so mounted secrets (`priv_sk -> ..data/priv_sk`) count.
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NotFound(dir.to_path_buf()))
}

/// Read a credential file in full.
pub fn read_file(path: &Path) -> GatewayResult<Vec<u8>> {
    fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            GatewayError::NotFound(path.to_path_buf())
        } else {
            GatewayError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Read the first file of a credential directory.
pub fn read_first_file(dir: &Path) -> GatewayResult<Vec<u8>> {
    let path = first_file_in(dir)?;
    tracing::debug!(path = %path.display(), "Resolved credential file");
    read_file(&path)
}

/// Load the client identity from the signing certificate directory.
pub fn load_identity(msp_id: &str, cert_dir: &Path) -> GatewayResult<Identity> {
    let credentials = read_first_file(cert_dir)?;
    ensure_certificate(&credentials)?;

    tracing::info!(msp_id = %msp_id, "Client identity loaded");
    Ok(Identity::new(msp_id, credentials))
}

/// Load the private key bytes from the keystore directory.
pub fn load_private_key(key_dir: &Path) -> GatewayResult<Vec<u8>> {
    read_first_file(key_dir)
}

/// Load the PEM root certificate used to verify the peer's TLS certificate.
pub fn load_tls_root(path: &Path) -> GatewayResult<Vec<u8>> {
    let pem = read_file(path)?;
    ensure_certificate(&pem)?;
    Ok(pem)
}

fn ensure_certificate(pem: &[u8]) -> GatewayResult<()> {
    let mut reader: &[u8] = pem;
    let mut certs = rustls_pemfile::certs(&mut reader);
    match certs.next() {
        Some(Ok(_)) => Ok(()),
        Some(Err(e)) => Err(GatewayError::InvalidCertificate(e.to_string())),
        None => Err(GatewayError::InvalidCertificate(
            "no PEM certificate found".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("ledger-gateway-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_first_file_is_name_ordered() {
        let dir = scratch_dir("ordered");
        fs::write(dir.join("b_sk"), b"b").unwrap();
        fs::write(dir.join("a_sk"), b"a").unwrap();
        fs::create_dir(dir.join("0_subdir")).unwrap();

        assert_eq!(first_file_in(&dir).unwrap(), dir.join("a_sk"));
        assert_eq!(read_first_file(&dir).unwrap(), b"a");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_selected() {
        use std::os::unix::fs::symlink;

        let root = scratch_dir("symlinked");
        let data = root.join("..data");
        let keystore = root.join("keystore");
        fs::create_dir(&data).unwrap();
        fs::create_dir(&keystore).unwrap();
        fs::write(data.join("priv_sk"), b"key").unwrap();
        symlink("../..data/priv_sk", keystore.join("priv_sk")).unwrap();
        symlink(&data, keystore.join("..data")).unwrap();

        assert_eq!(first_file_in(&keystore).unwrap(), keystore.join("priv_sk"));
        assert_eq!(read_first_file(&keystore).unwrap(), b"key");

        fs::remove_dir_all(&root).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        use std::os::unix::fs::symlink;

        let dir = scratch_dir("dangling");
        symlink(dir.join("gone"), dir.join("a_sk")).unwrap();
        assert!(matches!(first_file_in(&dir), Err(GatewayError::NotFound(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_directory_is_not_found() {
        let dir = scratch_dir("empty");
        let err = first_file_in(&dir).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref p) if p == &dir));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = read_first_file(Path::new("/nonexistent/keystore")).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn test_load_identity() {
        let identity = load_identity("Org1MSP", &fixtures().join("msp/signcerts")).unwrap();
        assert_eq!(identity.msp_id(), "Org1MSP");
        assert!(identity.credentials().starts_with(b"-----BEGIN CERTIFICATE-----"));

        let decoded = SerializedIdentity::decode(identity.serialize().as_slice()).unwrap();
        assert_eq!(decoded.mspid, "Org1MSP");
        assert_eq!(decoded.id_bytes, identity.credentials());
    }

    #[test]
    fn test_key_is_not_a_certificate() {
        let err = load_identity("Org1MSP", &fixtures().join("msp/keystore")).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCertificate(_)));
    }

    #[test]
    fn test_load_tls_root() {
        assert!(load_tls_root(&fixtures().join("tls/ca.crt")).is_ok());
        assert!(matches!(
            load_tls_root(&fixtures().join("tls/missing.crt")),
            Err(GatewayError::NotFound(_))
        ));
    }
}
