//! Transaction signing.
//!
//! # Security
//! - The private key lives only inside `Signer`; it is never logged or serialized
//! - `Debug` output is redacted
//!
//! All proposals, prepared transactions and commit-status requests are hashed
//! with SHA-256 and signed with ECDSA P-256. Signatures are RFC 6979
//! deterministic, low-S normalised and DER encoded, as Fabric peers require.

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use rustls_pemfile::Item;
use sha2::{Digest, Sha256};

use crate::fabric::types::{GatewayError, GatewayResult};

/// SHA-256, the digest used for every signed message.
pub fn digest(message: &[u8]) -> [u8; 32] {
    Sha256::digest(message).into()
}

/// Signing capability wrapping a private key.
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    /// Create a signer from PEM (PKCS#8 or SEC1) or raw PKCS#8 DER key bytes.
    pub fn from_key_bytes(bytes: &[u8]) -> GatewayResult<Self> {
        let secret = parse_secret_key(bytes)?;
        Ok(Self {
            key: SigningKey::from(secret),
        })
    }

    /// Sign a precomputed digest.
    pub fn sign(&self, digest: &[u8]) -> GatewayResult<Vec<u8>> {
        let signature: Signature = self
            .key
            .sign_prehash(digest)
            .map_err(|e| GatewayError::InvalidKey(format!("Signing failed: {}", e)))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Hash `message` and sign the digest.
    pub fn sign_message(&self, message: &[u8]) -> GatewayResult<Vec<u8>> {
        self.sign(&digest(message))
    }

    /// SEC1 uncompressed public key, for diagnostics and verification.
    pub fn public_key(&self) -> Vec<u8> {
        self.key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &"ECDSA-P256-SHA256")
            .finish_non_exhaustive()
    }
}

fn parse_secret_key(bytes: &[u8]) -> GatewayResult<SecretKey> {
    let mut reader: &[u8] = bytes;
    for item in rustls_pemfile::read_all(&mut reader) {
        let item = item.map_err(|e| GatewayError::InvalidKey(format!("Malformed PEM: {}", e)))?;
        match item {
            Item::Pkcs8Key(der) => {
                return SecretKey::from_pkcs8_der(der.secret_pkcs8_der())
                    .map_err(|e| {
                        GatewayError::InvalidKey(format!("Unsupported PKCS#8 key: {}", e))
                    });
            }
            Item::Sec1Key(der) => {
                return SecretKey::from_sec1_der(der.secret_sec1_der())
                    .map_err(|e| GatewayError::InvalidKey(format!("Unsupported SEC1 key: {}", e)));
            }
            Item::Pkcs1Key(_) => {
                return Err(GatewayError::InvalidKey(
                    "RSA keys are not supported".to_string(),
                ));
            }
            _ => continue,
        }
    }

    // Not PEM at all: accept bare PKCS#8 DER.
    SecretKey::from_pkcs8_der(bytes)
        .map_err(|_| GatewayError::InvalidKey("no supported private key found".to_string()))
}
