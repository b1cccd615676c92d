//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Env { key: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides using `lookup` as the variable source.
///
/// Unset and empty variables leave the configured value untouched.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let fabric = &mut config.fabric;
    if let Some(v) = get("CHANNEL_NAME") {
        fabric.channel_name = v;
    }
    if let Some(v) = get("CHAINCODE_NAME") {
        fabric.chaincode_name = v;
    }
    if let Some(v) = get("MSP_ID") {
        fabric.msp_id = v;
    }
    if let Some(v) = get("CRYPTO_PATH") {
        fabric.crypto_path = PathBuf::from(v);
    }
    if let Some(v) = get("KEY_DIRECTORY_PATH") {
        fabric.key_directory_path = Some(PathBuf::from(v));
    }
    if let Some(v) = get("CERT_DIRECTORY_PATH") {
        fabric.cert_directory_path = Some(PathBuf::from(v));
    }
    if let Some(v) = get("TLS_CERT_PATH") {
        fabric.tls_cert_path = Some(PathBuf::from(v));
    }
    if let Some(v) = get("PEER_ENDPOINT") {
        fabric.peer_endpoint = v;
    }
    if let Some(v) = get("PEER_HOST_ALIAS") {
        fabric.peer_host_alias = v;
    }

    if let Some(v) = get("BIND_ADDRESS") {
        config.listener.bind_address = v;
    } else if let Some(v) = get("PORT") {
        let port: u16 = parse_env("PORT", &v)?;
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }

    let deadlines = &mut config.deadlines;
    if let Some(v) = get("EVALUATE_DEADLINE_MS") {
        deadlines.evaluate_ms = parse_env("EVALUATE_DEADLINE_MS", &v)?;
    }
    if let Some(v) = get("ENDORSE_DEADLINE_MS") {
        deadlines.endorse_ms = parse_env("ENDORSE_DEADLINE_MS", &v)?;
    }
    if let Some(v) = get("SUBMIT_DEADLINE_MS") {
        deadlines.submit_ms = parse_env("SUBMIT_DEADLINE_MS", &v)?;
    }
    if let Some(v) = get("COMMIT_DEADLINE_MS") {
        deadlines.commit_ms = parse_env("COMMIT_DEADLINE_MS", &v)?;
    }

    Ok(())
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        key,
        message: e.to_string(),
    })
}
