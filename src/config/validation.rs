//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadlines > 0, addresses parse)
//! - Check that the HTTP timeout can cover a full submit
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }

    let fabric = &config.fabric;
    for (field, value) in [
        ("fabric.channel_name", &fabric.channel_name),
        ("fabric.chaincode_name", &fabric.chaincode_name),
        ("fabric.msp_id", &fabric.msp_id),
        ("fabric.peer_endpoint", &fabric.peer_endpoint),
        ("fabric.peer_host_alias", &fabric.peer_host_alias),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }
    if fabric.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("fabric.connect_timeout_secs", "must be > 0"));
    }

    let deadlines = &config.deadlines;
    for (field, value) in [
        ("deadlines.evaluate_ms", deadlines.evaluate_ms),
        ("deadlines.endorse_ms", deadlines.endorse_ms),
        ("deadlines.submit_ms", deadlines.submit_ms),
        ("deadlines.commit_ms", deadlines.commit_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be > 0"));
        }
    }

    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    if request_ms <= deadlines.submit_total_ms() {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "{}s does not cover a full submit ({}ms)",
                config.timeouts.request_secs,
                deadlines.submit_total_ms()
            ),
        ));
    }
    if request_ms <= deadlines.evaluate_ms {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must exceed deadlines.evaluate_ms",
        ));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.fabric.channel_name = String::new();
        config.deadlines.commit_ms = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"fabric.channel_name"));
        assert!(fields.contains(&"deadlines.commit_ms"));
        assert!(fields.contains(&"observability.log_format"));
    }

    #[test]
    fn test_request_timeout_must_cover_submit() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 30;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
        assert!(errors[0].to_string().contains("90000ms"));
    }
}
