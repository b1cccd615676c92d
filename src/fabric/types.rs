//! Transaction types and error definitions.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// How a transaction is executed against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Read-only query against a single peer.
    Evaluate,
    /// Endorse, order and commit.
    Submit,
}

impl TransactionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionMode::Evaluate => "evaluate",
            TransactionMode::Submit => "submit",
        }
    }
}

/// A contract invocation. Arguments are always strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub mode: TransactionMode,
    pub function_name: String,
    pub arguments: Vec<String>,
}

impl TransactionRequest {
    pub fn evaluate(function_name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            mode: TransactionMode::Evaluate,
            function_name: function_name.into(),
            arguments,
        }
    }

    pub fn submit(function_name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            mode: TransactionMode::Submit,
            function_name: function_name.into(),
            arguments,
        }
    }
}

/// Phase of a submit at which something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Evaluate,
    Endorse,
    Submit,
    CommitStatus,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Evaluate => "evaluate",
            Phase::Endorse => "endorse",
            Phase::Submit => "submit",
            Phase::CommitStatus => "commit_status",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by an individual peer or orderer behind the gateway peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub address: String,
    pub msp_id: String,
    pub message: String,
}

/// Structured failure of a ledger RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// gRPC status code name (e.g. "ABORTED").
    pub code: String,
    pub message: String,
    /// Per-endorser / per-orderer detail, when the gateway peer provided it.
    pub details: Vec<ErrorDetail>,
}

impl Failure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        for detail in &self.details {
            write!(f, "; {} [{}]: {}", detail.address, detail.msp_id, detail.message)?;
        }
        Ok(())
    }
}

/// Errors that can occur while loading identity material or transacting.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credential directory empty or missing.
    #[error("Credential not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Credential file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Private key bytes are not a supported key.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Signing certificate is not a PEM certificate.
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// TLS handshake or dial failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Evaluate did not finish within its deadline.
    #[error("Evaluate timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The peer rejected or failed the evaluation.
    #[error("Evaluation failed: {0}")]
    Evaluation(Failure),

    /// Endorsement failed; the transaction was never sent for ordering.
    #[error("Endorsement failed for transaction {transaction_id}: {failure}")]
    Endorsement {
        transaction_id: String,
        failure: Failure,
    },

    /// Ordering submission failed; the outcome is indeterminate.
    #[error("Submission failed for transaction {transaction_id}: {failure}")]
    Submission {
        transaction_id: String,
        failure: Failure,
    },

    /// No commit status within the deadline; the transaction may still commit.
    #[error(
        "Commit status for transaction {transaction_id} not received within {}ms",
        .deadline.as_millis()
    )]
    CommitTimeout {
        transaction_id: String,
        deadline: Duration,
    },

    /// Commit-status RPC failed for a reason other than its deadline.
    #[error("Commit status request failed for transaction {transaction_id}: {failure}")]
    CommitStatus {
        transaction_id: String,
        failure: Failure,
    },

    /// The transaction was ordered but invalidated by the validating peers.
    #[error("Transaction {transaction_id} failed to commit with status code {code} ({code_name})")]
    CommitFailed {
        transaction_id: String,
        code: i32,
        code_name: &'static str,
        block_number: u64,
    },

    /// Result bytes are not in the expected format.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Io { .. } => "io",
            GatewayError::InvalidKey(_) => "invalid_key",
            GatewayError::InvalidCertificate(_) => "invalid_certificate",
            GatewayError::Connection(_) => "connection",
            GatewayError::Timeout(_) => "timeout",
            GatewayError::Evaluation(_) => "evaluation",
            GatewayError::Endorsement { .. } => "endorsement",
            GatewayError::Submission { .. } => "submission",
            GatewayError::CommitTimeout { .. } => "commit_timeout",
            GatewayError::CommitStatus { .. } => "commit_status",
            GatewayError::CommitFailed { .. } => "commit_failed",
            GatewayError::Decode(_) => "decode",
        }
    }

    /// Whether the ledger may have applied the transaction despite the error.
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            GatewayError::Submission { .. }
                | GatewayError::CommitTimeout { .. }
                | GatewayError::CommitStatus { .. }
        )
    }

    /// The transaction phase that failed, for per-call errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            GatewayError::Timeout(_) | GatewayError::Evaluation(_) => Some(Phase::Evaluate),
            GatewayError::Endorsement { .. } => Some(Phase::Endorse),
            GatewayError::Submission { .. } => Some(Phase::Submit),
            GatewayError::CommitTimeout { .. }
            | GatewayError::CommitStatus { .. }
            | GatewayError::CommitFailed { .. } => Some(Phase::CommitStatus),
            _ => None,
        }
    }

    /// The structured peer failure, if this error carries one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            GatewayError::Evaluation(failure)
            | GatewayError::Endorsement { failure, .. }
            | GatewayError::Submission { failure, .. }
            | GatewayError::CommitStatus { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::Timeout(Duration::from_millis(10_000));
        assert_eq!(err.to_string(), "Evaluate timed out after 10000ms");

        let err = GatewayError::CommitTimeout {
            transaction_id: "abc".into(),
            deadline: Duration::from_secs(60),
        };
        assert_eq!(
            err.to_string(),
            "Commit status for transaction abc not received within 60000ms"
        );
    }

    #[test]
    fn test_failure_display_includes_details() {
        let mut failure = Failure::new("ABORTED", "failed to endorse transaction");
        failure.details.push(ErrorDetail {
            address: "peer0.org1.example.com:7051".into(),
            msp_id: "Org1MSP".into(),
            message: "the asset asset1 already exists".into(),
        });
        let text = failure.to_string();
        assert!(text.starts_with("failed to endorse transaction (ABORTED)"));
        assert!(text.contains("already exists"));
    }

    #[test]
    fn test_indeterminacy() {
        let endorse = GatewayError::Endorsement {
            transaction_id: "t".into(),
            failure: Failure::new("ABORTED", "no"),
        };
        let submit = GatewayError::Submission {
            transaction_id: "t".into(),
            failure: Failure::new("UNAVAILABLE", "no"),
        };
        assert!(!endorse.is_indeterminate());
        assert!(submit.is_indeterminate());
        assert_eq!(submit.kind(), "submission");
    }
}
