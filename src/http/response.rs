//! Error responses.
//!
//! # Responsibilities
//! - Map validation and ledger errors to HTTP status codes
//! - Render every failure as `{ "error", "details", ... }` JSON
//!
//! # Design Decisions
//! - Ledger timeouts result in 504 Gateway Timeout
//! - Ordering and commit-status failures are 502: the outcome is indeterminate
//! - Contract rejections and decode failures are 500
//! - Errors are logged once, here, with their kind and transaction id

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::assets::AssetError;
use crate::fabric::GatewayError;

/// Any failure a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed validation.
    Validation(AssetError),
    /// Request body was not the JSON we expect.
    MalformedBody(String),
    /// No route matched.
    NotFound,
    /// The ledger call failed; `action` names what the client asked for.
    Ledger {
        action: &'static str,
        source: GatewayError,
    },
}

impl ApiError {
    pub fn ledger(action: &'static str) -> impl FnOnce(GatewayError) -> ApiError {
        move |source| ApiError::Ledger { action, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Ledger { source, .. } => status_for(source),
        }
    }
}

/// HTTP status for a ledger error.
pub fn status_for(error: &GatewayError) -> StatusCode {
    match error {
        GatewayError::Timeout(_) | GatewayError::CommitTimeout { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        GatewayError::Submission { .. }
        | GatewayError::CommitStatus { .. }
        | GatewayError::Connection(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn transaction_id(error: &GatewayError) -> Option<&str> {
    match error {
        GatewayError::Endorsement { transaction_id, .. }
        | GatewayError::Submission { transaction_id, .. }
        | GatewayError::CommitTimeout { transaction_id, .. }
        | GatewayError::CommitStatus { transaction_id, .. }
        | GatewayError::CommitFailed { transaction_id, .. } => Some(transaction_id),
        _ => None,
    }
}

fn ledger_body(action: &str, error: &GatewayError) -> Value {
    let mut body = json!({
        "error": format!("Failed to {}", action),
        "details": error.to_string(),
        "kind": error.kind(),
    });
    if let Some(id) = transaction_id(error) {
        body["transactionId"] = json!(id);
    }
    if let Some(failure) = error.failure() {
        if !failure.details.is_empty() {
            body["peerErrors"] = json!(failure.details);
        }
    }
    if error.is_indeterminate() {
        body["indeterminate"] = json!(true);
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(e) => json!({
                "error": e.to_string(),
                "fields": e.fields(),
            }),
            ApiError::MalformedBody(message) => json!({
                "error": "Invalid request body",
                "details": message,
            }),
            ApiError::NotFound => json!({ "error": "Not found" }),
            ApiError::Ledger { action, source } => {
                tracing::error!(
                    action = %action,
                    kind = source.kind(),
                    transaction_id = transaction_id(source).unwrap_or("-"),
                    error = %source,
                    "Ledger request failed"
                );
                ledger_body(action, source)
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<AssetError> for ApiError {
    fn from(e: AssetError) -> Self {
        ApiError::Validation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric::{ErrorDetail, Failure};
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&GatewayError::Timeout(Duration::from_millis(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&GatewayError::Submission {
                transaction_id: "t".into(),
                failure: Failure::new("UNAVAILABLE", "down"),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&GatewayError::Evaluation(Failure::new("UNKNOWN", "no"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Validation(AssetError::MissingFields(vec!["id"])).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_ledger_body_carries_peer_errors() {
        let mut failure = Failure::new("ABORTED", "failed to endorse transaction");
        failure.details.push(ErrorDetail {
            address: "peer0.org1.example.com:7051".into(),
            msp_id: "Org1MSP".into(),
            message: "the asset asset1 already exists".into(),
        });
        let error = GatewayError::Endorsement {
            transaction_id: "abc".into(),
            failure,
        };
        let body = ledger_body("create asset", &error);
        assert_eq!(body["error"], "Failed to create asset");
        assert_eq!(body["kind"], "endorsement");
        assert_eq!(body["transactionId"], "abc");
        assert_eq!(body["peerErrors"][0]["mspId"], "Org1MSP");
        assert!(body.get("indeterminate").is_none());
    }
}
