//! Asset API payloads and their marshalling into contract arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Validation failures of an asset request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
}

impl AssetError {
    /// Names of the fields that were missing or empty.
    pub fn fields(&self) -> &[&'static str] {
        match self {
            AssetError::MissingFields(fields) => fields,
        }
    }
}

/// Body of `POST /asset` and `PUT /asset`.
///
/// Fields are kept as raw JSON values: clients send balances and amounts as
/// numbers or strings, and the contract takes everything as strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetPayload {
    pub id: Option<Value>,
    pub dealer_id: Option<Value>,
    pub msisdn: Option<Value>,
    pub mpin: Option<Value>,
    pub balance: Option<Value>,
    pub status: Option<Value>,
    pub trans_amount: Option<Value>,
    pub trans_type: Option<Value>,
    pub remarks: Option<Value>,
}

/// Body of `POST /asset/transfer`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferRequest {
    pub id: Option<Value>,
    pub new_owner: Option<Value>,
}

/// Render a JSON value the way the contract expects its arguments.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// False, zero, null and empty strings count as absent.
fn is_blank(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn text_or(value: &Option<Value>, default: &str) -> String {
    value
        .as_ref()
        .filter(|v| !v.is_null())
        .map(stringify)
        .unwrap_or_else(|| default.to_string())
}

impl AssetPayload {
    /// Check required fields. `balance` only has to be present; zero is a valid balance.
    pub fn validate(&self) -> Result<(), AssetError> {
        let mut missing = Vec::new();
        let checks: [(&'static str, bool); 6] = [
            ("id", is_blank(&self.id)),
            ("dealerId", is_blank(&self.dealer_id)),
            ("msisdn", is_blank(&self.msisdn)),
            ("mpin", is_blank(&self.mpin)),
            ("balance", matches!(self.balance, None | Some(Value::Null))),
            ("status", is_blank(&self.status)),
        ];
        for (field, absent) in checks {
            if absent {
                missing.push(field);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AssetError::MissingFields(missing))
        }
    }

    /// The asset id as text, empty if absent.
    pub fn asset_id(&self) -> String {
        text_or(&self.id, "")
    }

    /// Validate and produce the nine contract arguments of
    /// `CreateAsset` / `UpdateAsset`, in contract order.
    pub fn to_args(&self) -> Result<Vec<String>, AssetError> {
        self.validate()?;
        Ok(vec![
            text_or(&self.id, ""),
            text_or(&self.dealer_id, ""),
            text_or(&self.msisdn, ""),
            text_or(&self.mpin, ""),
            text_or(&self.balance, ""),
            text_or(&self.status, ""),
            text_or(&self.trans_amount, "0"),
            text_or(&self.trans_type, ""),
            text_or(&self.remarks, ""),
        ])
    }
}

impl TransferRequest {
    pub fn validate(&self) -> Result<(), AssetError> {
        let mut missing = Vec::new();
        if is_blank(&self.id) {
            missing.push("id");
        }
        if is_blank(&self.new_owner) {
            missing.push("newOwner");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AssetError::MissingFields(missing))
        }
    }

    /// Validate and produce `[id, newOwner]` for `TransferAsset`.
    pub fn to_args(&self) -> Result<Vec<String>, AssetError> {
        self.validate()?;
        Ok(vec![text_or(&self.id, ""), text_or(&self.new_owner, "")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> AssetPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers_are_stringified_in_contract_order() {
        let args = payload(json!({
            "id": "asset1",
            "dealerId": "dealerA",
            "msisdn": 5551234,
            "mpin": "1234",
            "balance": 100,
            "status": "active",
            "transAmount": 12.5,
            "transType": "init",
            "remarks": "first"
        }))
        .to_args()
        .unwrap();
        assert_eq!(
            args,
            vec!["asset1", "dealerA", "5551234", "1234", "100", "active", "12.5", "init", "first"]
        );
    }

    #[test]
    fn test_optional_fields_default() {
        let args = payload(json!({
            "id": "asset2",
            "dealerId": "dealerB",
            "msisdn": "5550000",
            "mpin": "0000",
            "balance": 0,
            "status": "active"
        }))
        .to_args()
        .unwrap();
        assert_eq!(&args[4], "0");
        assert_eq!(&args[6], "0");
        assert_eq!(&args[7], "");
        assert_eq!(&args[8], "");
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let err = payload(json!({ "id": "asset3", "mpin": "", "status": null }))
            .to_args()
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");
        assert_eq!(err.fields(), &["dealerId", "msisdn", "mpin", "balance", "status"]);
    }

    #[test]
    fn test_booleans_are_stringified() {
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!("x")), "x");
    }

    #[test]
    fn test_transfer_requires_both_fields() {
        let ok: TransferRequest =
            serde_json::from_value(json!({ "id": "asset1", "newOwner": "dealerB" })).unwrap();
        assert_eq!(ok.to_args().unwrap(), vec!["asset1", "dealerB"]);

        let missing: TransferRequest = serde_json::from_value(json!({ "id": "asset1" })).unwrap();
        assert_eq!(missing.validate().unwrap_err().fields(), &["newOwner"]);
    }
}
