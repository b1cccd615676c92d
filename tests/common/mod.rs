//! Shared utilities for integration testing.
//!
//! `MemoryLedger` plays the gateway peer for the asset contract: proposals
//! are executed at endorse time, their writes are staged under the
//! transaction id and only applied when the commit status is requested.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use prost::Message;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tonic::{Code, Status};

use ledger_gateway::config::GatewayConfig;
use ledger_gateway::fabric::credentials::{load_identity, load_private_key};
use ledger_gateway::fabric::proposal::{inspect_proposal, prepared_transaction};
use ledger_gateway::fabric::proto::{
    CommitStatusRequest, CommitStatusResponse, EndorseRequest, EndorseResponse, EvaluateRequest,
    EvaluateResponse, Response as ChaincodeResponse, SignedCommitStatusRequest, SignedProposal,
    SubmitRequest, SubmitResponse,
};
use ledger_gateway::fabric::transport::status_with_details;
use ledger_gateway::fabric::{
    ErrorDetail, Gateway, GatewayOptions, LedgerTransport, Signer,
};
use ledger_gateway::http::{AppState, HttpServer};
use ledger_gateway::resilience::DeadlinePolicy;

const PEER: &str = "peer0.org1.example.com:7051";
const MSP: &str = "Org1MSP";

pub fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Gateway over `transport` using the fixture identity.
pub fn gateway(transport: Arc<dyn LedgerTransport>, deadlines: DeadlinePolicy) -> Arc<Gateway> {
    let identity = load_identity(MSP, &fixtures().join("msp/signcerts")).unwrap();
    let key = load_private_key(&fixtures().join("msp/keystore")).unwrap();
    Arc::new(Gateway::new(
        identity,
        Signer::from_key_bytes(&key).unwrap(),
        transport,
        GatewayOptions {
            channel_name: "mychannel".into(),
            contract_name: "basic".into(),
            deadlines,
        },
    ))
}

/// Fully layered router over `gateway` with default configuration.
pub fn app(gateway: Arc<Gateway>) -> axum::Router {
    HttpServer::build_router(&GatewayConfig::default(), AppState { gateway })
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The nine `CreateAsset` / `UpdateAsset` arguments.
pub fn asset_args(id: &str, dealer: &str, balance: &str) -> Vec<String> {
    [id, dealer, "5551234", "1234", balance, "active", "0", "init", "first"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

enum Write {
    Put(String, Value),
}

#[derive(Default)]
struct LedgerState {
    assets: BTreeMap<String, Value>,
    history: BTreeMap<String, Vec<Value>>,
    endorsed: HashMap<String, Vec<Write>>,
    ordered: HashMap<String, Vec<Write>>,
    block_height: u64,
}

/// Result of running a contract function against a snapshot.
struct Execution {
    payload: Vec<u8>,
    writes: Vec<Write>,
}

fn contract_error(message: String) -> Status {
    status_with_details(
        Code::Aborted,
        "failed to endorse transaction, see attached details for more info",
        &[ErrorDetail {
            address: PEER.into(),
            msp_id: MSP.into(),
            message: format!("chaincode response 500, {}", message),
        }],
    )
}

fn evaluate_error(message: String) -> Status {
    status_with_details(
        Code::Unknown,
        &format!("evaluate call to endorser returned error: chaincode response 500, {}", message),
        &[ErrorDetail {
            address: PEER.into(),
            msp_id: MSP.into(),
            message: format!("chaincode response 500, {}", message),
        }],
    )
}

fn asset_record(args: &[String]) -> Value {
    json!({
        "ID": args[0],
        "DealerID": args[1],
        "MSISDN": args[2],
        "MPIN": args[3],
        "Balance": args[4].parse::<f64>().unwrap_or(0.0),
        "Status": args[5],
        "TransAmount": args[6].parse::<f64>().unwrap_or(0.0),
        "TransType": args[7],
        "Remarks": args[8],
    })
}

/// In-memory asset contract behind the gateway RPCs.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    evaluate_latency: Mutex<Option<Duration>>,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delay every evaluation by `latency`.
    pub fn slow_evaluations(&self, latency: Duration) {
        *self.evaluate_latency.lock().unwrap() = Some(latency);
    }

    pub fn block_height(&self) -> u64 {
        self.state.lock().unwrap().block_height
    }

    pub fn asset(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().assets.get(id).cloned()
    }

    fn execute(&self, proposal: &SignedProposal) -> Result<Execution, String> {
        let view = inspect_proposal(proposal).map_err(|e| e.to_string())?;
        let state = self.state.lock().unwrap();
        let args = &view.arguments;

        match view.function_name.as_str() {
            "InitLedger" => {
                let writes = (1..=3)
                    .map(|n| {
                        let id = format!("asset{}", n);
                        let record = asset_record(&asset_args(&id, "dealer0", "100"));
                        Write::Put(id, record)
                    })
                    .collect();
                Ok(Execution {
                    payload: Vec::new(),
                    writes,
                })
            }
            "CreateAsset" | "UpdateAsset" => {
                if args.len() != 9 {
                    return Err(format!("incorrect number of arguments: {}", args.len()));
                }
                let id = &args[0];
                if view.function_name == "CreateAsset" && state.assets.contains_key(id) {
                    return Err(format!("the asset {} already exists", id));
                }
                if view.function_name == "UpdateAsset" && !state.assets.contains_key(id) {
                    return Err(format!("the asset {} does not exist", id));
                }
                Ok(Execution {
                    payload: Vec::new(),
                    writes: vec![Write::Put(id.clone(), asset_record(args))],
                })
            }
            "TransferAsset" => {
                let (id, new_owner) = (&args[0], &args[1]);
                let mut asset = state
                    .assets
                    .get(id)
                    .cloned()
                    .ok_or_else(|| format!("the asset {} does not exist", id))?;
                let old_owner = asset["DealerID"].as_str().unwrap_or_default().to_string();
                asset["DealerID"] = json!(new_owner);
                Ok(Execution {
                    payload: old_owner.into_bytes(),
                    writes: vec![Write::Put(id.clone(), asset)],
                })
            }
            "ReadAsset" => {
                let id = &args[0];
                let asset = state
                    .assets
                    .get(id)
                    .ok_or_else(|| format!("the asset {} does not exist", id))?;
                Ok(Execution {
                    payload: asset.to_string().into_bytes(),
                    writes: Vec::new(),
                })
            }
            "GetAllAssets" => {
                let all: Vec<&Value> = state.assets.values().collect();
                Ok(Execution {
                    payload: serde_json::to_vec(&all).unwrap(),
                    writes: Vec::new(),
                })
            }
            "GetAssetTransactionHistory" => {
                let id = &args[0];
                if !state.assets.contains_key(id) {
                    return Err(format!("the asset {} does not exist", id));
                }
                let history = state.history.get(id).cloned().unwrap_or_default();
                Ok(Execution {
                    payload: serde_json::to_vec(&history).unwrap(),
                    writes: Vec::new(),
                })
            }
            other => Err(format!("function {} not found", other)),
        }
    }
}

fn ok(payload: Vec<u8>) -> ChaincodeResponse {
    ChaincodeResponse {
        status: 200,
        message: String::new(),
        payload,
    }
}

#[async_trait]
impl LedgerTransport for MemoryLedger {
    async fn evaluate(
        &self,
        request: EvaluateRequest,
        _deadline: Duration,
    ) -> Result<EvaluateResponse, Status> {
        let latency = *self.evaluate_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let proposal = request
            .proposed_transaction
            .ok_or_else(|| Status::invalid_argument("missing proposal"))?;
        let execution = self.execute(&proposal).map_err(evaluate_error)?;
        Ok(EvaluateResponse {
            result: Some(ok(execution.payload)),
        })
    }

    async fn endorse(
        &self,
        request: EndorseRequest,
        _deadline: Duration,
    ) -> Result<EndorseResponse, Status> {
        let proposal = request
            .proposed_transaction
            .ok_or_else(|| Status::invalid_argument("missing proposal"))?;
        let execution = self.execute(&proposal).map_err(contract_error)?;
        let envelope = prepared_transaction(&proposal, ok(execution.payload))
            .map_err(|e| Status::internal(e.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .endorsed
            .insert(request.transaction_id, execution.writes);
        Ok(EndorseResponse {
            prepared_transaction: Some(envelope),
        })
    }

    async fn submit(
        &self,
        request: SubmitRequest,
        _deadline: Duration,
    ) -> Result<SubmitResponse, Status> {
        let mut state = self.state.lock().unwrap();
        let writes = state
            .endorsed
            .remove(&request.transaction_id)
            .ok_or_else(|| Status::failed_precondition("transaction was not endorsed"))?;
        state.ordered.insert(request.transaction_id, writes);
        Ok(SubmitResponse {})
    }

    async fn commit_status(
        &self,
        request: SignedCommitStatusRequest,
        _deadline: Duration,
    ) -> Result<CommitStatusResponse, Status> {
        let inner = CommitStatusRequest::decode(request.request.as_slice())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        let writes = state
            .ordered
            .remove(&inner.transaction_id)
            .ok_or_else(|| Status::not_found("transaction not found"))?;

        state.block_height += 1;
        for write in writes {
            let Write::Put(id, value) = write;
            state
                .history
                .entry(id.clone())
                .or_default()
                .push(json!({ "TxId": inner.transaction_id, "Value": value }));
            state.assets.insert(id, value);
        }
        Ok(CommitStatusResponse {
            result: 0,
            block_number: state.block_height,
        })
    }
}
