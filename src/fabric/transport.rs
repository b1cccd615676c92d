//! Ledger transport abstraction.
//!
//! # Responsibilities
//! - Define the four gateway RPCs as a capability (`LedgerTransport`)
//! - Implement it over a TLS tonic channel (`GrpcTransport`)
//! - Translate gRPC statuses (with gateway `ErrorDetail`s) into `Failure`s
//!
//! # Design Decisions
//! - Implementations must be safe for concurrent use; the gateway shares one
//!   transport across every in-flight request
//! - The deadline is forwarded as `grpc-timeout`; the gateway enforces it
//!   locally as well, so a transport may ignore it

use async_trait::async_trait;
use prost::Message;
use std::time::Duration;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Code, Status};

use crate::fabric::channel::SecureChannel;
use crate::fabric::proto::{
    self, CommitStatusResponse, EndorseRequest, EndorseResponse, EvaluateRequest,
    EvaluateResponse, RpcStatus, SignedCommitStatusRequest, SubmitRequest, SubmitResponse,
};
use crate::fabric::types::{ErrorDetail, Failure};

const EVALUATE_PATH: &str = "/gateway.Gateway/Evaluate";
const ENDORSE_PATH: &str = "/gateway.Gateway/Endorse";
const SUBMIT_PATH: &str = "/gateway.Gateway/Submit";
const COMMIT_STATUS_PATH: &str = "/gateway.Gateway/CommitStatus";

/// The gateway peer's RPC surface.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn evaluate(
        &self,
        request: EvaluateRequest,
        deadline: Duration,
    ) -> Result<EvaluateResponse, Status>;

    async fn endorse(
        &self,
        request: EndorseRequest,
        deadline: Duration,
    ) -> Result<EndorseResponse, Status>;

    async fn submit(
        &self,
        request: SubmitRequest,
        deadline: Duration,
    ) -> Result<SubmitResponse, Status>;

    async fn commit_status(
        &self,
        request: SignedCommitStatusRequest,
        deadline: Duration,
    ) -> Result<CommitStatusResponse, Status>;
}

/// Transport over the shared TLS channel to the gateway peer.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    channel: Channel,
}

impl GrpcTransport {
    pub fn new(secure: &SecureChannel) -> Self {
        Self {
            channel: secure.channel(),
        }
    }

    async fn unary<Req, Resp>(
        &self,
        request: Req,
        path: &'static str,
        deadline: Duration,
    ) -> Result<Resp, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("ledger channel not ready: {}", e)))?;

        let mut request = tonic::Request::new(request);
        request.set_timeout(deadline);

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl LedgerTransport for GrpcTransport {
    async fn evaluate(
        &self,
        request: EvaluateRequest,
        deadline: Duration,
    ) -> Result<EvaluateResponse, Status> {
        self.unary(request, EVALUATE_PATH, deadline).await
    }

    async fn endorse(
        &self,
        request: EndorseRequest,
        deadline: Duration,
    ) -> Result<EndorseResponse, Status> {
        self.unary(request, ENDORSE_PATH, deadline).await
    }

    async fn submit(
        &self,
        request: SubmitRequest,
        deadline: Duration,
    ) -> Result<SubmitResponse, Status> {
        self.unary(request, SUBMIT_PATH, deadline).await
    }

    async fn commit_status(
        &self,
        request: SignedCommitStatusRequest,
        deadline: Duration,
    ) -> Result<CommitStatusResponse, Status> {
        self.unary(request, COMMIT_STATUS_PATH, deadline).await
    }
}

/// Symbolic gRPC code name, as used in `Failure::code`.
pub fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "CANCELLED",
        Code::Unknown => "UNKNOWN",
        Code::InvalidArgument => "INVALID_ARGUMENT",
        Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
        Code::NotFound => "NOT_FOUND",
        Code::AlreadyExists => "ALREADY_EXISTS",
        Code::PermissionDenied => "PERMISSION_DENIED",
        Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
        Code::FailedPrecondition => "FAILED_PRECONDITION",
        Code::Aborted => "ABORTED",
        Code::OutOfRange => "OUT_OF_RANGE",
        Code::Unimplemented => "UNIMPLEMENTED",
        Code::Internal => "INTERNAL",
        Code::Unavailable => "UNAVAILABLE",
        Code::DataLoss => "DATA_LOSS",
        Code::Unauthenticated => "UNAUTHENTICATED",
    }
}

/// Convert a gRPC status into a structured failure.
///
/// Gateway peers attach one `gateway.ErrorDetail` per failing endorser or
/// orderer in the `grpc-status-details-bin` trailer.
pub fn failure_from_status(status: &Status) -> Failure {
    let mut failure = Failure::new(code_name(status.code()), status.message());

    if status.details().is_empty() {
        return failure;
    }
    match RpcStatus::decode(status.details()) {
        Ok(rpc_status) => {
            failure.details = rpc_status
                .details
                .iter()
                .filter(|any| any.type_url == proto::ERROR_DETAIL_TYPE_URL)
                .filter_map(|any| proto::ErrorDetail::decode(any.value.as_slice()).ok())
                .map(|d| ErrorDetail {
                    address: d.address,
                    msp_id: d.msp_id,
                    message: d.message,
                })
                .collect();
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring undecodable status details");
        }
    }
    failure
}

/// Encode error details the way a gateway peer does; used by in-memory transports.
pub fn status_with_details(code: Code, message: &str, details: &[ErrorDetail]) -> Status {
    let rpc_status = RpcStatus {
        code: code as i32,
        message: message.to_string(),
        details: details
            .iter()
            .map(|d| prost_types::Any {
                type_url: proto::ERROR_DETAIL_TYPE_URL.to_string(),
                value: proto::ErrorDetail {
                    address: d.address.clone(),
                    msp_id: d.msp_id.clone(),
                    message: d.message.clone(),
                }
                .encode_to_vec(),
            })
            .collect(),
    };
    Status::with_details(code, message, rpc_status.encode_to_vec().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_status_has_no_details() {
        let failure = failure_from_status(&Status::unavailable("connection refused"));
        assert_eq!(failure.code, "UNAVAILABLE");
        assert_eq!(failure.message, "connection refused");
        assert!(failure.details.is_empty());
    }

    #[test]
    fn test_error_details_are_decoded() {
        let detail = ErrorDetail {
            address: "peer0.org1.example.com:7051".into(),
            msp_id: "Org1MSP".into(),
            message: "chaincode response 500, the asset asset1 already exists".into(),
        };
        let status = status_with_details(
            Code::Aborted,
            "failed to endorse transaction, see attached details for more info",
            &[detail.clone()],
        );

        let failure = failure_from_status(&status);
        assert_eq!(failure.code, "ABORTED");
        assert_eq!(failure.details, vec![detail]);
    }

    #[test]
    fn test_garbage_details_are_ignored() {
        let details = bytes::Bytes::from_static(&[0xff, 0x01]);
        let status = Status::with_details(Code::Internal, "boom", details);
        let failure = failure_from_status(&status);
        assert_eq!(failure.code, "INTERNAL");
        assert!(failure.details.is_empty());
    }
}
