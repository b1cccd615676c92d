//! In-memory transport returning scripted responses.
//!
//! # Responsibilities
//! - Stand in for the gateway peer in tests and offline runs
//! - Replay queued outcomes per RPC: a contract payload, a gRPC status, or a
//!   commit validation code, each optionally after a delay
//! - Record every call so tests can assert what reached the ledger
//!
//! # Design Decisions
//! - Endorse builds a real prepared transaction from the incoming proposal so
//!   the gateway's envelope parsing and signing run unchanged
//! - An empty queue answers `UNAVAILABLE`, like a peer that went away
//! - Delays are honoured with `tokio::time::sleep`, so a gateway deadline
//!   shorter than the delay expires first

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tonic::Status;

use crate::fabric::proposal::{inspect_proposal, prepared_transaction};
use crate::fabric::proto::{
    CommitStatusResponse, EndorseRequest, EndorseResponse, EvaluateRequest, EvaluateResponse,
    Response, SignedCommitStatusRequest, SubmitRequest, SubmitResponse, TX_VALIDATION_VALID,
};
use crate::fabric::transport::LedgerTransport;
use crate::fabric::types::Phase;

struct Step<T> {
    delay: Duration,
    outcome: Result<T, Status>,
}

type Queue<T> = Mutex<VecDeque<Step<T>>>;

/// One RPC observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub phase: Phase,
    pub transaction_id: String,
    /// Contract function, for calls that carry a proposal.
    pub function_name: Option<String>,
    pub arguments: Vec<String>,
}

/// A `LedgerTransport` driven by queued outcomes.
#[derive(Default)]
pub struct ScriptedTransport {
    evaluate: Queue<Vec<u8>>,
    endorse: Queue<Vec<u8>>,
    submit: Queue<()>,
    commit: Queue<(i32, u64)>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn push<T>(queue: &Queue<T>, delay: Duration, outcome: Result<T, Status>) {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push_back(Step { delay, outcome });
}

async fn pop<T>(queue: &Queue<T>, phase: Phase) -> Result<T, Status> {
    let step = queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front();
    match step {
        Some(step) => {
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            step.outcome
        }
        None => Err(Status::unavailable(format!(
            "no scripted response for {}",
            phase
        ))),
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful evaluation returning `payload`.
    pub fn evaluate_ok(&self, payload: impl Into<Vec<u8>>) -> &Self {
        push(&self.evaluate, Duration::ZERO, Ok(payload.into()));
        self
    }

    /// Queue an evaluation that answers only after `delay`.
    pub fn evaluate_delayed(&self, delay: Duration, payload: impl Into<Vec<u8>>) -> &Self {
        push(&self.evaluate, delay, Ok(payload.into()));
        self
    }

    pub fn evaluate_err(&self, status: Status) -> &Self {
        push(&self.evaluate, Duration::ZERO, Err(status));
        self
    }

    /// Queue an endorsement whose contract response carries `payload`.
    pub fn endorse_ok(&self, payload: impl Into<Vec<u8>>) -> &Self {
        push(&self.endorse, Duration::ZERO, Ok(payload.into()));
        self
    }

    pub fn endorse_delayed(&self, delay: Duration, payload: impl Into<Vec<u8>>) -> &Self {
        push(&self.endorse, delay, Ok(payload.into()));
        self
    }

    pub fn endorse_err(&self, status: Status) -> &Self {
        push(&self.endorse, Duration::ZERO, Err(status));
        self
    }

    pub fn submit_ok(&self) -> &Self {
        push(&self.submit, Duration::ZERO, Ok(()));
        self
    }

    pub fn submit_delayed(&self, delay: Duration) -> &Self {
        push(&self.submit, delay, Ok(()));
        self
    }

    pub fn submit_err(&self, status: Status) -> &Self {
        push(&self.submit, Duration::ZERO, Err(status));
        self
    }

    /// Queue a valid commit in `block_number`.
    pub fn commit_ok(&self, block_number: u64) -> &Self {
        push(
            &self.commit,
            Duration::ZERO,
            Ok((TX_VALIDATION_VALID, block_number)),
        );
        self
    }

    /// Queue a commit invalidated with validation `code`.
    pub fn commit_invalid(&self, code: i32, block_number: u64) -> &Self {
        push(&self.commit, Duration::ZERO, Ok((code, block_number)));
        self
    }

    pub fn commit_delayed(&self, delay: Duration, block_number: u64) -> &Self {
        push(&self.commit, delay, Ok((TX_VALIDATION_VALID, block_number)));
        self
    }

    pub fn commit_err(&self, status: Status) -> &Self {
        push(&self.commit, Duration::ZERO, Err(status));
        self
    }

    /// Queue the three successful RPCs of a submit.
    pub fn submit_flow(&self, payload: impl Into<Vec<u8>>, block_number: u64) -> &Self {
        self.endorse_ok(payload).submit_ok().commit_ok(block_number)
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of calls received for `phase`.
    pub fn count(&self, phase: Phase) -> usize {
        self.calls().iter().filter(|c| c.phase == phase).count()
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    fn record_proposal(
        &self,
        phase: Phase,
        transaction_id: &str,
        proposal: Option<&crate::fabric::proto::SignedProposal>,
    ) {
        let view = proposal.and_then(|p| inspect_proposal(p).ok());
        self.record(RecordedCall {
            phase,
            transaction_id: transaction_id.to_string(),
            function_name: view.as_ref().map(|v| v.function_name.clone()),
            arguments: view.map(|v| v.arguments).unwrap_or_default(),
        });
    }
}

fn ok_response(payload: Vec<u8>) -> Response {
    Response {
        status: 200,
        message: String::new(),
        payload,
    }
}

#[async_trait]
impl LedgerTransport for ScriptedTransport {
    async fn evaluate(
        &self,
        request: EvaluateRequest,
        _deadline: Duration,
    ) -> Result<EvaluateResponse, Status> {
        self.record_proposal(
            Phase::Evaluate,
            &request.transaction_id,
            request.proposed_transaction.as_ref(),
        );
        let payload = pop(&self.evaluate, Phase::Evaluate).await?;
        Ok(EvaluateResponse {
            result: Some(ok_response(payload)),
        })
    }

    async fn endorse(
        &self,
        request: EndorseRequest,
        _deadline: Duration,
    ) -> Result<EndorseResponse, Status> {
        self.record_proposal(
            Phase::Endorse,
            &request.transaction_id,
            request.proposed_transaction.as_ref(),
        );
        let payload = pop(&self.endorse, Phase::Endorse).await?;
        let proposal = request
            .proposed_transaction
            .ok_or_else(|| Status::invalid_argument("missing proposed transaction"))?;
        let envelope = prepared_transaction(&proposal, ok_response(payload))
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        Ok(EndorseResponse {
            prepared_transaction: Some(envelope),
        })
    }

    async fn submit(
        &self,
        request: SubmitRequest,
        _deadline: Duration,
    ) -> Result<SubmitResponse, Status> {
        self.record(RecordedCall {
            phase: Phase::Submit,
            transaction_id: request.transaction_id.clone(),
            function_name: None,
            arguments: Vec::new(),
        });
        pop(&self.submit, Phase::Submit).await?;
        Ok(SubmitResponse {})
    }

    async fn commit_status(
        &self,
        request: SignedCommitStatusRequest,
        _deadline: Duration,
    ) -> Result<CommitStatusResponse, Status> {
        let transaction_id = <crate::fabric::proto::CommitStatusRequest as prost::Message>::decode(
            request.request.as_slice(),
        )
        .map(|r| r.transaction_id)
        .unwrap_or_default();
        self.record(RecordedCall {
            phase: Phase::CommitStatus,
            transaction_id,
            function_name: None,
            arguments: Vec::new(),
        });
        let (result, block_number) = pop(&self.commit, Phase::CommitStatus).await?;
        Ok(CommitStatusResponse {
            result,
            block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_queue_is_unavailable() {
        let transport = ScriptedTransport::new();
        let err = transport
            .submit(SubmitRequest::default(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unavailable);
        assert_eq!(transport.count(Phase::Submit), 1);
    }

    #[tokio::test]
    async fn test_outcomes_replay_in_order() {
        let transport = ScriptedTransport::new();
        transport
            .evaluate_ok(b"first".to_vec())
            .evaluate_err(Status::not_found("gone"));

        let first = transport
            .evaluate(EvaluateRequest::default(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(first.result.unwrap().payload, b"first");

        let second = transport
            .evaluate(EvaluateRequest::default(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(second.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn test_commit_invalid_carries_code() {
        let transport = ScriptedTransport::new();
        transport.commit_invalid(11, 7);
        let response = transport
            .commit_status(SignedCommitStatusRequest::default(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.result, 11);
        assert_eq!(response.block_number, 7);
    }
}
