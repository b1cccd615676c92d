//! Transaction gateway: the evaluate and submit protocols.
//!
//! # Responsibilities
//! - Bind identity, signer and transport to one channel and one contract
//! - Evaluate: a single signed proposal answered by one peer
//! - Submit: endorse, order and wait for commit, each phase under its own deadline
//! - Map every failure to the error kind of the phase it happened in
//!
//! # Data Flow
//! ```text
//! submit(function, args)
//!     → Proposing   ─ Endorse (endorse deadline)       ✗ Endorsement  (no effect)
//!     → Endorsed    ─ Submit (submit deadline)          ✗ Submission   (indeterminate)
//!     → Ordered     ─ CommitStatus (commit deadline)    ✗ CommitTimeout / CommitStatus
//!                                                       ✗ CommitFailed (invalidated)
//!     → Committed   → contract payload
//! ```
//!
//! # Design Decisions
//! - The gateway is immutable after construction and shared as `Arc<Gateway>`
//! - No retries: a failed phase ends the transaction
//! - Expired deadlines drop the in-flight RPC; the peer may still finish it

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::{Code, Status};

use crate::config::FabricConfig;
use crate::fabric::channel::{ChannelOptions, SecureChannel};
use crate::fabric::credentials::{self, Identity};
use crate::fabric::proposal::{self, SignedInvocation};
use crate::fabric::proto::{
    tx_validation_code_name, EndorseRequest, Envelope, EvaluateRequest, Response, SubmitRequest,
    TX_VALIDATION_VALID,
};
use crate::fabric::signer::Signer;
use crate::fabric::transport::{failure_from_status, GrpcTransport, LedgerTransport};
use crate::fabric::types::{
    Failure, GatewayError, GatewayResult, Phase, TransactionMode, TransactionRequest,
};
use crate::observability::metrics;
use crate::resilience::{with_deadline, DeadlinePolicy};

/// Contract responses at or above this status are errors.
const CHAINCODE_ERROR_THRESHOLD: i32 = 400;

/// Target of a gateway session.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub channel_name: String,
    pub contract_name: String,
    pub deadlines: DeadlinePolicy,
}

/// Outcome of a committed submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub transaction_id: String,
    pub block_number: u64,
    /// Payload returned by the contract function.
    pub result: Vec<u8>,
}

/// Progress of a submit. A failure in any state ends the transaction with
/// the error of the phase that would have run next (see `GatewayError::phase`).
#[derive(Debug)]
pub enum SubmitState {
    /// Proposal signed, awaiting endorsement.
    Proposing(SignedInvocation),
    /// Endorsed and signed, awaiting ordering.
    Endorsed {
        transaction_id: String,
        envelope: Envelope,
        result: Vec<u8>,
    },
    /// Accepted by the orderer, awaiting commit.
    Ordered {
        transaction_id: String,
        result: Vec<u8>,
    },
    /// Committed as valid.
    Committed(CommitReceipt),
}

impl SubmitState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmitState::Proposing(_) => "proposing",
            SubmitState::Endorsed { .. } => "endorsed",
            SubmitState::Ordered { .. } => "ordered",
            SubmitState::Committed(_) => "committed",
        }
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            SubmitState::Proposing(invocation) => &invocation.transaction_id,
            SubmitState::Endorsed { transaction_id, .. }
            | SubmitState::Ordered { transaction_id, .. } => transaction_id,
            SubmitState::Committed(receipt) => &receipt.transaction_id,
        }
    }

    /// The phase that moves this state forward, `None` once committed.
    pub fn next_phase(&self) -> Option<Phase> {
        match self {
            SubmitState::Proposing(_) => Some(Phase::Endorse),
            SubmitState::Endorsed { .. } => Some(Phase::Submit),
            SubmitState::Ordered { .. } => Some(Phase::CommitStatus),
            SubmitState::Committed(_) => None,
        }
    }
}

/// Why a single RPC did not produce a response.
enum CallError {
    /// The local deadline fired first.
    Expired(Duration),
    /// The peer answered with a non-OK status.
    Rejected(Status),
}

impl CallError {
    fn is_deadline(&self) -> bool {
        match self {
            CallError::Expired(_) => true,
            CallError::Rejected(status) => status.code() == Code::DeadlineExceeded,
        }
    }

    fn into_failure(self, phase: Phase) -> Failure {
        match self {
            CallError::Expired(limit) => Failure::new(
                "DEADLINE_EXCEEDED",
                format!("{} did not complete within {}ms", phase, limit.as_millis()),
            ),
            CallError::Rejected(status) => failure_from_status(&status),
        }
    }
}

async fn call<T, F>(limit: Duration, fut: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, Status>>,
{
    match with_deadline(limit, fut).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(status)) => Err(CallError::Rejected(status)),
        Err(expired) => Err(CallError::Expired(expired.0)),
    }
}

/// A contract-level error carried inside an otherwise successful response.
fn check_response(response: &Response) -> Result<(), Failure> {
    if response.status >= CHAINCODE_ERROR_THRESHOLD {
        return Err(Failure::new(
            "UNKNOWN",
            format!(
                "chaincode response {}, {}",
                response.status, response.message
            ),
        ));
    }
    Ok(())
}

fn outcome<T>(result: &GatewayResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

/// Session bound to one ledger channel and one contract.
pub struct Gateway {
    identity: Identity,
    signer: Signer,
    transport: Arc<dyn LedgerTransport>,
    channel_name: String,
    contract_name: String,
    deadlines: DeadlinePolicy,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("msp_id", &self.identity.msp_id())
            .field("channel_name", &self.channel_name)
            .field("contract_name", &self.contract_name)
            .field("deadlines", &self.deadlines)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Build a gateway over any transport.
    pub fn new(
        identity: Identity,
        signer: Signer,
        transport: Arc<dyn LedgerTransport>,
        options: GatewayOptions,
    ) -> Self {
        Self {
            identity,
            signer,
            transport,
            channel_name: options.channel_name,
            contract_name: options.contract_name,
            deadlines: options.deadlines,
        }
    }

    /// Load credentials from disk, open the TLS channel and bind the session.
    ///
    /// # Errors
    /// `NotFound`, `Io`, `InvalidKey` or `InvalidCertificate` for bad
    /// identity material; `Connection` if the peer cannot be reached.
    pub async fn connect(config: &FabricConfig, deadlines: DeadlinePolicy) -> GatewayResult<Self> {
        let identity = credentials::load_identity(&config.msp_id, &config.cert_directory())?;
        let key = credentials::load_private_key(&config.key_directory())?;
        let signer = Signer::from_key_bytes(&key)?;
        let tls_root_certificate = credentials::load_tls_root(&config.tls_cert())?;

        let channel = SecureChannel::open(ChannelOptions {
            endpoint: config.peer_endpoint.clone(),
            tls_root_certificate,
            host_alias: config.peer_host_alias.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        })
        .await?;

        tracing::info!(
            msp_id = %config.msp_id,
            channel = %config.channel_name,
            contract = %config.chaincode_name,
            "Gateway session bound"
        );

        Ok(Self::new(
            identity,
            signer,
            Arc::new(GrpcTransport::new(&channel)),
            GatewayOptions {
                channel_name: config.channel_name.clone(),
                contract_name: config.chaincode_name.clone(),
                deadlines,
            },
        ))
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn msp_id(&self) -> &str {
        self.identity.msp_id()
    }

    pub fn deadlines(&self) -> &DeadlinePolicy {
        &self.deadlines
    }

    /// Run a transaction in the mode it asks for.
    pub async fn execute(&self, request: &TransactionRequest) -> GatewayResult<Vec<u8>> {
        match request.mode {
            TransactionMode::Evaluate => {
                self.evaluate(&request.function_name, &request.arguments)
                    .await
            }
            TransactionMode::Submit => {
                self.submit(&request.function_name, &request.arguments)
                    .await
            }
        }
    }

    /// Query the ledger through a single peer. Never changes ledger state.
    ///
    /// # Errors
    /// `Timeout` when the evaluate deadline expires, `Evaluation` when the
    /// peer or contract rejects the call.
    pub async fn evaluate(
        &self,
        function_name: &str,
        arguments: &[String],
    ) -> GatewayResult<Vec<u8>> {
        let start = Instant::now();
        let result = self.run_evaluate(function_name, arguments).await;
        metrics::record_phase(Phase::Evaluate.as_str(), outcome(&result), start);
        metrics::record_transaction(
            TransactionMode::Evaluate.as_str(),
            function_name,
            outcome(&result),
            start,
        );
        if let Err(e) = &result {
            tracing::warn!(
                function = %function_name,
                kind = e.kind(),
                error = %e,
                "Evaluate failed"
            );
        }
        result
    }

    async fn run_evaluate(
        &self,
        function_name: &str,
        arguments: &[String],
    ) -> GatewayResult<Vec<u8>> {
        let invocation = self.propose(function_name, arguments)?;
        tracing::debug!(
            transaction_id = %invocation.transaction_id,
            function = %function_name,
            "Evaluating"
        );

        let request = EvaluateRequest {
            transaction_id: invocation.transaction_id,
            channel_id: self.channel_name.clone(),
            proposed_transaction: Some(invocation.proposal),
            target_organizations: Vec::new(),
        };
        let limit = self.deadlines.evaluate;
        let response = match call(limit, self.transport.evaluate(request, limit)).await {
            Ok(response) => response,
            Err(e) if e.is_deadline() => return Err(GatewayError::Timeout(limit)),
            Err(e) => return Err(GatewayError::Evaluation(e.into_failure(Phase::Evaluate))),
        };

        let result = response
            .result
            .ok_or_else(|| GatewayError::Decode("evaluate response has no result".to_string()))?;
        check_response(&result).map_err(GatewayError::Evaluation)?;
        Ok(result.payload)
    }

    /// Endorse, order and commit a transaction, returning the contract payload.
    pub async fn submit(
        &self,
        function_name: &str,
        arguments: &[String],
    ) -> GatewayResult<Vec<u8>> {
        self.submit_with_receipt(function_name, arguments)
            .await
            .map(|receipt| receipt.result)
    }

    /// Like `submit`, also reporting the transaction id and commit block.
    ///
    /// # Errors
    /// `Endorsement` (nothing was sent for ordering), `Submission`,
    /// `CommitTimeout`, `CommitStatus` (outcome indeterminate) or
    /// `CommitFailed` (ordered but invalidated).
    pub async fn submit_with_receipt(
        &self,
        function_name: &str,
        arguments: &[String],
    ) -> GatewayResult<CommitReceipt> {
        let start = Instant::now();
        let result = self.run_submit(function_name, arguments).await;
        metrics::record_transaction(
            TransactionMode::Submit.as_str(),
            function_name,
            outcome(&result),
            start,
        );
        match &result {
            Ok(receipt) => tracing::info!(
                transaction_id = %receipt.transaction_id,
                function = %function_name,
                block_number = receipt.block_number,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Transaction committed"
            ),
            Err(e) => tracing::warn!(
                function = %function_name,
                kind = e.kind(),
                phase = ?e.phase(),
                indeterminate = e.is_indeterminate(),
                error = %e,
                "Submit failed"
            ),
        }
        result
    }

    async fn run_submit(
        &self,
        function_name: &str,
        arguments: &[String],
    ) -> GatewayResult<CommitReceipt> {
        let mut state = SubmitState::Proposing(self.propose(function_name, arguments)?);
        loop {
            let phase = match state.next_phase() {
                Some(phase) => phase,
                None => break,
            };
            tracing::debug!(
                transaction_id = %state.transaction_id(),
                state = state.name(),
                phase = %phase,
                "Advancing submit"
            );
            let start = Instant::now();
            let next = self.advance(state).await;
            metrics::record_phase(phase.as_str(), outcome(&next), start);
            state = next?;
        }

        match state {
            SubmitState::Committed(receipt) => Ok(receipt),
            other => Err(GatewayError::Decode(format!(
                "submit stopped in state {}",
                other.name()
            ))),
        }
    }

    /// Run the phase that follows `state`.
    pub async fn advance(&self, state: SubmitState) -> GatewayResult<SubmitState> {
        match state {
            SubmitState::Proposing(invocation) => self.endorse(invocation).await,
            SubmitState::Endorsed {
                transaction_id,
                envelope,
                result,
            } => self.order(transaction_id, envelope, result).await,
            SubmitState::Ordered {
                transaction_id,
                result,
            } => self.await_commit(transaction_id, result).await,
            committed @ SubmitState::Committed(_) => Ok(committed),
        }
    }

    fn propose(
        &self,
        function_name: &str,
        arguments: &[String],
    ) -> GatewayResult<SignedInvocation> {
        proposal::build_proposal(
            &self.identity,
            &self.signer,
            &self.channel_name,
            &self.contract_name,
            function_name,
            arguments,
        )
    }

    async fn endorse(&self, invocation: SignedInvocation) -> GatewayResult<SubmitState> {
        let transaction_id = invocation.transaction_id;
        let endorsement_error = |failure| GatewayError::Endorsement {
            transaction_id: transaction_id.clone(),
            failure,
        };

        let request = EndorseRequest {
            transaction_id: transaction_id.clone(),
            channel_id: self.channel_name.clone(),
            proposed_transaction: Some(invocation.proposal),
            endorsing_organizations: Vec::new(),
        };
        let limit = self.deadlines.endorse;
        let response = call(limit, self.transport.endorse(request, limit))
            .await
            .map_err(|e| endorsement_error(e.into_failure(Phase::Endorse)))?;

        let mut envelope = response.prepared_transaction.ok_or_else(|| {
            GatewayError::Decode("endorse response has no prepared transaction".to_string())
        })?;
        let contract_response = proposal::transaction_response(&envelope)?;
        check_response(&contract_response).map_err(endorsement_error)?;
        proposal::sign_envelope(&self.signer, &mut envelope)?;

        Ok(SubmitState::Endorsed {
            transaction_id,
            envelope,
            result: contract_response.payload,
        })
    }

    async fn order(
        &self,
        transaction_id: String,
        envelope: Envelope,
        result: Vec<u8>,
    ) -> GatewayResult<SubmitState> {
        let request = SubmitRequest {
            transaction_id: transaction_id.clone(),
            channel_id: self.channel_name.clone(),
            prepared_transaction: Some(envelope),
        };
        let limit = self.deadlines.submit;
        if let Err(e) = call(limit, self.transport.submit(request, limit)).await {
            return Err(GatewayError::Submission {
                transaction_id,
                failure: e.into_failure(Phase::Submit),
            });
        }

        Ok(SubmitState::Ordered {
            transaction_id,
            result,
        })
    }

    async fn await_commit(
        &self,
        transaction_id: String,
        result: Vec<u8>,
    ) -> GatewayResult<SubmitState> {
        let request = proposal::build_commit_status_request(
            &self.identity,
            &self.signer,
            &self.channel_name,
            &transaction_id,
        )?;
        let limit = self.deadlines.commit_status;
        let status = match call(limit, self.transport.commit_status(request, limit)).await {
            Ok(status) => status,
            Err(e) if e.is_deadline() => {
                return Err(GatewayError::CommitTimeout {
                    transaction_id,
                    deadline: limit,
                })
            }
            Err(e) => {
                return Err(GatewayError::CommitStatus {
                    transaction_id,
                    failure: e.into_failure(Phase::CommitStatus),
                })
            }
        };

        if status.result != TX_VALIDATION_VALID {
            return Err(GatewayError::CommitFailed {
                transaction_id,
                code: status.result,
                code_name: tx_validation_code_name(status.result),
                block_number: status.block_number,
            });
        }

        Ok(SubmitState::Committed(CommitReceipt {
            transaction_id,
            block_number: status.block_number,
            result,
        }))
    }
}
