//! Proposal construction and prepared-transaction parsing.
//!
//! # Data Flow
//! ```text
//! (function, args)
//!     → ChaincodeInvocationSpec → ChaincodeProposalPayload
//!     → ChannelHeader + SignatureHeader(creator, nonce) → Header
//!     → Proposal ─ sign(sha256) → SignedProposal
//!
//! EndorseResponse.prepared_transaction (Envelope)
//!     → Payload → Transaction → ChaincodeActionPayload
//!     → ProposalResponsePayload → ChaincodeAction.response.payload
//! ```

use prost::Message;
use rand::RngCore;
use std::time::SystemTime;

use crate::fabric::credentials::Identity;
use crate::fabric::proto::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeHeaderExtension,
    ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec, ChaincodeProposalPayload,
    ChaincodeSpec, ChannelHeader, CommitStatusRequest, Envelope, Header, Payload, Proposal,
    ProposalResponsePayload, Response, SignatureHeader, SignedCommitStatusRequest,
    SignedProposal, Transaction, TransactionAction, HEADER_TYPE_ENDORSER_TRANSACTION,
};
use crate::fabric::signer::{digest, Signer};
use crate::fabric::types::{GatewayError, GatewayResult};

const NONCE_LEN: usize = 24;

/// A signed proposal ready to send, with its transaction id.
#[derive(Debug, Clone)]
pub struct SignedInvocation {
    pub transaction_id: String,
    pub proposal: SignedProposal,
}

/// Transaction id: hex(sha256(nonce ‖ creator)).
pub fn transaction_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut buf = Vec::with_capacity(nonce.len() + creator.len());
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(creator);
    hex::encode(digest(&buf))
}

fn new_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Build and sign a chaincode proposal.
pub fn build_proposal(
    identity: &Identity,
    signer: &Signer,
    channel_name: &str,
    contract_name: &str,
    function_name: &str,
    arguments: &[String],
) -> GatewayResult<SignedInvocation> {
    let creator = identity.serialize();
    let nonce = new_nonce();
    let tx_id = transaction_id(&nonce, &creator);

    let chaincode_id = ChaincodeId {
        name: contract_name.to_string(),
        ..Default::default()
    };

    let channel_header = ChannelHeader {
        r#type: HEADER_TYPE_ENDORSER_TRANSACTION,
        timestamp: Some(SystemTime::now().into()),
        channel_id: channel_name.to_string(),
        tx_id: tx_id.clone(),
        extension: ChaincodeHeaderExtension {
            chaincode_id: Some(chaincode_id.clone()),
        }
        .encode_to_vec(),
        ..Default::default()
    };
    let signature_header = SignatureHeader { creator, nonce };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };

    let mut args = Vec::with_capacity(arguments.len() + 1);
    args.push(function_name.as_bytes().to_vec());
    args.extend(arguments.iter().map(|a| a.as_bytes().to_vec()));

    let invocation = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            chaincode_id: Some(chaincode_id),
            input: Some(ChaincodeInput {
                args,
                is_init: false,
            }),
            ..Default::default()
        }),
    };
    let payload = ChaincodeProposalPayload {
        input: invocation.encode_to_vec(),
    };

    let proposal_bytes = Proposal {
        header: header.encode_to_vec(),
        payload: payload.encode_to_vec(),
        extension: Vec::new(),
    }
    .encode_to_vec();
    let signature = signer.sign_message(&proposal_bytes)?;

    Ok(SignedInvocation {
        transaction_id: tx_id,
        proposal: SignedProposal {
            proposal_bytes,
            signature,
        },
    })
}

/// Sign the payload of an endorsed transaction envelope in place.
pub fn sign_envelope(signer: &Signer, envelope: &mut Envelope) -> GatewayResult<()> {
    envelope.signature = signer.sign_message(&envelope.payload)?;
    Ok(())
}

/// Build a signed commit-status request.
pub fn build_commit_status_request(
    identity: &Identity,
    signer: &Signer,
    channel_name: &str,
    transaction_id: &str,
) -> GatewayResult<SignedCommitStatusRequest> {
    let request = CommitStatusRequest {
        transaction_id: transaction_id.to_string(),
        channel_id: channel_name.to_string(),
        identity: identity.serialize(),
    }
    .encode_to_vec();
    let signature = signer.sign_message(&request)?;
    Ok(SignedCommitStatusRequest { request, signature })
}

fn decode<M: Message + Default>(bytes: &[u8], what: &str) -> GatewayResult<M> {
    M::decode(bytes).map_err(|e| GatewayError::Decode(format!("malformed {}: {}", what, e)))
}

/// Extract the contract's full response (status, message, payload).
pub fn transaction_response(envelope: &Envelope) -> GatewayResult<Response> {
    let payload: Payload = decode(&envelope.payload, "payload")?;
    let transaction: Transaction = decode(&payload.data, "transaction")?;
    let action = transaction
        .actions
        .first()
        .ok_or_else(|| GatewayError::Decode("transaction has no actions".to_string()))?;
    let action_payload: ChaincodeActionPayload =
        decode(&action.payload, "chaincode action payload")?;
    let endorsed = action_payload
        .action
        .ok_or_else(|| GatewayError::Decode("missing endorsed action".to_string()))?;
    let response_payload: ProposalResponsePayload =
        decode(&endorsed.proposal_response_payload, "proposal response payload")?;
    let chaincode_action: ChaincodeAction =
        decode(&response_payload.extension, "chaincode action")?;

    Ok(chaincode_action.response.unwrap_or_default())
}

/// Decoded view of a signed proposal, as a peer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalView {
    pub transaction_id: String,
    pub channel_id: String,
    pub contract_name: String,
    pub function_name: String,
    pub arguments: Vec<String>,
    pub creator: Vec<u8>,
}

/// Decode a signed proposal back into its invocation.
pub fn inspect_proposal(signed: &SignedProposal) -> GatewayResult<ProposalView> {
    let proposal: Proposal = decode(&signed.proposal_bytes, "proposal")?;
    let header: Header = decode(&proposal.header, "header")?;
    let channel_header: ChannelHeader = decode(&header.channel_header, "channel header")?;
    let signature_header: SignatureHeader = decode(&header.signature_header, "signature header")?;
    let payload: ChaincodeProposalPayload = decode(&proposal.payload, "proposal payload")?;
    let invocation: ChaincodeInvocationSpec = decode(&payload.input, "invocation spec")?;

    let spec = invocation
        .chaincode_spec
        .ok_or_else(|| GatewayError::Decode("missing chaincode spec".to_string()))?;
    let contract_name = spec.chaincode_id.map(|id| id.name).unwrap_or_default();
    let mut args = spec
        .input
        .map(|input| input.args)
        .unwrap_or_default()
        .into_iter()
        .map(|arg| {
            String::from_utf8(arg)
                .map_err(|_| GatewayError::Decode("argument is not UTF-8".to_string()))
        })
        .collect::<GatewayResult<Vec<String>>>()?
        .into_iter();
    let function_name = args
        .next()
        .ok_or_else(|| GatewayError::Decode("missing function name".to_string()))?;

    Ok(ProposalView {
        transaction_id: channel_header.tx_id,
        channel_id: channel_header.channel_id,
        contract_name,
        function_name,
        arguments: args.collect(),
        creator: signature_header.creator,
    })
}

/// Assemble the prepared transaction a gateway peer returns from `Endorse`.
///
/// The envelope is unsigned; the client signs it before `Submit`.
pub fn prepared_transaction(
    signed: &SignedProposal,
    response: Response,
) -> GatewayResult<Envelope> {
    let proposal: Proposal = decode(&signed.proposal_bytes, "proposal")?;
    let header: Header = decode(&proposal.header, "header")?;

    let chaincode_action = ChaincodeAction {
        response: Some(response),
        ..Default::default()
    };
    let response_payload = ProposalResponsePayload {
        proposal_hash: digest(&signed.proposal_bytes).to_vec(),
        extension: chaincode_action.encode_to_vec(),
    };
    let action_payload = ChaincodeActionPayload {
        chaincode_proposal_payload: proposal.payload,
        action: Some(ChaincodeEndorsedAction {
            proposal_response_payload: response_payload.encode_to_vec(),
            endorsements: Vec::new(),
        }),
    };
    let transaction = Transaction {
        actions: vec![TransactionAction {
            header: header.signature_header.clone(),
            payload: action_payload.encode_to_vec(),
        }],
    };
    let payload = Payload {
        header: Some(header),
        data: transaction.encode_to_vec(),
    };

    Ok(Envelope {
        payload: payload.encode_to_vec(),
        signature: Vec::new(),
    })
}
