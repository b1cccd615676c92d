//! Ledger transaction subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     credentials.rs (cert, key, TLS root from disk)
//!     → signer.rs (P-256 signing capability)
//!     → channel.rs (TLS channel to the gateway peer)
//!     → gateway.rs (session bound to channel + contract)
//!
//! Per request:
//!     gateway.rs
//!     → proposal.rs (build + sign proposal, parse prepared transaction)
//!     → transport.rs (Evaluate / Endorse / Submit / CommitStatus RPCs)
//!     → decoder.rs (result bytes → text or JSON)
//! ```
//!
//! # Design Decisions
//! - One `Gateway` per process, shared read-only behind an `Arc`
//! - The RPC surface is a trait so tests can substitute `ScriptedTransport`
//! - Gateway protocol messages are declared by hand with prost derives

pub mod channel;
pub mod credentials;
pub mod decoder;
pub mod gateway;
pub mod proposal;
pub mod proto;
pub mod scripted;
pub mod signer;
pub mod transport;
pub mod types;

pub use channel::{ChannelOptions, SecureChannel};
pub use credentials::Identity;
pub use decoder::{decode_json, decode_text};
pub use gateway::{CommitReceipt, Gateway, GatewayOptions, SubmitState};
pub use scripted::ScriptedTransport;
pub use signer::Signer;
pub use transport::{GrpcTransport, LedgerTransport};
pub use types::{
    ErrorDetail, Failure, GatewayError, GatewayResult, Phase, TransactionMode, TransactionRequest,
};
