//! Asset contract surface.
//!
//! # Data Flow
//! ```text
//! HTTP JSON body
//!     → types.rs (AssetPayload / TransferRequest, validation)
//!     → to_args() (ordered string arguments)
//!     → Gateway::submit / Gateway::evaluate with a function name below
//! ```

pub mod types;

pub use types::{stringify, AssetError, AssetPayload, TransferRequest};

/// Seed the ledger with the contract's sample assets.
pub const INIT_LEDGER: &str = "InitLedger";
pub const GET_ALL_ASSETS: &str = "GetAllAssets";
pub const CREATE_ASSET: &str = "CreateAsset";
pub const UPDATE_ASSET: &str = "UpdateAsset";
/// Returns the previous owner as plain text.
pub const TRANSFER_ASSET: &str = "TransferAsset";
pub const READ_ASSET: &str = "ReadAsset";
pub const ASSET_HISTORY: &str = "GetAssetTransactionHistory";
