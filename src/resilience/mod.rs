//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger call (evaluate / endorse / submit / commit status):
//!     → timeouts.rs (per-phase deadline from DeadlinePolicy)
//!     → on expiry: future dropped, phase-specific timeout error surfaced
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every ledger call has a deadline
//! - No retries here: a submit is at-most-once, retry belongs to the caller

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded, DeadlinePolicy};
