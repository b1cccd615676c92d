//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listener.rs (bind configured address)
//!     → plain TCP: axum::serve
//!     → tls.rs (optional): axum-server with rustls
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - TLS material is checked at startup; a bad pair is fatal

pub mod listener;
pub mod tls;

pub use listener::{bind, bind_address, ListenerError};
pub use tls::{load_tls_config, TlsError};
