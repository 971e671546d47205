//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No key material or plaintext** may appear in any log field. Events
//!   carry paths, sizes, content types and flags only.
//! - Log level is configurable via `ENCRYPTOR_LOG_LEVEL` (default: `info`);
//!   `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init;
