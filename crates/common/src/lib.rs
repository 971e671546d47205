//! Wire records and the error taxonomy shared by the encrypted storage crates.

pub mod error;
pub mod protocol;

pub use error::EncryptorError;
pub use protocol::{EnvelopePayload, StorageObject};
