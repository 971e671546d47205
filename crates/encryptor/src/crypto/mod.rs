//! AES-CBC + HMAC-SHA256 envelope encryption.
//!
//! This module is intentionally free of storage dependencies. It provides the
//! encrypt/decrypt operations used by the storage adapter.
//!
//! # Envelope format
//!
//! ```text
//! {"iv":"<base64(iv)>","value":"<base64(ciphertext)>","mac":"<hex(hmac_sha256(key, iv ‖ value))>"}
//! ```
//!
//! The MAC input is the concatenation of the two base64 texts exactly as they
//! appear in the envelope.

pub mod cipher;
pub mod codec;
pub mod key;

pub use cipher::{CipherError, Encrypter, IV_LEN};
pub use key::{validate_key, CipherKey, CipherVariant};
