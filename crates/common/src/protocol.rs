//! Wire records persisted at the backing store.
//!
//! Both records are serialised as JSON. Field names are part of the stored
//! format and must not change.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Authenticated-encryption envelope produced by a single encrypt call.
///
/// ```text
/// {"iv":"<base64 16 bytes>","value":"<base64 ciphertext>","mac":"<hex hmac-sha256>"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopePayload {
    /// Base64 of the 16 random IV bytes.
    pub iv: String,
    /// Base64 of the CBC ciphertext.
    pub value: String,
    /// Lowercase hex HMAC-SHA256 over `iv ‖ value` (the base64 texts).
    pub mac: String,
}

// ---------------------------------------------------------------------------
// Storage object
// ---------------------------------------------------------------------------

/// Record written to the backing store for every object.
///
/// `size` and `mime` always describe the original plaintext so they stay
/// readable without a key. Consumers must check `encrypted` before
/// interpreting `contents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    /// Plaintext length in bytes.
    pub size: u64,
    /// Content type detected on the plaintext.
    pub mime: String,
    /// Base64 of the plaintext, or of the serialised envelope when encrypted.
    pub contents: String,
    /// Whether `contents` holds an envelope.
    pub encrypted: bool,
}
