//! Caller-facing error taxonomy shared across crates.

use thiserror::Error;

/// Top-level error returned by every storage and cipher operation.
///
/// Each variant is fatal to the single operation that produced it; nothing
/// in this workspace retries or recovers locally.
#[derive(Debug, Error)]
pub enum EncryptorError {
    /// The configured cipher identifier names no supported AES family.
    #[error("unsupported cipher: {0}")]
    Config(String),

    /// The supplied key does not match the configured cipher's key length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    /// The cipher primitive or envelope serialisation failed while encrypting.
    #[error("could not encrypt the data")]
    Encrypt,

    /// The envelope could not be decrypted.
    ///
    /// Malformed payloads, MAC mismatches and padding failures all collapse
    /// into this one variant so callers cannot tell them apart.
    #[error("could not decrypt the data")]
    Decrypt,

    /// The persisted storage record is malformed.
    #[error("malformed storage object: {0}")]
    Format(String),

    /// No object exists at the given path.
    #[error("file not found at path: {0}")]
    NotFound(String),

    /// An encrypted object was read without a key.
    #[error("object at {0} is encrypted and no key was supplied")]
    MissingKey(String),

    /// The operation cannot be performed on this storage model.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The backing store failed for a reason other than a missing object.
    #[error("storage backend failure: {0}")]
    Store(String),
}

impl EncryptorError {
    /// Returns a short machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EncryptorError::Config(_) => "config",
            EncryptorError::KeyLength { .. } => "key_length",
            EncryptorError::Encrypt => "encrypt",
            EncryptorError::Decrypt => "decrypt",
            EncryptorError::Format(_) => "format",
            EncryptorError::NotFound(_) => "not_found",
            EncryptorError::MissingKey(_) => "missing_key",
            EncryptorError::UnsupportedOperation(_) => "unsupported_operation",
            EncryptorError::Store(_) => "store",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(EncryptorError::Config("x".into()).code(), "config");
        assert_eq!(
            EncryptorError::KeyLength {
                expected: 32,
                actual: 17
            }
            .code(),
            "key_length"
        );
        assert_eq!(EncryptorError::Decrypt.code(), "decrypt");
        assert_eq!(EncryptorError::NotFound("a".into()).code(), "not_found");
        assert_eq!(
            EncryptorError::UnsupportedOperation("append".into()).code(),
            "unsupported_operation"
        );
    }

    #[test]
    fn display_includes_message() {
        let e = EncryptorError::KeyLength {
            expected: 32,
            actual: 17,
        };
        let msg = e.to_string();
        assert!(msg.contains("32"));
        assert!(msg.contains("17"));
    }

    #[test]
    fn decrypt_error_carries_no_detail() {
        assert_eq!(EncryptorError::Decrypt.to_string(), "could not decrypt the data");
    }
}
