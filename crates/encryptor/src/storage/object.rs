//! Building and parsing the [`StorageObject`] record persisted at the store.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{EncryptorError, StorageObject};

/// Assemble the record for `plaintext`.
///
/// `payload` is what ends up base64-encoded in `contents`: the plaintext
/// itself, or the envelope JSON when `encrypted` is set. `size` always comes
/// from `plaintext`.
pub fn build(plaintext: &[u8], mime: impl Into<String>, encrypted: bool, payload: &[u8]) -> StorageObject {
    StorageObject {
        size: plaintext.len() as u64,
        mime: mime.into(),
        contents: STANDARD.encode(payload),
        encrypted,
    }
}

/// Serialise the record to the bytes handed to the store.
///
/// # Errors
///
/// Returns [`EncryptorError::Format`] if JSON serialisation fails.
pub fn encode(object: &StorageObject) -> Result<Vec<u8>, EncryptorError> {
    serde_json::to_vec(object).map_err(|e| EncryptorError::Format(e.to_string()))
}

/// Parse bytes read from the store back into a record.
///
/// # Errors
///
/// Returns [`EncryptorError::Format`] if the bytes are not a JSON object
/// carrying all four fields with the right types.
pub fn parse(stored: &[u8]) -> Result<StorageObject, EncryptorError> {
    serde_json::from_slice(stored).map_err(|e| EncryptorError::Format(e.to_string()))
}

/// Base64-decode the record's `contents`.
///
/// # Errors
///
/// Returns [`EncryptorError::Format`] if `contents` is not valid base64.
pub fn decode_contents(object: &StorageObject) -> Result<Vec<u8>, EncryptorError> {
    STANDARD
        .decode(&object.contents)
        .map_err(|e| EncryptorError::Format(format!("contents: {e}")))
}

/// Render `data:<mime>;base64,<contents>` without decoding anything.
pub fn data_uri(object: &StorageObject) -> String {
    format!("data:{};base64,{}", object.mime, object.contents)
}
