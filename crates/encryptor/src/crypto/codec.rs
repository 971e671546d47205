//! Versioned encoding for structured values encrypted with
//! [`Encrypter::encrypt`](super::Encrypter::encrypt).
//!
//! ```text
//! [version: u8 = 0x01][bincode 1.x encoding of the value]
//! ```

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Current encoding version byte.
pub const CODEC_VERSION: u8 = 0x01;

/// Errors produced while encoding or decoding a structured value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input held no version byte.
    #[error("empty value encoding")]
    Empty,

    /// The version byte is not one this build understands.
    #[error("unsupported value encoding version {0:#04x}")]
    UnsupportedVersion(u8),

    /// bincode rejected the value or the body.
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Encode `value` as a version byte followed by its bincode body.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(value)?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode bytes produced by [`encode_value`].
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (version, body) = bytes.split_first().ok_or(CodecError::Empty)?;
    if *version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(*version));
    }
    Ok(bincode::deserialize(body)?)
}
