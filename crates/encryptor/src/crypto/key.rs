//! Cipher variants and caller-supplied key material.

use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cipher::CipherError;

/// Mode identifiers other than CBC that must not be silently mapped onto CBC.
const FOREIGN_MODES: [&str; 8] = ["GCM", "CTR", "ECB", "CFB", "OFB", "CCM", "XTS", "SIV"];

/// AES key family used by an [`Encrypter`](super::Encrypter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherVariant {
    /// AES-128 in CBC mode (16-byte key).
    Aes128Cbc,
    /// AES-192 in CBC mode (24-byte key).
    Aes192Cbc,
    /// AES-256 in CBC mode (32-byte key).
    Aes256Cbc,
}

impl CipherVariant {
    /// Raw key length in bytes expected by this variant.
    pub fn key_len(self) -> usize {
        match self {
            CipherVariant::Aes128Cbc => 16,
            CipherVariant::Aes192Cbc => 24,
            CipherVariant::Aes256Cbc => 32,
        }
    }

    /// Canonical identifier, e.g. `"AES-256-CBC"`.
    pub fn as_str(self) -> &'static str {
        match self {
            CipherVariant::Aes128Cbc => "AES-128-CBC",
            CipherVariant::Aes192Cbc => "AES-192-CBC",
            CipherVariant::Aes256Cbc => "AES-256-CBC",
        }
    }
}

impl Default for CipherVariant {
    fn default() -> Self {
        CipherVariant::Aes256Cbc
    }
}

impl fmt::Display for CipherVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherVariant {
    type Err = CipherError;

    /// Resolves the family by the first of `128`, `192`, `256` found in the
    /// identifier. Identifiers naming a non-CBC mode are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        if FOREIGN_MODES.iter().any(|mode| upper.contains(mode)) {
            return Err(CipherError::UnsupportedCipher(s.to_owned()));
        }
        if upper.contains("128") {
            Ok(CipherVariant::Aes128Cbc)
        } else if upper.contains("192") {
            Ok(CipherVariant::Aes192Cbc)
        } else if upper.contains("256") {
            Ok(CipherVariant::Aes256Cbc)
        } else {
            Err(CipherError::UnsupportedCipher(s.to_owned()))
        }
    }
}

/// Check whether `key` has the raw length required by the cipher named
/// `cipher`.
///
/// # Errors
///
/// Returns [`CipherError::UnsupportedCipher`] if `cipher` names no supported
/// AES-CBC family.
pub fn validate_key(key: &[u8], cipher: &str) -> Result<bool, CipherError> {
    let variant: CipherVariant = cipher.parse()?;
    Ok(key.len() == variant.key_len())
}

/// Symmetric key supplied by the caller for a single operation.
///
/// The bytes are zeroed when the key is dropped and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey(Vec<u8>);

impl CipherKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for a zero-length key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CipherKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for CipherKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for CipherKey {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.write_str("CipherKey([REDACTED])")
    }
}
