//! AES-CBC encryption with an explicit HMAC-SHA256 envelope.
//!
//! CBC provides no integrity on its own, so every ciphertext travels with a
//! MAC computed over the base64 texts of the IV and ciphertext. The MAC is
//! verified before the ciphertext reaches the block cipher.
//!
//! **Never reuse an IV.** Each call to [`Encrypter::encrypt_string`] draws a
//! fresh 16-byte IV from the OS CSPRNG.

use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::{EncryptorError, EnvelopePayload};
use hmac::{digest::InvalidLength, Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use super::codec::{decode_value, encode_value};
use super::key::{CipherKey, CipherVariant};

type HmacSha256 = Hmac<Sha256>;

/// Byte length of a CBC initialisation vector.
pub const IV_LEN: usize = 16;

/// Byte length of the random key used to blind MACs before comparison.
const BLINDING_KEY_LEN: usize = 16;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The cipher identifier names no supported AES-CBC family.
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// The key does not have the length the configured variant requires.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Encryption or envelope serialisation failed.
    #[error("could not encrypt the data")]
    Encrypt,

    /// The envelope was malformed, failed MAC verification, or did not
    /// decrypt. The specific reason is only logged.
    #[error("could not decrypt the data")]
    Decrypt,
}

impl From<CipherError> for EncryptorError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::UnsupportedCipher(name) => EncryptorError::Config(name),
            CipherError::InvalidKeyLength { expected, actual } => {
                EncryptorError::KeyLength { expected, actual }
            }
            CipherError::Encrypt => EncryptorError::Encrypt,
            CipherError::Decrypt => EncryptorError::Decrypt,
        }
    }
}

/// Internal reason a decryption was rejected. Logged, never returned.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    InvalidPayload,
    InvalidMac,
    InvalidIv,
    Padding,
    Unserialize,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::InvalidPayload => "invalid payload",
            Rejection::InvalidMac => "invalid MAC",
            Rejection::InvalidIv => "invalid IV",
            Rejection::Padding => "bad padding",
            Rejection::Unserialize => "value decoding failed",
        }
    }
}

fn reject(reason: Rejection) -> CipherError {
    debug!(reason = reason.as_str(), "decryption rejected");
    CipherError::Decrypt
}

/// Encrypts and decrypts envelopes under caller-supplied keys.
///
/// The only state is the cipher variant, fixed at construction. Keys are
/// passed per call and never retained.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encrypter {
    variant: CipherVariant,
}

impl Encrypter {
    /// Create an encrypter for `variant`.
    pub fn new(variant: CipherVariant) -> Self {
        Self { variant }
    }

    /// Create an encrypter from a cipher identifier such as `"AES-256-CBC"`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::UnsupportedCipher`] for unrecognised identifiers.
    pub fn from_cipher_name(name: &str) -> Result<Self, CipherError> {
        Ok(Self::new(name.parse()?))
    }

    /// The configured cipher variant.
    pub fn variant(&self) -> CipherVariant {
        self.variant
    }

    /// Returns `true` if `key` has the length the configured variant needs.
    pub fn valid_key(&self, key: &CipherKey) -> bool {
        key.len() == self.variant.key_len()
    }

    /// Serialise `value` with the versioned value codec and encrypt it.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] before any encryption work if
    /// the key is the wrong length, or [`CipherError::Encrypt`] if encoding or
    /// encryption fails.
    pub fn encrypt<T: Serialize + ?Sized>(
        &self,
        key: &CipherKey,
        value: &T,
    ) -> Result<String, CipherError> {
        self.ensure_key(key)?;
        let encoded = encode_value(value).map_err(|_| CipherError::Encrypt)?;
        self.seal(key, &encoded)
    }

    /// Encrypt raw bytes verbatim, returning the envelope JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Encrypter::encrypt`].
    pub fn encrypt_string(&self, key: &CipherKey, value: &[u8]) -> Result<String, CipherError> {
        self.ensure_key(key)?;
        self.seal(key, value)
    }

    /// Decrypt an envelope produced by [`Encrypter::encrypt`] and decode the
    /// structured value inside.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] for a wrong-length key and
    /// [`CipherError::Decrypt`] for every other failure.
    pub fn decrypt<T: DeserializeOwned>(
        &self,
        key: &CipherKey,
        payload: &str,
    ) -> Result<T, CipherError> {
        let plaintext = self.decrypt_string(key, payload)?;
        decode_value(&plaintext).map_err(|_| reject(Rejection::Unserialize))
    }

    /// Decrypt an envelope and return the raw plaintext bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Encrypter::decrypt`].
    pub fn decrypt_string(&self, key: &CipherKey, payload: &str) -> Result<Vec<u8>, CipherError> {
        self.ensure_key(key)?;

        let envelope: EnvelopePayload =
            serde_json::from_str(payload).map_err(|_| reject(Rejection::InvalidPayload))?;

        match valid_mac(key.as_bytes(), &envelope) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(reject(Rejection::InvalidMac)),
        }

        let iv_bytes = STANDARD
            .decode(&envelope.iv)
            .map_err(|_| reject(Rejection::InvalidIv))?;
        let iv: [u8; IV_LEN] = iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| reject(Rejection::InvalidIv))?;
        let ciphertext = STANDARD
            .decode(&envelope.value)
            .map_err(|_| reject(Rejection::InvalidPayload))?;

        cbc_decrypt(self.variant, key.as_bytes(), &iv, &ciphertext)
    }

    fn ensure_key(&self, key: &CipherKey) -> Result<(), CipherError> {
        if self.valid_key(key) {
            Ok(())
        } else {
            Err(CipherError::InvalidKeyLength {
                expected: self.variant.key_len(),
                actual: key.len(),
            })
        }
    }

    fn seal(&self, key: &CipherKey, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = cbc_encrypt(self.variant, key.as_bytes(), &iv, plaintext)?;

        let iv = STANDARD.encode(iv);
        let value = STANDARD.encode(ciphertext);
        let mac = hash(key.as_bytes(), &iv, &value).map_err(|_| CipherError::Encrypt)?;

        serde_json::to_string(&EnvelopePayload { iv, value, mac }).map_err(|_| CipherError::Encrypt)
    }
}

/// Hex HMAC-SHA256 of `iv ‖ value` under `key`.
fn hash(key: &[u8], iv: &str, value: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(iv.as_bytes());
    mac.update(value.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the envelope MAC and compare it to the supplied one.
///
/// Both operands are re-MACed under a fresh random key and the results are
/// compared in constant time.
fn valid_mac(key: &[u8], envelope: &EnvelopePayload) -> Result<bool, InvalidLength> {
    let mut blinding_key = [0u8; BLINDING_KEY_LEN];
    OsRng.fill_bytes(&mut blinding_key);

    let expected = hash(key, &envelope.iv, &envelope.value)?;
    let calculated = blind(&blinding_key, expected.as_bytes())?;
    let supplied = blind(&blinding_key, envelope.mac.as_bytes())?;

    Ok(calculated.as_slice().ct_eq(supplied.as_slice()).into())
}

fn blind(blinding_key: &[u8], data: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(blinding_key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn cbc_encrypt(
    variant: CipherVariant,
    key: &[u8],
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let ciphertext = match variant {
        CipherVariant::Aes128Cbc => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| CipherError::Encrypt)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherVariant::Aes192Cbc => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| CipherError::Encrypt)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherVariant::Aes256Cbc => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| CipherError::Encrypt)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };
    Ok(ciphertext)
}

fn cbc_decrypt(
    variant: CipherVariant,
    key: &[u8],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let plaintext = match variant {
        CipherVariant::Aes128Cbc => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| reject(Rejection::InvalidIv))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        CipherVariant::Aes192Cbc => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| reject(Rejection::InvalidIv))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        CipherVariant::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| reject(Rejection::InvalidIv))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    plaintext.map_err(|_| reject(Rejection::Padding))
}
