//! Object storage with transparent per-object encryption.
//!
//! Objects are written through a [`StorageAdapter`] as JSON records carrying
//! the plaintext size and content type next to the contents. When a
//! [`CipherKey`] is supplied the contents are sealed in an AES-CBC envelope
//! authenticated with HMAC-SHA256; without one they are stored as-is.
//!
//! # Layout
//!
//! - [`crypto`]: the envelope cipher, key validation and value codec.
//! - [`storage`]: the record codec, the [`ObjectStore`] seam, bundled stores,
//!   content-type detection and the adapter itself.
//! - [`config`] / [`telemetry`]: environment configuration and logging for
//!   applications that want a ready-made local setup.
//!
//! Everything is synchronous. Keys are passed per call and never retained.

pub mod config;
pub mod crypto;
pub mod storage;
pub mod telemetry;

pub use common::{EncryptorError, EnvelopePayload, StorageObject};
pub use crate::config::Config;
pub use crypto::{validate_key, CipherKey, CipherVariant, Encrypter};
pub use storage::{
    ContentTypeDetector, LocalStore, MagicDetector, MemoryStore, ObjectStore, StorageAdapter,
    StoreError, Visibility, WriteOptions,
};
