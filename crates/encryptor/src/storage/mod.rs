//! Storage record format, backing stores, and the encrypting adapter.
//!
//! # Record format
//!
//! Every object is persisted as a JSON [`StorageObject`](common::StorageObject):
//!
//! ```text
//! {"size":<plaintext bytes>,"mime":"<type>","contents":"<base64>","encrypted":<bool>}
//! ```
//!
//! When `encrypted` is true, `contents` is the base64 of the envelope JSON
//! produced by [`crate::crypto::Encrypter`].
//!
//! # Module invariants
//!
//! - `size` and `mime` are computed from plaintext, never from ciphertext.
//! - Stores move opaque bytes and never see keys or plaintext of encrypted
//!   objects.

pub mod adapter;
pub mod local;
pub mod memory;
pub mod mime;
pub mod object;
pub mod store;

pub use adapter::StorageAdapter;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use mime::{ContentTypeDetector, MagicDetector};
pub use store::{ObjectStore, StoreError, Visibility, WriteOptions};
