//! [`ObjectStore`]: the backing byte store wrapped by the adapter.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use common::EncryptorError;
use thiserror::Error;

/// Option key recognised by the bundled stores for access visibility.
pub const VISIBILITY: &str = "visibility";

/// Errors produced by an object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing is stored at the path.
    #[error("no object at {0}")]
    NotFound(String),

    /// The path cannot be mapped onto the store.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// An underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend-specific failure.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for EncryptorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => EncryptorError::NotFound(path),
            other => EncryptorError::Store(other.to_string()),
        }
    }
}

/// Access visibility requested for a written object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Parse `"public"` / `"private"` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-specific write options, passed through the adapter untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions(BTreeMap<String, String>);

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set the `visibility` option.
    pub fn with_visibility(self, visibility: Visibility) -> Self {
        self.with(VISIBILITY, visibility.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The `visibility` option, if set to a recognised value.
    pub fn visibility(&self) -> Option<Visibility> {
        self.get(VISIBILITY).and_then(Visibility::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Visibility> for WriteOptions {
    fn from(visibility: Visibility) -> Self {
        WriteOptions::new().with_visibility(visibility)
    }
}

/// A durable key-value store addressed by slash-separated paths.
///
/// Implementations only move bytes; they know nothing about encryption or the
/// storage record format. `copy` and `rename` have defaults built on the
/// required methods and may be overridden with native operations.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore: Send + Sync {
    /// Read the bytes stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored at `path`.
    fn read(&self, path: &str) -> Result<Bytes, StoreError>;

    /// Write `contents` to `path`, replacing any existing object.
    ///
    /// Returns the store's success indicator.
    fn write(&self, path: &str, contents: &[u8], options: &WriteOptions)
        -> Result<bool, StoreError>;

    /// Delete the object at `path`. Returns `false` if nothing was there.
    fn delete(&self, path: &str) -> Result<bool, StoreError>;

    /// Returns `true` if an object is stored at `path`.
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Copy the object at `from` to `to`.
    fn copy(&self, from: &str, to: &str) -> Result<bool, StoreError> {
        let contents = self.read(from)?;
        self.write(to, &contents, &WriteOptions::default())
    }

    /// Move the object at `from` to `to`.
    fn rename(&self, from: &str, to: &str) -> Result<bool, StoreError> {
        if !self.copy(from, to)? {
            return Ok(false);
        }
        self.delete(from)
    }
}
