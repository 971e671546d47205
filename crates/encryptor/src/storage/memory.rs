//! In-process [`ObjectStore`] backed by a hash map.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use super::store::{ObjectStore, StoreError, WriteOptions};

/// Thread-safe in-memory object store.
///
/// Clones share the same underlying map. Write options are accepted and
/// ignored.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Overwrite the raw bytes at `path`, bypassing any record format.
    pub fn insert_raw(&self, path: &str, contents: impl Into<Bytes>) {
        self.inner.write().insert(path.to_owned(), contents.into());
    }
}

impl ObjectStore for MemoryStore {
    fn read(&self, path: &str) -> Result<Bytes, StoreError> {
        self.inner
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_owned()))
    }

    fn write(
        &self,
        path: &str,
        contents: &[u8],
        _options: &WriteOptions,
    ) -> Result<bool, StoreError> {
        self.inner
            .write()
            .insert(path.to_owned(), Bytes::copy_from_slice(contents));
        Ok(true)
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().remove(path).is_some())
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initially_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(matches!(store.read("a"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        assert!(store.write("a/b", b"bytes", &WriteOptions::new()).unwrap());
        assert_eq!(&store.read("a/b").unwrap()[..], b"bytes");
        assert!(store.exists("a/b").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_reports_presence() {
        let store = MemoryStore::new();
        store.insert_raw("x", "1");
        assert!(store.delete("x").unwrap());
        assert!(!store.delete("x").unwrap());
    }

    #[test]
    fn default_copy_and_rename() {
        let store = MemoryStore::new();
        store.insert_raw("src", "payload");
        assert!(store.copy("src", "dst").unwrap());
        assert_eq!(&store.read("dst").unwrap()[..], b"payload");
        assert!(store.rename("dst", "moved").unwrap());
        assert!(!store.exists("dst").unwrap());
        assert_eq!(&store.read("moved").unwrap()[..], b"payload");
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.insert_raw("shared", "v");
        assert!(other.exists("shared").unwrap());
    }
}
