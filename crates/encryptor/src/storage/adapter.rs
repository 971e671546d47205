//! [`StorageAdapter`]: transparent per-object encryption over an [`ObjectStore`].

use std::io::Read;
use std::path::Path;

use common::{EncryptorError, StorageObject};
use tracing::{debug, warn};
use uuid::Uuid;

use super::mime::{ContentTypeDetector, MagicDetector};
use super::object;
use super::store::{ObjectStore, StoreError, WriteOptions};
use crate::crypto::{CipherKey, Encrypter};

/// Wraps an [`ObjectStore`], writing every object as a [`StorageObject`]
/// record and encrypting its contents when the caller supplies a key.
///
/// Size and content type are always taken from the plaintext, so
/// [`size`](Self::size) and [`mime_type`](Self::mime_type) never need a key.
#[derive(Debug, Clone)]
pub struct StorageAdapter<S, D = MagicDetector> {
    store: S,
    detector: D,
    encrypter: Encrypter,
}

impl<S: ObjectStore> StorageAdapter<S, MagicDetector> {
    /// Create an adapter using the bundled signature-based content detector.
    pub fn new(store: S, encrypter: Encrypter) -> Self {
        Self::with_detector(store, encrypter, MagicDetector)
    }
}

impl<S: ObjectStore, D: ContentTypeDetector> StorageAdapter<S, D> {
    /// Create an adapter with a caller-provided content-type detector.
    pub fn with_detector(store: S, encrypter: Encrypter, detector: D) -> Self {
        Self {
            store,
            detector,
            encrypter,
        }
    }

    /// The encrypter used for keyed writes and reads.
    pub fn encrypter(&self) -> &Encrypter {
        &self.encrypter
    }

    /// The wrapped store, for operations this adapter does not expose.
    ///
    /// Writes made directly through the store bypass the record format.
    pub fn driver(&self) -> &S {
        &self.store
    }

    /// Write `contents` to `path`, encrypting it when `key` is present.
    ///
    /// Returns the store's success indicator.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptorError::KeyLength`] or [`EncryptorError::Encrypt`]
    /// from the cipher, or [`EncryptorError::Store`] if the write fails.
    pub fn put(
        &self,
        path: &str,
        contents: &[u8],
        key: Option<&CipherKey>,
        options: &WriteOptions,
    ) -> Result<bool, EncryptorError> {
        let mime = self.detector.detect(contents);

        let record = match key {
            Some(key) => {
                let envelope = self.encrypter.encrypt_string(key, contents)?;
                object::build(contents, mime, true, envelope.as_bytes())
            }
            None => object::build(contents, mime, false, contents),
        };

        let written = self
            .store
            .write(path, &object::encode(&record)?, options)
            .map_err(|e| store_failure(path, e))?;

        debug!(
            path,
            size = record.size,
            mime = %record.mime,
            encrypted = record.encrypted,
            written,
            "object stored"
        );
        Ok(written)
    }

    /// Drain `reader` into memory and [`put`](Self::put) the result.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptorError::Store`] if reading fails, otherwise as
    /// [`put`](Self::put).
    pub fn put_reader<R: Read>(
        &self,
        path: &str,
        mut reader: R,
        key: Option<&CipherKey>,
        options: &WriteOptions,
    ) -> Result<bool, EncryptorError> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|e| EncryptorError::Store(format!("failed to read contents: {e}")))?;
        self.put(path, &buffer, key, options)
    }

    /// Store `contents` under `prefix` with a fresh UUIDv4 name and `ext`.
    ///
    /// Returns the generated path, or `None` if the store reported failure.
    pub fn put_auto(
        &self,
        prefix: &str,
        ext: &str,
        contents: &[u8],
        key: Option<&CipherKey>,
        options: &WriteOptions,
    ) -> Result<Option<String>, EncryptorError> {
        let path = join_path(prefix, &unique_name(ext));
        Ok(self.put(&path, contents, key, options)?.then_some(path))
    }

    /// Store a local file under `path` with a generated name that keeps the
    /// file's extension.
    pub fn put_file(
        &self,
        path: &str,
        file: impl AsRef<Path>,
        key: Option<&CipherKey>,
        options: &WriteOptions,
    ) -> Result<Option<String>, EncryptorError> {
        let file = file.as_ref();
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.put_file_as(path, file, &unique_name(ext), key, options)
    }

    /// Store a local file as `path/name`.
    ///
    /// Returns the joined path, or `None` if the store reported failure.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptorError::NotFound`] if `file` does not exist, otherwise
    /// as [`put`](Self::put).
    pub fn put_file_as(
        &self,
        path: &str,
        file: impl AsRef<Path>,
        name: &str,
        key: Option<&CipherKey>,
        options: &WriteOptions,
    ) -> Result<Option<String>, EncryptorError> {
        let file = file.as_ref();
        let contents = std::fs::read(file).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EncryptorError::NotFound(file.display().to_string()),
            _ => EncryptorError::Store(format!("failed to read {}: {e}", file.display())),
        })?;

        let target = join_path(path, name);
        Ok(self.put(&target, &contents, key, options)?.then_some(target))
    }

    /// Read and, when the record is encrypted, decrypt the object at `path`.
    ///
    /// # Errors
    ///
    /// - [`EncryptorError::NotFound`] if nothing is stored at `path`.
    /// - [`EncryptorError::Format`] if the record is malformed.
    /// - [`EncryptorError::MissingKey`] if the object is encrypted and `key` is `None`.
    /// - [`EncryptorError::Decrypt`] if the envelope does not verify or decrypt.
    pub fn get(&self, path: &str, key: Option<&CipherKey>) -> Result<Vec<u8>, EncryptorError> {
        let record = self.read_object(path)?;
        let contents = object::decode_contents(&record)?;

        if !record.encrypted {
            debug!(path, size = record.size, "plain object read");
            return Ok(contents);
        }

        let key = key.ok_or_else(|| EncryptorError::MissingKey(path.to_owned()))?;
        let envelope = std::str::from_utf8(&contents).map_err(|_| {
            debug!(path, "encrypted contents are not an envelope");
            EncryptorError::Decrypt
        })?;
        let plaintext = self.encrypter.decrypt_string(key, envelope)?;
        debug!(path, size = record.size, "encrypted object read");
        Ok(plaintext)
    }

    /// `data:<mime>;base64,<contents>` for the object at `path`.
    ///
    /// Nothing is decrypted: for encrypted objects the URI carries the
    /// base64 envelope, not the plaintext.
    pub fn base64(&self, path: &str) -> Result<String, EncryptorError> {
        let record = self.read_object(path)?;
        if record.encrypted {
            debug!(path, "data URI exposes envelope, not plaintext");
        }
        Ok(object::data_uri(&record))
    }

    /// Always fails: in-place edits would invalidate the whole-object MAC.
    pub fn prepend(&self, path: &str, _data: &[u8]) -> Result<(), EncryptorError> {
        Err(unsupported("prepend", path))
    }

    /// Always fails: in-place edits would invalidate the whole-object MAC.
    pub fn append(&self, path: &str, _data: &[u8]) -> Result<(), EncryptorError> {
        Err(unsupported("append", path))
    }

    /// Plaintext size recorded for the object at `path`. Needs no key.
    pub fn size(&self, path: &str) -> Result<u64, EncryptorError> {
        Ok(self.read_object(path)?.size)
    }

    /// Content type recorded for the object at `path`. Needs no key.
    pub fn mime_type(&self, path: &str) -> Result<String, EncryptorError> {
        Ok(self.read_object(path)?.mime)
    }

    pub fn exists(&self, path: &str) -> Result<bool, EncryptorError> {
        self.store.exists(path).map_err(|e| store_failure(path, e))
    }

    pub fn delete(&self, path: &str) -> Result<bool, EncryptorError> {
        self.store.delete(path).map_err(|e| store_failure(path, e))
    }

    /// Copy a record unchanged. The envelope does not bind the path, so an
    /// encrypted copy decrypts with the same key.
    pub fn copy(&self, from: &str, to: &str) -> Result<bool, EncryptorError> {
        self.store.copy(from, to).map_err(|e| store_failure(from, e))
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<bool, EncryptorError> {
        self.store.rename(from, to).map_err(|e| store_failure(from, e))
    }

    fn read_object(&self, path: &str) -> Result<StorageObject, EncryptorError> {
        let stored = self.store.read(path).map_err(|e| store_failure(path, e))?;
        object::parse(&stored)
    }
}

fn store_failure(path: &str, e: StoreError) -> EncryptorError {
    if !matches!(e, StoreError::NotFound(_)) {
        warn!(path, error = %e, "object store operation failed");
    }
    e.into()
}

fn unsupported(op: &str, path: &str) -> EncryptorError {
    warn!(op, path, "rejected in-place mutation of stored object");
    EncryptorError::UnsupportedOperation(format!("{op} cannot operate on encrypted data"))
}

fn unique_name(ext: &str) -> String {
    let id = Uuid::new_v4();
    if ext.is_empty() {
        id.to_string()
    } else {
        format!("{id}.{ext}")
    }
}

/// Join path segments, dropping empty segments so `"a/"` + `"/b"` is `"a/b"`.
fn join_path(prefix: &str, name: &str) -> String {
    prefix
        .split('/')
        .chain(name.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CipherVariant;
    use crate::storage::memory::MemoryStore;
    use crate::storage::mime::MockContentTypeDetector;
    use crate::storage::store::{MockObjectStore, Visibility};
    use bytes::Bytes;

    fn zero_key() -> CipherKey {
        CipherKey::from([0u8; 32])
    }

    fn adapter() -> StorageAdapter<MemoryStore> {
        StorageAdapter::new(MemoryStore::new(), Encrypter::new(CipherVariant::Aes256Cbc))
    }

    fn stored_record(adapter: &StorageAdapter<MemoryStore>, path: &str) -> StorageObject {
        object::parse(&adapter.driver().read(path).unwrap()).unwrap()
    }

    #[test]
    fn encrypted_put_then_get() {
        let adapter = adapter();
        let key = zero_key();
        assert!(adapter.put("docs", b"hello world", Some(&key), &WriteOptions::new()).unwrap());
        assert_eq!(adapter.get("docs", Some(&key)).unwrap(), b"hello world");
        assert_eq!(adapter.size("docs").unwrap(), 11);
    }

    #[test]
    fn plain_put_then_get_without_key() {
        let adapter = adapter();
        adapter.put("docs", b"hello", None, &WriteOptions::new()).unwrap();
        let record = stored_record(&adapter, "docs");
        assert!(!record.encrypted);
        assert_eq!(record.contents, "aGVsbG8=");
        assert_eq!(adapter.get("docs", None).unwrap(), b"hello");
    }

    #[test]
    fn encrypted_record_hides_plaintext() {
        let adapter = adapter();
        let key = zero_key();
        adapter.put("docs", b"hello world", Some(&key), &WriteOptions::new()).unwrap();
        let record = stored_record(&adapter, "docs");
        assert!(record.encrypted);
        let envelope = object::decode_contents(&record).unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&envelope).unwrap();
        assert!(envelope.get("iv").is_some());
        assert!(envelope.get("value").is_some());
        assert!(envelope.get("mac").is_some());
        let raw = adapter.driver().read("docs").unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("hello world"));
    }

    #[test]
    fn metadata_describes_plaintext_without_key() {
        let adapter = adapter();
        let key = zero_key();
        let pdf = b"%PDF-1.4\n1 0 obj\n";
        adapter.put("enc.pdf", pdf, Some(&key), &WriteOptions::new()).unwrap();
        adapter.put("plain.pdf", pdf, None, &WriteOptions::new()).unwrap();
        for path in ["enc.pdf", "plain.pdf"] {
            assert_eq!(adapter.size(path).unwrap(), pdf.len() as u64);
            assert_eq!(adapter.mime_type(path).unwrap(), "application/pdf");
        }
    }

    #[test]
    fn wrong_key_is_decrypt_error() {
        let adapter = adapter();
        adapter.put("docs", b"secret", Some(&zero_key()), &WriteOptions::new()).unwrap();
        let other = CipherKey::from([1u8; 32]);
        assert!(matches!(adapter.get("docs", Some(&other)), Err(EncryptorError::Decrypt)));
    }

    #[test]
    fn encrypted_get_without_key_fails() {
        let adapter = adapter();
        adapter.put("docs", b"secret", Some(&zero_key()), &WriteOptions::new()).unwrap();
        assert!(matches!(adapter.get("docs", None), Err(EncryptorError::MissingKey(_))));
    }

    #[test]
    fn short_key_rejected_before_write() {
        let adapter = adapter();
        let key = CipherKey::from([0u8; 17]);
        let err = adapter.put("docs", b"x", Some(&key), &WriteOptions::new()).unwrap_err();
        assert!(matches!(err, EncryptorError::KeyLength { expected: 32, actual: 17 }));
        assert!(adapter.driver().is_empty());
    }

    #[test]
    fn missing_object_is_not_found() {
        let adapter = adapter();
        assert!(matches!(adapter.get("nope", None), Err(EncryptorError::NotFound(p)) if p == "nope"));
        assert!(matches!(adapter.size("nope"), Err(EncryptorError::NotFound(_))));
        assert!(matches!(adapter.mime_type("nope"), Err(EncryptorError::NotFound(_))));
        assert!(matches!(adapter.base64("nope"), Err(EncryptorError::NotFound(_))));
    }

    #[test]
    fn malformed_record_is_format_error() {
        let adapter = adapter();
        adapter.driver().insert_raw("raw", "not a record");
        assert!(matches!(adapter.get("raw", None), Err(EncryptorError::Format(_))));
        assert!(matches!(adapter.size("raw"), Err(EncryptorError::Format(_))));
    }

    #[test]
    fn tampered_record_is_decrypt_error() {
        let adapter = adapter();
        let key = zero_key();
        adapter.put("docs", b"integrity", Some(&key), &WriteOptions::new()).unwrap();
        let mut record = stored_record(&adapter, "docs");
        let envelope = object::decode_contents(&record).unwrap();
        let mut envelope: common::EnvelopePayload = serde_json::from_slice(&envelope).unwrap();
        let first = if envelope.value.starts_with('A') { 'B' } else { 'A' };
        envelope.value = format!("{first}{}", &envelope.value[1..]);
        record.contents = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            serde_json::to_vec(&envelope).unwrap(),
        );
        adapter.driver().insert_raw("docs", object::encode(&record).unwrap());
        assert!(matches!(adapter.get("docs", Some(&key)), Err(EncryptorError::Decrypt)));
    }

    #[test]
    fn prepend_and_append_always_unsupported() {
        let adapter = adapter();
        adapter.put("plain", b"a", None, &WriteOptions::new()).unwrap();
        adapter.put("enc", b"a", Some(&zero_key()), &WriteOptions::new()).unwrap();
        for path in ["plain", "enc", "missing"] {
            assert!(matches!(
                adapter.prepend(path, b"x"),
                Err(EncryptorError::UnsupportedOperation(_))
            ));
            assert!(matches!(
                adapter.append(path, b"x"),
                Err(EncryptorError::UnsupportedOperation(_))
            ));
        }
        assert_eq!(adapter.get("plain", None).unwrap(), b"a");
    }

    #[test]
    fn base64_returns_data_uri_without_decrypting() {
        let adapter = adapter();
        adapter.put("plain", b"hi", None, &WriteOptions::new()).unwrap();
        assert_eq!(adapter.base64("plain").unwrap(), "data:text/plain;base64,aGk=");

        adapter.put("enc", b"hi", Some(&zero_key()), &WriteOptions::new()).unwrap();
        let uri = adapter.base64("enc").unwrap();
        let record = stored_record(&adapter, "enc");
        assert_eq!(uri, format!("data:text/plain;base64,{}", record.contents));
    }

    #[test]
    fn put_auto_generates_uuid_path() {
        let adapter = adapter();
        let path = adapter
            .put_auto("uploads/", "pdf", b"%PDF-1.4", None, &WriteOptions::new())
            .unwrap()
            .unwrap();
        let name = path.strip_prefix("uploads/").unwrap();
        let stem = name.strip_suffix(".pdf").unwrap();
        assert!(Uuid::parse_str(stem).is_ok());
        assert_eq!(stem.len(), 36);
        assert_eq!(adapter.get(&path, None).unwrap(), b"%PDF-1.4");

        let again = adapter
            .put_auto("uploads", "pdf", b"%PDF-1.4", None, &WriteOptions::new())
            .unwrap()
            .unwrap();
        assert_ne!(path, again);
    }

    #[test]
    fn put_reader_drains_stream() {
        let adapter = adapter();
        let key = zero_key();
        let reader = std::io::Cursor::new(b"streamed contents".to_vec());
        adapter.put_reader("s", reader, Some(&key), &WriteOptions::new()).unwrap();
        assert_eq!(adapter.get("s", Some(&key)).unwrap(), b"streamed contents");
        assert_eq!(adapter.size("s").unwrap(), 17);
    }

    #[test]
    fn put_file_as_joins_and_trims() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.txt");
        std::fs::write(&file, b"quarterly").unwrap();

        let adapter = adapter();
        let key = zero_key();
        let path = adapter
            .put_file_as("/reports/", &file, "q1.txt", Some(&key), &WriteOptions::new())
            .unwrap()
            .unwrap();
        assert_eq!(path, "reports/q1.txt");
        assert_eq!(adapter.get("reports/q1.txt", Some(&key)).unwrap(), b"quarterly");
    }

    #[test]
    fn put_file_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scan.pdf");
        std::fs::write(&file, b"%PDF-1.7").unwrap();

        let adapter = adapter();
        let path = adapter
            .put_file("scans", &file, None, &WriteOptions::new())
            .unwrap()
            .unwrap();
        assert!(path.starts_with("scans/"));
        assert!(path.ends_with(".pdf"));
        assert_eq!(adapter.mime_type(&path).unwrap(), "application/pdf");
    }

    #[test]
    fn put_file_missing_source_is_not_found() {
        let adapter = adapter();
        let err = adapter
            .put_file_as("x", "/definitely/not/here.bin", "y", None, &WriteOptions::new())
            .unwrap_err();
        assert!(matches!(err, EncryptorError::NotFound(_)));
    }

    #[test]
    fn copy_rename_delete_forwarded() {
        let adapter = adapter();
        let key = zero_key();
        adapter.put("a", b"moving", Some(&key), &WriteOptions::new()).unwrap();
        assert!(adapter.copy("a", "b").unwrap());
        assert!(adapter.rename("b", "c").unwrap());
        assert!(!adapter.exists("b").unwrap());
        assert_eq!(adapter.get("c", Some(&key)).unwrap(), b"moving");
        assert!(adapter.delete("a").unwrap());
        assert!(!adapter.exists("a").unwrap());
    }

    #[test]
    fn options_pass_through_and_detector_sees_plaintext() {
        let mut store = MockObjectStore::new();
        store
            .expect_write()
            .withf(|path, contents, options| {
                let record = object::parse(contents).unwrap();
                path == "docs"
                    && record.encrypted
                    && record.mime == "application/x-test"
                    && record.size == 6
                    && options.visibility() == Some(Visibility::Public)
                    && options.get("CacheControl") == Some("no-cache")
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let mut detector = MockContentTypeDetector::new();
        detector
            .expect_detect()
            .withf(|bytes| bytes == b"secret")
            .times(1)
            .returning(|_| "application/x-test".to_owned());

        let adapter = StorageAdapter::with_detector(store, Encrypter::default(), detector);
        let options = WriteOptions::from(Visibility::Public).with("CacheControl", "no-cache");
        assert!(adapter.put("docs", b"secret", Some(&zero_key()), &options).unwrap());
    }

    #[test]
    fn store_refusal_yields_none_from_put_auto() {
        let mut store = MockObjectStore::new();
        store.expect_write().returning(|_, _, _| Ok(false));
        let adapter = StorageAdapter::new(store, Encrypter::default());
        assert_eq!(
            adapter
                .put_auto("p", "bin", b"\x00\x01", None, &WriteOptions::new())
                .unwrap(),
            None
        );
    }

    #[test]
    fn backend_failure_is_store_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_read()
            .withf(|path| path == "docs")
            .returning(|_| Err(StoreError::Backend("connection reset".into())));
        let adapter = StorageAdapter::new(store, Encrypter::default());
        assert!(matches!(adapter.get("docs", None), Err(EncryptorError::Store(_))));
    }

    #[test]
    fn metadata_reads_never_decrypt() {
        let record = object::build(b"payload", "text/plain", true, b"not even an envelope");
        let stored = Bytes::from(object::encode(&record).unwrap());
        let mut store = MockObjectStore::new();
        store.expect_read().returning(move |_| Ok(stored.clone()));
        let adapter = StorageAdapter::new(store, Encrypter::default());
        assert_eq!(adapter.size("x").unwrap(), 7);
        assert_eq!(adapter.mime_type("x").unwrap(), "text/plain");
        assert!(matches!(adapter.get("x", Some(&zero_key())), Err(EncryptorError::Decrypt)));
    }

    #[test]
    fn join_path_trims_separators() {
        assert_eq!(join_path("a", "b"), "a/b");
        assert_eq!(join_path("/a/", "/b"), "a/b");
        assert_eq!(join_path("", "b"), "b");
        assert_eq!(join_path("a//c", "b.txt"), "a/c/b.txt");
    }

    #[test]
    fn unique_name_without_extension() {
        let name = unique_name("");
        assert!(Uuid::parse_str(&name).is_ok());
        assert!(!name.contains('.'));
    }
}
