//! [`ObjectStore`] rooted at a directory on the local filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use super::store::{ObjectStore, StoreError, Visibility, WriteOptions};

/// Unix permission bits applied per visibility.
#[cfg(unix)]
const PUBLIC_FILE_MODE: u32 = 0o644;
#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o600;

/// Files under a root directory, one file per object path.
///
/// Paths are relative and slash-separated; absolute paths and `.`/`..`
/// components are rejected so nothing escapes the root.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    default_visibility: Visibility,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_visibility: Visibility::Private,
        }
    }

    /// Visibility applied when a write does not specify one.
    pub fn with_default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        if path.starts_with('/') || path.starts_with('\\') {
            return Err(StoreError::InvalidPath(path.to_owned()));
        }
        let mut full = self.root.clone();
        let mut components = 0;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if part == "." || part == ".." || part.contains('\\') {
                return Err(StoreError::InvalidPath(path.to_owned()));
            }
            full.push(part);
            components += 1;
        }
        if components == 0 {
            return Err(StoreError::InvalidPath(path.to_owned()));
        }
        Ok(full)
    }

    fn ensure_parent(full: &Path) -> Result<(), StoreError> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn apply_visibility(full: &Path, visibility: Visibility) -> Result<(), StoreError> {
        use std::os::unix::fs::PermissionsExt;

        let mode = match visibility {
            Visibility::Public => PUBLIC_FILE_MODE,
            Visibility::Private => PRIVATE_FILE_MODE,
        };
        fs::set_permissions(full, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_visibility(_full: &Path, _visibility: Visibility) -> Result<(), StoreError> {
        Ok(())
    }
}

fn not_found_or(path: &str, e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(path.to_owned())
    } else {
        StoreError::Io(e)
    }
}

impl ObjectStore for LocalStore {
    fn read(&self, path: &str) -> Result<Bytes, StoreError> {
        let full = self.resolve(path)?;
        fs::read(&full)
            .map(Bytes::from)
            .map_err(|e| not_found_or(path, e))
    }

    fn write(
        &self,
        path: &str,
        contents: &[u8],
        options: &WriteOptions,
    ) -> Result<bool, StoreError> {
        let full = self.resolve(path)?;
        Self::ensure_parent(&full)?;
        fs::write(&full, contents)?;
        let visibility = options.visibility().unwrap_or(self.default_visibility);
        Self::apply_visibility(&full, visibility)?;
        debug!(path, bytes = contents.len(), %visibility, "local object written");
        Ok(true)
    }

    fn delete(&self, path: &str) -> Result<bool, StoreError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.resolve(path)?.is_file())
    }

    fn copy(&self, from: &str, to: &str) -> Result<bool, StoreError> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;
        Self::ensure_parent(&dst)?;
        fs::copy(&src, &dst).map_err(|e| not_found_or(from, e))?;
        Ok(true)
    }

    fn rename(&self, from: &str, to: &str) -> Result<bool, StoreError> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;
        Self::ensure_parent(&dst)?;
        fs::rename(&src, &dst).map_err(|e| not_found_or(from, e))?;
        Ok(true)
    }
}
