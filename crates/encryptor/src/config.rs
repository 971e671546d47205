//! Configuration loading and validation for a locally rooted adapter.
//!
//! Values are read from `ENCRYPTOR_`-prefixed environment variables. Loading
//! fails with a message naming the variable when a value is missing or
//! invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::{CipherVariant, Encrypter};
use crate::storage::{LocalStore, StorageAdapter, Visibility};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "ENCRYPTOR";

/// Validated adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Cipher identifier, e.g. `AES-256-CBC`.
    #[serde(default = "default_cipher")]
    pub cipher: String,

    /// Root directory of the local object store. **Required.**
    pub storage_root: String,

    /// Visibility applied to writes that do not request one.
    #[serde(default = "default_visibility")]
    pub default_visibility: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_cipher() -> String {
    "AES-256-CBC".into()
}
fn default_visibility() -> String {
    "private".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is absent or a value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load(source: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(source)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The configured cipher variant.
    pub fn cipher_variant(&self) -> Result<CipherVariant> {
        self.cipher
            .parse::<CipherVariant>()
            .with_context(|| format!("{ENV_PREFIX}_CIPHER is not a supported cipher: {}", self.cipher))
    }

    /// The configured default visibility.
    pub fn visibility(&self) -> Result<Visibility> {
        Visibility::parse(&self.default_visibility).with_context(|| {
            format!(
                "{ENV_PREFIX}_DEFAULT_VISIBILITY must be \"public\" or \"private\", got {:?}",
                self.default_visibility
            )
        })
    }

    /// Build an adapter over a [`LocalStore`] rooted at `storage_root`.
    pub fn build_adapter(&self) -> Result<StorageAdapter<LocalStore>> {
        let store = LocalStore::new(&self.storage_root).with_default_visibility(self.visibility()?);
        Ok(StorageAdapter::new(store, Encrypter::new(self.cipher_variant()?)))
    }

    fn validate(&self) -> Result<()> {
        if self.storage_root.trim().is_empty() {
            anyhow::bail!("{ENV_PREFIX}_STORAGE_ROOT is required and must not be empty");
        }
        self.cipher_variant()?;
        self.visibility()?;
        Ok(())
    }
}
