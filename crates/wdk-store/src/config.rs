//! Store configuration
//!
//! A store is fully described by where its database file lives and how its
//! secrets are protected. There is no process-wide default instance.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::crypto::{KeyDerivationParams, SecretString};

/// Default database filename, resolved against the working directory
pub const DEFAULT_STORE_FILE: &str = "wdk-data.json";

/// How secrets are protected at rest
#[derive(Debug, Clone)]
pub enum ProtectionConfig {
    /// AES-256-GCM with a random key kept in a file (default `<store>.key`)
    KeyFile { path: Option<PathBuf> },
    /// AES-256-GCM with a key derived from a passphrase; the salt is kept in
    /// a file (default `<store>.salt`)
    Passphrase {
        passphrase: SecretString,
        salt_path: Option<PathBuf>,
        params: KeyDerivationParams,
    },
    /// Clear text. Only for tests and legacy stores.
    Insecure,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        ProtectionConfig::KeyFile { path: None }
    }
}

/// Configuration for a [`ConfigStore`](crate::ConfigStore)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file
    pub path: PathBuf,
    /// Secret protection strategy
    pub protection: ProtectionConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_FILE)
    }
}

impl StoreConfig {
    /// Config for the database at `path` with the default key-file protection
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protection: ProtectionConfig::default(),
        }
    }

    pub fn with_protection(mut self, protection: ProtectionConfig) -> Self {
        self.protection = protection;
        self
    }

    /// Resolved key file path (only meaningful for [`ProtectionConfig::KeyFile`])
    pub fn key_file_path(&self) -> PathBuf {
        match &self.protection {
            ProtectionConfig::KeyFile { path: Some(path) } => path.clone(),
            _ => sibling(&self.path, "key"),
        }
    }

    /// Resolved salt file path (only meaningful for [`ProtectionConfig::Passphrase`])
    pub fn salt_file_path(&self) -> PathBuf {
        match &self.protection {
            ProtectionConfig::Passphrase {
                salt_path: Some(path),
                ..
            } => path.clone(),
            _ => sibling(&self.path, "salt"),
        }
    }
}

/// `<path>.<suffix>`, keeping any existing extension
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
