//! Error types for wdk-store

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store error types
///
/// Messages never carry a revealed secret or a protected token.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Seed '{seed_id}' is still referenced by wallets: {}", wallets.join(", "))]
    SeedInUse { seed_id: String, wallets: Vec<String> },

    #[error("Store file {path:?} is corrupt and was not loaded: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Protection key does not match the protected values in this store")]
    InvalidKey,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Derivation backend error: {0}")]
    Derivation(String),

    #[error(
        "Addresses of wallet '{wallet_id}' changed during derivation \
         (expected {expected}, found {actual})"
    )]
    AddressesChanged {
        wallet_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Seed '{0}' has no seed phrase")]
    MissingMnemonic(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Entity named in conflict / not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Seed,
    Wallet,
    ApiKey,
    Address,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::Seed => "Seed",
            EntityKind::Wallet => "Wallet",
            EntityKind::ApiKey => "API key",
            EntityKind::Address => "Address",
        })
    }
}

impl StoreError {
    pub(crate) fn already_exists(kind: EntityKind, id: &str) -> Self {
        StoreError::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
