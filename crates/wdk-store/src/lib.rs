//! # wdk-store
//!
//! Durable configuration store for HD wallet tooling:
//! - Seeds (protected mnemonics) and the wallets derived from them
//! - Third-party API keys, protected at rest
//! - AES-256-GCM protection under a per-installation key
//! - Atomic single-file JSON persistence
//! - JSON tool handlers over a pluggable derivation backend

pub mod config;
pub mod crypto;
pub mod derivation;
pub mod error;
pub mod protection;
pub mod storage;
pub mod store;
pub mod tools;

pub use config::{ProtectionConfig, StoreConfig, DEFAULT_STORE_FILE};
pub use crypto::{KeyDerivationParams, MasterKey, SecretString};
pub use derivation::{Account, AccountManager, DerivationBackend, TransferReceipt, TransferRequest};
pub use error::{EntityKind, Result, StoreError};
pub use protection::{build_protector, AeadProtector, PlaintextProtector, Protector};
pub use storage::{DatabaseStorage, JsonFileStorage};
pub use store::{
    ConfigStore, Database, IntegrityIssue, NetworkConfig, NewSeed, NewWallet, Seed, SeedKind,
    SeedUpdate, StoreStats, Wallet, WalletUpdate,
};
pub use tools::{tool_names, ToolInfo, WalletTools, MAX_ADDRESSES_PER_CALL, TOOLS};
