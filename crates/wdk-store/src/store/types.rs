//! Persisted entity types and the inputs to store operations

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root aggregate, read and written as a whole
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub seeds: IndexMap<String, Seed>,
    pub wallets: IndexMap<String, Wallet>,
    /// Key name -> protected value
    pub api_keys: IndexMap<String, String>,
}

impl Database {
    /// Any protected value in the database, used to check the key at open
    pub(crate) fn first_protected_value(&self) -> Option<&str> {
        self.seeds
            .values()
            .find_map(|seed| seed.mnemonic.as_deref())
            .or_else(|| self.api_keys.values().next().map(String::as_str))
    }

    /// Wallet ids whose `seedRef` is `seed_id`, in wallet insertion order
    pub(crate) fn wallets_referencing(&self, seed_id: &str) -> Vec<String> {
        self.wallets
            .iter()
            .filter(|(_, wallet)| wallet.seed_ref == seed_id)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Kind of HD root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    #[default]
    Bip39,
}

/// One HD root (mnemonic) and the wallets derived from it
///
/// Inside the database `mnemonic` holds the protected token; values returned
/// by the store hold the revealed phrase.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SeedKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    /// Wallets whose `seedRef` points here; ordered, no duplicates
    #[serde(default)]
    pub wallets: IndexSet<String>,
    #[serde(rename = "seedphrase", default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seed")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("chains", &self.chains)
            .field("wallets", &self.wallets)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// RPC endpoint for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub rpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// One derivation context under a seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub name: String,
    pub seed_ref: String,
    /// Chain kind, e.g. "ethereum" or "bitcoin"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Position `i` is the address at derivation index `i`
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<IndexMap<String, NetworkConfig>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Derivation index of `address`: its first exact position in `addresses`
    pub fn address_index(&self, address: &str) -> Option<usize> {
        self.addresses.iter().position(|a| a == address)
    }
}

/// Input for [`ConfigStore::create_seed`](crate::ConfigStore::create_seed)
#[derive(Clone, Default)]
pub struct NewSeed {
    pub name: String,
    pub kind: SeedKind,
    pub description: String,
    pub chains: Option<Vec<String>>,
    /// Initial wallet list; reconciled against the wallets that point here
    pub wallets: Vec<String>,
    /// Plaintext phrase, protected before it is stored
    pub mnemonic: Option<String>,
}

impl NewSeed {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_mnemonic(mut self, mnemonic: impl Into<String>) -> Self {
        self.mnemonic = Some(mnemonic.into());
        self
    }

    pub fn with_chains<I, S>(mut self, chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chains = Some(chains.into_iter().map(Into::into).collect());
        self
    }
}

/// Partial seed update. `None` leaves a field untouched.
///
/// `mnemonic: Some(None)` clears the stored phrase. The wallet list is
/// derived from wallet `seedRef`s and cannot be set here.
#[derive(Clone, Default)]
pub struct SeedUpdate {
    pub name: Option<String>,
    pub kind: Option<SeedKind>,
    pub description: Option<String>,
    pub chains: Option<Option<Vec<String>>>,
    pub mnemonic: Option<Option<String>>,
}

/// Input for [`ConfigStore::create_wallet`](crate::ConfigStore::create_wallet)
#[derive(Debug, Clone, Default)]
pub struct NewWallet {
    pub name: String,
    pub seed_ref: String,
    pub kind: String,
    pub description: Option<String>,
    pub derivation_path: Option<String>,
    pub provider: Option<String>,
    pub addresses: Vec<String>,
    pub networks: Option<IndexMap<String, NetworkConfig>>,
}

impl NewWallet {
    pub fn new(
        name: impl Into<String>,
        seed_ref: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            seed_ref: seed_ref.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial wallet update. `None` leaves a field untouched; `Some(None)`
/// clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct WalletUpdate {
    pub name: Option<String>,
    pub seed_ref: Option<String>,
    pub kind: Option<String>,
    pub description: Option<Option<String>>,
    pub derivation_path: Option<Option<String>>,
    pub provider: Option<Option<String>>,
    pub addresses: Option<Vec<String>>,
    pub networks: Option<Option<IndexMap<String, NetworkConfig>>>,
}

/// Counts reported by [`ConfigStore::stats`](crate::ConfigStore::stats)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub seed_count: usize,
    pub wallet_count: usize,
    pub api_key_count: usize,
    pub wallets_by_kind: BTreeMap<String, usize>,
    pub config_path: PathBuf,
    pub protection: &'static str,
}

/// Referential drift between seeds and wallets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Wallet's `seedRef` names a seed that does not exist
    DanglingSeedRef { wallet_id: String, seed_ref: String },
    /// Seed lists a wallet id that does not exist
    MissingWallet { seed_id: String, wallet_id: String },
    /// Seed lists a wallet whose `seedRef` points elsewhere
    ForeignWallet {
        seed_id: String,
        wallet_id: String,
        seed_ref: String,
    },
    /// Wallet points at an existing seed that does not list it
    UnlistedWallet { seed_id: String, wallet_id: String },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::DanglingSeedRef { wallet_id, seed_ref } => {
                write!(f, "wallet '{}' references missing seed '{}'", wallet_id, seed_ref)
            }
            IntegrityIssue::MissingWallet { seed_id, wallet_id } => {
                write!(f, "seed '{}' lists missing wallet '{}'", seed_id, wallet_id)
            }
            IntegrityIssue::ForeignWallet {
                seed_id,
                wallet_id,
                seed_ref,
            } => write!(
                f,
                "seed '{}' lists wallet '{}' which belongs to seed '{}'",
                seed_id, wallet_id, seed_ref
            ),
            IntegrityIssue::UnlistedWallet { seed_id, wallet_id } => {
                write!(f, "wallet '{}' is missing from seed '{}'", wallet_id, seed_id)
            }
        }
    }
}
