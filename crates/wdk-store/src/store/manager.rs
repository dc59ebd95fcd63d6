//! Store handle: snapshot, persistence and store-wide utilities

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::types::{Database, IntegrityIssue, StoreStats};
use crate::config::StoreConfig;
use crate::crypto::is_sealed;
use crate::error::{Result, StoreError};
use crate::protection::{build_protector, Protector};
use crate::storage::{DatabaseStorage, JsonFileStorage};

/// Configuration store for seeds, wallets and API keys
///
/// Reads are served from the in-memory snapshot. Each mutation holds the
/// write lock while it applies the change to a copy of the snapshot,
/// persists the copy, and only then swaps it in, so a failed save leaves
/// both the file and the snapshot unchanged.
///
/// There is no cross-process locking: the last process to save wins.
pub struct ConfigStore {
    pub(super) storage: Arc<dyn DatabaseStorage>,
    pub(super) protector: Arc<dyn Protector>,
    pub(super) data: RwLock<Database>,
}

impl ConfigStore {
    /// Open (or create) the store described by `config`
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let protector = build_protector(config).await?;
        let storage = Arc::new(JsonFileStorage::new(&config.path));
        Self::with_parts(storage, protector).await
    }

    /// Open a store over an explicit storage backend and protector
    pub async fn with_parts(
        storage: Arc<dyn DatabaseStorage>,
        protector: Arc<dyn Protector>,
    ) -> Result<Self> {
        let data = storage.load().await?;
        verify_protector(&data, protector.as_ref())?;

        info!(
            "Opened store at {:?} ({}, {} seeds, {} wallets)",
            storage.location(),
            storage.backend_name(),
            data.seeds.len(),
            data.wallets.len()
        );

        Ok(Self {
            storage,
            protector,
            data: RwLock::new(data),
        })
    }

    /// Discard the snapshot and re-read the backing file
    pub async fn reload(&self) -> Result<()> {
        let fresh = self.storage.load().await?;
        verify_protector(&fresh, self.protector.as_ref())?;

        *self.data.write().await = fresh;
        debug!("Reloaded store from {:?}", self.storage.location());
        Ok(())
    }

    /// Backing file path
    pub fn config_path(&self) -> &Path {
        self.storage.location()
    }

    /// Name of the active protection strategy
    pub fn protection(&self) -> &'static str {
        self.protector.name()
    }

    /// Apply `change` to a copy of the snapshot and persist it.
    ///
    /// Nothing is written when the change leaves the database as it was.
    pub(super) async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let mut current = self.data.write().await;
        let mut next = current.clone();

        let output = change(&mut next)?;

        if next != *current {
            self.storage.save(&next).await?;
            *current = next;
        }

        Ok(output)
    }

    /// Entity counts for dashboards and the stats tool
    pub async fn stats(&self) -> StoreStats {
        let data = self.data.read().await;

        let mut wallets_by_kind = BTreeMap::new();
        for wallet in data.wallets.values() {
            *wallets_by_kind.entry(wallet.kind.clone()).or_insert(0) += 1;
        }

        StoreStats {
            seed_count: data.seeds.len(),
            wallet_count: data.wallets.len(),
            api_key_count: data.api_keys.len(),
            wallets_by_kind,
            config_path: self.storage.location().to_path_buf(),
            protection: self.protector.name(),
        }
    }

    /// Report drift between wallet `seedRef`s and seed wallet lists. Nothing is repaired.
    pub async fn check_integrity(&self) -> Vec<IntegrityIssue> {
        let data = self.data.read().await;
        let mut issues = Vec::new();

        for (wallet_id, wallet) in &data.wallets {
            match data.seeds.get(&wallet.seed_ref) {
                None => issues.push(IntegrityIssue::DanglingSeedRef {
                    wallet_id: wallet_id.clone(),
                    seed_ref: wallet.seed_ref.clone(),
                }),
                Some(seed) if !seed.wallets.contains(wallet_id) => {
                    issues.push(IntegrityIssue::UnlistedWallet {
                        seed_id: wallet.seed_ref.clone(),
                        wallet_id: wallet_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        for (seed_id, seed) in &data.seeds {
            for wallet_id in &seed.wallets {
                match data.wallets.get(wallet_id) {
                    None => issues.push(IntegrityIssue::MissingWallet {
                        seed_id: seed_id.clone(),
                        wallet_id: wallet_id.clone(),
                    }),
                    Some(wallet) if wallet.seed_ref != *seed_id => {
                        issues.push(IntegrityIssue::ForeignWallet {
                            seed_id: seed_id.clone(),
                            wallet_id: wallet_id.clone(),
                            seed_ref: wallet.seed_ref.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if !issues.is_empty() {
            warn!("Store has {} integrity issue(s)", issues.len());
        }
        issues
    }

    /// Re-protect every secret under `to` and persist the result atomically
    pub async fn reprotect(&mut self, to: Arc<dyn Protector>) -> Result<()> {
        let current = self.data.get_mut();
        let mut next = current.clone();

        for seed in next.seeds.values_mut() {
            if let Some(token) = seed.mnemonic.take() {
                let plain = Zeroizing::new(self.protector.reveal(&token)?);
                seed.mnemonic = Some(to.protect(&plain)?);
            }
        }
        for value in next.api_keys.values_mut() {
            let plain = Zeroizing::new(self.protector.reveal(value)?);
            *value = to.protect(&plain)?;
        }

        self.storage.save(&next).await?;
        *current = next;

        info!(
            "Re-protected store secrets: {} -> {}",
            self.protector.name(),
            to.name()
        );
        self.protector = to;
        Ok(())
    }
}

/// Refuse to open a store whose secrets the protector cannot reveal
fn verify_protector(data: &Database, protector: &dyn Protector) -> Result<()> {
    let Some(sample) = data.first_protected_value() else {
        return Ok(());
    };

    if !protector.is_secure() && is_sealed(sample) {
        return Err(StoreError::InvalidKey);
    }

    protector
        .reveal(sample)
        .map(drop)
        .map_err(|_| StoreError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MasterKey;
    use crate::protection::{AeadProtector, PlaintextProtector};
    use crate::store::{NewSeed, NewWallet};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Storage that can be told to fail saves
    struct FlakyStorage {
        inner: JsonFileStorage,
        fail: AtomicBool,
    }

    #[async_trait]
    impl DatabaseStorage for FlakyStorage {
        async fn load(&self) -> Result<Database> {
            self.inner.load().await
        }

        async fn save(&self, db: &Database) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only filesystem",
                )));
            }
            self.inner.save(db).await
        }

        fn location(&self) -> &Path {
            self.inner.location()
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    fn aead() -> Arc<dyn Protector> {
        Arc::new(AeadProtector::new(MasterKey::generate()))
    }

    #[tokio::test]
    async fn test_failed_save_keeps_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(FlakyStorage {
            inner: JsonFileStorage::new(temp_dir.path().join("db.json")),
            fail: AtomicBool::new(false),
        });
        let store = ConfigStore::with_parts(storage.clone(), aead()).await.unwrap();

        store.create_seed("s1", NewSeed::new("Main", "")).await.unwrap();

        storage.fail.store(true, Ordering::SeqCst);
        let result = store
            .create_wallet("w1", NewWallet::new("Eth", "s1", "ethereum"))
            .await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.get_wallet("w1").await.is_none());
        assert!(store.get_seed("s1").await.unwrap().unwrap().wallets.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_key_refused_at_open() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(JsonFileStorage::new(temp_dir.path().join("db.json")));

        let store = ConfigStore::with_parts(storage.clone(), aead()).await.unwrap();
        store.set_api_key("etherscan", "k").await.unwrap();
        drop(store);

        let result = ConfigStore::with_parts(storage.clone(), aead()).await;
        assert!(matches!(result, Err(StoreError::InvalidKey)));

        let plaintext: Arc<dyn Protector> = Arc::new(PlaintextProtector::new());
        let result = ConfigStore::with_parts(storage, plaintext).await;
        assert!(matches!(result, Err(StoreError::InvalidKey)));
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_changes() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(JsonFileStorage::new(temp_dir.path().join("db.json")));
        let protector = aead();

        let first = ConfigStore::with_parts(storage.clone(), protector.clone()).await.unwrap();
        let second = ConfigStore::with_parts(storage, protector).await.unwrap();

        second.set_api_key("infura", "abc").await.unwrap();
        assert!(first.list_api_keys().await.is_empty());

        first.reload().await.unwrap();
        assert_eq!(first.list_api_keys().await, vec!["infura".to_string()]);
    }

    #[tokio::test]
    async fn test_reprotect_migrates_plaintext_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        let storage = Arc::new(JsonFileStorage::new(&path));

        let mut store =
            ConfigStore::with_parts(storage.clone(), Arc::new(PlaintextProtector::new()))
                .await
                .unwrap();
        store
            .create_seed("s1", NewSeed::new("Main", "").with_mnemonic("m1"))
            .await
            .unwrap();
        store.set_api_key("etherscan", "secret-key").await.unwrap();

        let target = aead();
        store.reprotect(target.clone()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("secret-key"));
        assert!(!raw.contains("\"m1\""));
        assert_eq!(store.protection(), "aes-256-gcm");

        let reopened = ConfigStore::with_parts(storage, target).await.unwrap();
        let seed = reopened.get_seed("s1").await.unwrap().unwrap();
        assert_eq!(seed.mnemonic.as_deref(), Some("m1"));
        assert_eq!(
            reopened.get_api_key("etherscan").await.unwrap().unwrap().expose(),
            "secret-key"
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(JsonFileStorage::new(temp_dir.path().join("db.json")));
        let store = ConfigStore::with_parts(storage, aead()).await.unwrap();

        store.create_seed("s1", NewSeed::new("Main", "")).await.unwrap();
        for (id, kind) in [("w1", "ethereum"), ("w2", "ethereum"), ("w3", "bitcoin")] {
            store
                .create_wallet(id, NewWallet::new(id, "s1", kind))
                .await
                .unwrap();
        }
        store.set_api_key("k", "v").await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.seed_count, 1);
        assert_eq!(stats.wallet_count, 3);
        assert_eq!(stats.api_key_count, 1);
        assert_eq!(stats.wallets_by_kind["ethereum"], 2);
        assert_eq!(stats.wallets_by_kind["bitcoin"], 1);
        assert_eq!(stats.config_path, temp_dir.path().join("db.json"));
    }

    #[tokio::test]
    async fn test_integrity_report_on_drifted_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "seeds": {
                    "s1": {
                        "name": "Main", "type": "bip39", "description": "",
                        "wallets": ["gone", "w2"],
                        "createdAt": "2025-01-01T00:00:00Z",
                        "updatedAt": "2025-01-01T00:00:00Z"
                    }
                },
                "wallets": {
                    "w1": {
                        "name": "a", "seedRef": "s1", "type": "ethereum", "addresses": [],
                        "createdAt": "2025-01-01T00:00:00Z",
                        "updatedAt": "2025-01-01T00:00:00Z"
                    },
                    "w2": {
                        "name": "b", "seedRef": "s9", "type": "ethereum", "addresses": [],
                        "createdAt": "2025-01-01T00:00:00Z",
                        "updatedAt": "2025-01-01T00:00:00Z"
                    }
                },
                "apiKeys": {}
            })
            .to_string(),
        )
        .unwrap();

        let store = ConfigStore::with_parts(Arc::new(JsonFileStorage::new(&path)), aead())
            .await
            .unwrap();
        let issues = store.check_integrity().await;

        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&IntegrityIssue::UnlistedWallet {
            seed_id: "s1".into(),
            wallet_id: "w1".into()
        }));
        assert!(issues.contains(&IntegrityIssue::DanglingSeedRef {
            wallet_id: "w2".into(),
            seed_ref: "s9".into()
        }));
        assert!(issues.contains(&IntegrityIssue::MissingWallet {
            seed_id: "s1".into(),
            wallet_id: "gone".into()
        }));
        assert!(issues.contains(&IntegrityIssue::ForeignWallet {
            seed_id: "s1".into(),
            wallet_id: "w2".into(),
            seed_ref: "s9".into()
        }));
    }
}
