//! End-to-end store scenarios through the public API

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use async_trait::async_trait;
use wdk_store::{
    Account, AccountManager, ConfigStore, DerivationBackend, NewSeed, NewWallet,
    ProtectionConfig, StoreConfig, StoreError, TransferReceipt, TransferRequest, WalletTools,
    WalletUpdate,
};

fn config(temp_dir: &TempDir) -> StoreConfig {
    StoreConfig::new(temp_dir.path().join("wdk-data.json"))
}

#[tokio::test]
async fn address_update_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::open(&config(&temp_dir)).await.unwrap();

    store
        .create_seed("s1", NewSeed::new("Main", "").with_mnemonic("m1"))
        .await
        .unwrap();
    store
        .create_wallet(
            "w1",
            NewWallet::new("Eth", "s1", "ethereum").with_addresses(["0xA"]),
        )
        .await
        .unwrap();
    store
        .update_wallet(
            "w1",
            WalletUpdate {
                addresses: Some(vec!["0xA".into(), "0xB".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(store.get_address_index("w1", "0xB").await, Some(1));
    assert_eq!(store.get_wallet("w1").await.unwrap().addresses.len(), 2);
}

#[tokio::test]
async fn state_survives_reopen_with_same_key_file() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = ConfigStore::open(&config(&temp_dir)).await.unwrap();
        store
            .create_seed("s1", NewSeed::new("Main", "").with_mnemonic("m1"))
            .await
            .unwrap();
        store
            .create_wallet("w1", NewWallet::new("Eth", "s1", "ethereum"))
            .await
            .unwrap();
        store.set_api_key("alchemy", "alchemy-secret-key").await.unwrap();
    }

    let raw = std::fs::read_to_string(temp_dir.path().join("wdk-data.json")).unwrap();
    assert!(!raw.contains("\"m1\""));
    assert!(!raw.contains("alchemy-secret-key"));

    let store = ConfigStore::open(&config(&temp_dir)).await.unwrap();
    let seed = store.get_seed("s1").await.unwrap().unwrap();
    assert_eq!(seed.mnemonic.as_deref(), Some("m1"));
    assert_eq!(seed.wallets.iter().collect::<Vec<_>>(), vec!["w1"]);
    assert_eq!(
        store.get_api_key("alchemy").await.unwrap().unwrap(),
        "alchemy-secret-key"
    );
    assert!(store.check_integrity().await.is_empty());
}

#[tokio::test]
async fn other_installation_key_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::open(&config(&temp_dir)).await.unwrap();
    store.set_api_key("alchemy", "alchemy-secret-key").await.unwrap();
    drop(store);

    let foreign = config(&temp_dir).with_protection(ProtectionConfig::KeyFile {
        path: Some(temp_dir.path().join("other.key")),
    });
    let result = ConfigStore::open(&foreign).await;

    assert!(matches!(result, Err(StoreError::InvalidKey)));
}

#[tokio::test]
async fn corrupt_store_is_not_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wdk-data.json");
    std::fs::write(&path, "not json").unwrap();

    let result = ConfigStore::open(&config(&temp_dir)).await;

    assert!(matches!(result, Err(StoreError::CorruptStore { .. })));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
}

struct IndexedBackend;
struct IndexedManager;
struct IndexedAccount(u32);

#[async_trait]
impl DerivationBackend for IndexedBackend {
    fn random_seed_phrase(&self) -> wdk_store::Result<String> {
        Ok("legal winner thank year wave sausage worth useful legal winner thank yellow".into())
    }

    async fn manager(
        &self,
        _mnemonic: &str,
        _kind: &str,
        _provider: Option<&str>,
    ) -> wdk_store::Result<Box<dyn AccountManager>> {
        Ok(Box::new(IndexedManager))
    }
}

#[async_trait]
impl AccountManager for IndexedManager {
    async fn account(&self, index: u32) -> wdk_store::Result<Box<dyn Account>> {
        Ok(Box::new(IndexedAccount(index)))
    }
}

#[async_trait]
impl Account for IndexedAccount {
    async fn address(&self) -> wdk_store::Result<String> {
        Ok(format!("0x{:040x}", self.0))
    }

    async fn balance(&self) -> wdk_store::Result<u128> {
        Ok(0)
    }

    async fn send_transaction(
        &self,
        _request: TransferRequest,
    ) -> wdk_store::Result<TransferReceipt> {
        Err(StoreError::Derivation("offline".into()))
    }
}

#[tokio::test]
async fn tools_drive_the_store_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(ConfigStore::open(&config(&temp_dir)).await.unwrap());
    let tools = WalletTools::new(store.clone(), Arc::new(IndexedBackend));

    let created = tools
        .call(
            "create_seed",
            json!({ "seedId": "main", "name": "Main", "description": "", "chains": ["ethereum"] }),
        )
        .await;
    assert_eq!(created["success"], true);

    let wallet = tools
        .call(
            "create_wallet",
            json!({
                "walletId": "eth", "name": "Eth", "seedRef": "main",
                "type": "ethereum", "addressCount": 2
            }),
        )
        .await;
    assert_eq!(wallet["addresses"][1], format!("0x{:040x}", 1));

    let listed = tools.call("list_wallets", json!({ "seedId": "main" })).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["filterBySeed"], "main");

    let failed = tools
        .call(
            "send_transaction",
            json!({
                "walletId": "eth", "fromAddress": format!("0x{:040x}", 0),
                "toAddress": "0xdead", "amount": 1
            }),
        )
        .await;
    assert_eq!(failed["success"], false);
    assert_eq!(failed["error"], "Derivation backend error: offline");

    tools.call("delete_wallet", json!({ "walletId": "eth" })).await;
    let seed = store.get_seed("main").await.unwrap().unwrap();
    assert!(seed.wallets.is_empty());
    assert!(!store.list_wallets().await.contains_key("eth"));
}
