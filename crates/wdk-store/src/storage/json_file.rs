//! Single-file JSON storage
//!
//! The whole database is one pretty-printed JSON document. Saves write a
//! sibling `<path>.tmp`, flush it to disk, then rename it over `<path>`, so
//! the real file is always either the previous version or the new one.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::DatabaseStorage;
use crate::config::sibling;
use crate::error::{Result, StoreError};
use crate::store::Database;

/// JSON file storage backend
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Transient file written before the rename
    pub fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    /// Write `db` to the temp file and flush it. The real file is untouched.
    pub(crate) async fn stage(&self, db: &Database) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_vec_pretty(db)?;
        let temp_path = self.temp_path();

        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        Ok(temp_path)
    }

    /// Atomically replace the real file with a staged temp file
    pub(crate) async fn commit(&self, temp_path: &Path) -> Result<()> {
        tokio::fs::rename(temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DatabaseStorage for JsonFileStorage {
    async fn load(&self) -> Result<Database> {
        if !tokio::fs::try_exists(&self.path).await? {
            info!("No store at {:?}, creating an empty one", self.path);
            let empty = Database::default();
            self.save(&empty).await?;
            return Ok(empty);
        }

        if tokio::fs::try_exists(self.temp_path()).await.unwrap_or(false) {
            warn!(
                "Ignoring leftover temp file {:?} from an interrupted write",
                self.temp_path()
            );
        }

        let contents = tokio::fs::read(&self.path).await?;
        let db: Database =
            serde_json::from_slice(&contents).map_err(|source| StoreError::CorruptStore {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            "Loaded {} seeds, {} wallets, {} API keys from {:?}",
            db.seeds.len(),
            db.wallets.len(),
            db.api_keys.len(),
            self.path
        );
        Ok(db)
    }

    async fn save(&self, db: &Database) -> Result<()> {
        let temp_path = self.stage(db).await?;
        self.commit(&temp_path).await?;

        debug!("Saved store to {:?}", self.path);
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn backend_name(&self) -> &'static str {
        "JSON file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn db_with_key(name: &str) -> Database {
        let mut api_keys = IndexMap::new();
        api_keys.insert(name.to_string(), "v".to_string());
        Database {
            api_keys,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_creates_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deep").join("dir").join("wdk-data.json");
        let storage = JsonFileStorage::new(&path);

        let db = storage.load().await.unwrap();

        assert_eq!(db, Database::default());
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            serde_json::json!({ "seeds": {}, "wallets": {}, "apiKeys": {} })
        );
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path().join("db.json"));

        storage.save(&db_with_key("etherscan")).await.unwrap();

        let reopened = JsonFileStorage::new(temp_dir.path().join("db.json"));
        assert_eq!(reopened.load().await.unwrap(), db_with_key("etherscan"));
        assert!(!storage.temp_path().exists());
    }

    #[tokio::test]
    async fn test_real_file_untouched_until_rename() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        let storage = JsonFileStorage::new(&path);

        storage.save(&db_with_key("old")).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let staged = storage.stage(&db_with_key("new")).await.unwrap();

        // Crash window: temp written, rename not yet done.
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(storage.load().await.unwrap(), db_with_key("old"));

        storage.commit(&staged).await.unwrap();
        assert_ne!(std::fs::read(&path).unwrap(), before);
        assert_eq!(storage.load().await.unwrap(), db_with_key("new"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        std::fs::write(&path, "{ \"seeds\": {").unwrap();

        let result = JsonFileStorage::new(&path).load().await;

        assert!(matches!(result, Err(StoreError::CorruptStore { .. })));
        // Nothing was overwritten.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"seeds\": {");
    }

    #[tokio::test]
    async fn test_leftover_temp_file_is_not_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        let storage = JsonFileStorage::new(&path);

        storage.save(&db_with_key("real")).await.unwrap();
        std::fs::write(storage.temp_path(), "garbage").unwrap();

        assert_eq!(storage.load().await.unwrap(), db_with_key("real"));
    }
}
