//! API key operations

use tracing::info;

use super::manager::ConfigStore;
use crate::crypto::SecretString;
use crate::error::Result;

impl ConfigStore {
    /// Store `value` under `name`, replacing any previous value
    pub async fn set_api_key(&self, name: &str, value: &str) -> Result<()> {
        let protected = self.protector.protect(value)?;

        self.mutate(|db| {
            db.api_keys.insert(name.to_string(), protected);
            Ok(())
        })
        .await?;

        info!("Stored API key '{}'", name);
        Ok(())
    }

    pub async fn get_api_key(&self, name: &str) -> Result<Option<SecretString>> {
        let data = self.data.read().await;
        data.api_keys
            .get(name)
            .map(|token| self.protector.reveal(token).map(SecretString::new))
            .transpose()
    }

    /// Key names only, in insertion order
    pub async fn list_api_keys(&self) -> Vec<String> {
        self.data.read().await.api_keys.keys().cloned().collect()
    }

    /// No-op if `name` is not stored
    pub async fn delete_api_key(&self, name: &str) -> Result<()> {
        let removed = self
            .mutate(|db| Ok(db.api_keys.shift_remove(name).is_some()))
            .await?;

        if removed {
            info!("Deleted API key '{}'", name);
        }
        Ok(())
    }
}
