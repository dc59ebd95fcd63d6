//! Seed operations

use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use super::manager::ConfigStore;
use super::types::{Database, NewSeed, Seed, SeedUpdate};
use crate::error::{EntityKind, Result, StoreError};

impl ConfigStore {
    /// Create a seed. Fails with `AlreadyExists` rather than overwriting.
    ///
    /// The stored wallet list keeps the requested ids that point back at this
    /// seed and adopts every other wallet whose `seedRef` already names it.
    pub async fn create_seed(&self, id: &str, new: NewSeed) -> Result<Seed> {
        let protected = new
            .mnemonic
            .as_deref()
            .map(|phrase| self.protector.protect(phrase))
            .transpose()?;

        let mut seed = self
            .mutate(|db| {
                if db.seeds.contains_key(id) {
                    return Err(StoreError::already_exists(EntityKind::Seed, id));
                }

                let now = Utc::now();
                let seed = Seed {
                    name: new.name.clone(),
                    kind: new.kind,
                    description: new.description.clone(),
                    chains: new.chains.clone(),
                    wallets: reconcile_wallets(db, id, &new.wallets),
                    mnemonic: protected,
                    created_at: now,
                    updated_at: now,
                };
                db.seeds.insert(id.to_string(), seed.clone());
                Ok(seed)
            })
            .await?;

        info!("Created seed '{}'", id);
        seed.mnemonic = new.mnemonic;
        Ok(seed)
    }

    /// Seed with its mnemonic revealed, or `None` if no such seed
    pub async fn get_seed(&self, id: &str) -> Result<Option<Seed>> {
        let data = self.data.read().await;
        data.seeds
            .get(id)
            .map(|seed| self.reveal_seed(seed))
            .transpose()
    }

    /// All seeds, mnemonics revealed
    pub async fn list_seeds(&self) -> Result<IndexMap<String, Seed>> {
        let data = self.data.read().await;
        data.seeds
            .iter()
            .map(|(id, seed)| Ok((id.clone(), self.reveal_seed(seed)?)))
            .collect()
    }

    /// Merge `update` into the seed. Silently does nothing if the seed is absent.
    pub async fn update_seed(&self, id: &str, update: SeedUpdate) -> Result<()> {
        let mnemonic = match update.mnemonic {
            Some(Some(phrase)) => Some(Some(self.protector.protect(&phrase)?)),
            Some(None) => Some(None),
            None => None,
        };

        self.mutate(|db| {
            let Some(seed) = db.seeds.get_mut(id) else {
                debug!("update_seed: no seed '{}'", id);
                return Ok(());
            };

            if let Some(name) = update.name {
                seed.name = name;
            }
            if let Some(kind) = update.kind {
                seed.kind = kind;
            }
            if let Some(description) = update.description {
                seed.description = description;
            }
            if let Some(chains) = update.chains {
                seed.chains = chains;
            }
            if let Some(mnemonic) = mnemonic {
                seed.mnemonic = mnemonic;
            }
            seed.updated_at = Utc::now();

            debug!("Updated seed '{}'", id);
            Ok(())
        })
        .await
    }

    /// Delete a seed. Rejected with `SeedInUse` while any wallet's `seedRef`
    /// names it; see [`delete_seed_cascade`](Self::delete_seed_cascade).
    pub async fn delete_seed(&self, id: &str) -> Result<()> {
        self.mutate(|db| {
            if !db.seeds.contains_key(id) {
                return Ok(());
            }

            let wallets = db.wallets_referencing(id);
            if !wallets.is_empty() {
                return Err(StoreError::SeedInUse {
                    seed_id: id.to_string(),
                    wallets,
                });
            }

            db.seeds.shift_remove(id);
            info!("Deleted seed '{}'", id);
            Ok(())
        })
        .await
    }

    /// Delete a seed together with every wallet derived from it.
    /// Returns the removed wallet ids.
    pub async fn delete_seed_cascade(&self, id: &str) -> Result<Vec<String>> {
        self.mutate(|db| {
            if db.seeds.shift_remove(id).is_none() {
                return Ok(Vec::new());
            }

            let wallets = db.wallets_referencing(id);
            for wallet_id in &wallets {
                db.wallets.shift_remove(wallet_id);
            }

            info!("Deleted seed '{}' and {} wallet(s)", id, wallets.len());
            Ok(wallets)
        })
        .await
    }

    fn reveal_seed(&self, seed: &Seed) -> Result<Seed> {
        let mut revealed = seed.clone();
        revealed.mnemonic = seed
            .mnemonic
            .as_deref()
            .map(|token| self.protector.reveal(token))
            .transpose()?;
        Ok(revealed)
    }
}

/// Wallet list for a new seed `id`: requested ids that point back, then the
/// remaining wallets that reference it
fn reconcile_wallets(db: &Database, id: &str, requested: &[String]) -> IndexSet<String> {
    let mut wallets = IndexSet::new();

    for wallet_id in requested {
        if db.wallets.get(wallet_id).is_some_and(|w| w.seed_ref == id) {
            wallets.insert(wallet_id.clone());
        } else {
            debug!(
                "Seed '{}': dropping wallet '{}' which does not reference it",
                id, wallet_id
            );
        }
    }
    wallets.extend(db.wallets_referencing(id));

    wallets
}
