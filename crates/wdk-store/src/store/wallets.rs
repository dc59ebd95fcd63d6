//! Wallet operations
//!
//! `Wallet::seed_ref` is the source of truth for the seed/wallet relation.
//! Every path here keeps the seed-side `wallets` list in step with it.

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::manager::ConfigStore;
use super::types::{NewWallet, Wallet, WalletUpdate};
use crate::error::{EntityKind, Result, StoreError};

impl ConfigStore {
    /// Create a wallet and register it on its seed. Fails with `AlreadyExists`
    /// rather than overwriting. A `seed_ref` naming no seed is accepted.
    pub async fn create_wallet(&self, id: &str, new: NewWallet) -> Result<Wallet> {
        let wallet = self
            .mutate(|db| {
                if db.wallets.contains_key(id) {
                    return Err(StoreError::already_exists(EntityKind::Wallet, id));
                }

                let now = Utc::now();
                match db.seeds.get_mut(&new.seed_ref) {
                    Some(seed) => {
                        seed.wallets.insert(id.to_string());
                        seed.updated_at = now;
                    }
                    None => warn!(
                        "Wallet '{}' references unknown seed '{}'",
                        id, new.seed_ref
                    ),
                }

                let wallet = Wallet {
                    name: new.name,
                    seed_ref: new.seed_ref,
                    kind: new.kind,
                    description: new.description,
                    derivation_path: new.derivation_path,
                    provider: new.provider,
                    addresses: new.addresses,
                    networks: new.networks,
                    created_at: now,
                    updated_at: now,
                };
                db.wallets.insert(id.to_string(), wallet.clone());
                Ok(wallet)
            })
            .await?;

        info!("Created wallet '{}' under seed '{}'", id, wallet.seed_ref);
        Ok(wallet)
    }

    pub async fn get_wallet(&self, id: &str) -> Option<Wallet> {
        self.data.read().await.wallets.get(id).cloned()
    }

    pub async fn list_wallets(&self) -> IndexMap<String, Wallet> {
        self.data.read().await.wallets.clone()
    }

    /// Wallets listed on a seed, skipping listed ids that no longer exist
    pub async fn list_wallets_by_seed(&self, seed_id: &str) -> IndexMap<String, Wallet> {
        let data = self.data.read().await;
        let Some(seed) = data.seeds.get(seed_id) else {
            return IndexMap::new();
        };

        seed.wallets
            .iter()
            .filter_map(|id| data.wallets.get(id).map(|w| (id.clone(), w.clone())))
            .collect()
    }

    /// Merge `update` into the wallet, moving it between seed lists when
    /// `seed_ref` changes. Silently does nothing if the wallet is absent.
    pub async fn update_wallet(&self, id: &str, update: WalletUpdate) -> Result<()> {
        self.mutate(|db| {
            let Some(old_ref) = db.wallets.get(id).map(|w| w.seed_ref.clone()) else {
                debug!("update_wallet: no wallet '{}'", id);
                return Ok(());
            };
            let now = Utc::now();

            if let Some(new_ref) = update.seed_ref.as_ref().filter(|r| **r != old_ref) {
                if let Some(old_seed) = db.seeds.get_mut(&old_ref) {
                    old_seed.wallets.shift_remove(id);
                    old_seed.updated_at = now;
                }
                match db.seeds.get_mut(new_ref) {
                    Some(new_seed) => {
                        new_seed.wallets.insert(id.to_string());
                        new_seed.updated_at = now;
                    }
                    None => warn!("Wallet '{}' moved to unknown seed '{}'", id, new_ref),
                }
                info!("Moved wallet '{}' from seed '{}' to '{}'", id, old_ref, new_ref);
            }

            let Some(wallet) = db.wallets.get_mut(id) else {
                return Ok(());
            };
            if let Some(name) = update.name {
                wallet.name = name;
            }
            if let Some(seed_ref) = update.seed_ref {
                wallet.seed_ref = seed_ref;
            }
            if let Some(kind) = update.kind {
                wallet.kind = kind;
            }
            if let Some(description) = update.description {
                wallet.description = description;
            }
            if let Some(derivation_path) = update.derivation_path {
                wallet.derivation_path = derivation_path;
            }
            if let Some(provider) = update.provider {
                wallet.provider = provider;
            }
            if let Some(addresses) = update.addresses {
                wallet.addresses = addresses;
            }
            if let Some(networks) = update.networks {
                wallet.networks = networks;
            }
            wallet.updated_at = now;

            debug!("Updated wallet '{}'", id);
            Ok(())
        })
        .await
    }

    /// Delete a wallet and drop it from its seed's list. No-op if absent.
    pub async fn delete_wallet(&self, id: &str) -> Result<()> {
        self.mutate(|db| {
            let Some(wallet) = db.wallets.shift_remove(id) else {
                return Ok(());
            };

            if let Some(seed) = db.seeds.get_mut(&wallet.seed_ref) {
                seed.wallets.shift_remove(id);
                seed.updated_at = Utc::now();
            }

            info!("Deleted wallet '{}'", id);
            Ok(())
        })
        .await
    }

    /// Append addresses derived from index `expected_start`. Returns the new
    /// address count.
    ///
    /// Fails with `AddressesChanged` when the wallet no longer holds exactly
    /// `expected_start` addresses, so position `i` always holds index `i`.
    pub async fn append_wallet_addresses(
        &self,
        id: &str,
        expected_start: usize,
        addresses: Vec<String>,
    ) -> Result<usize> {
        self.mutate(|db| {
            let wallet = db
                .wallets
                .get_mut(id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Wallet, id))?;

            if wallet.addresses.len() != expected_start {
                return Err(StoreError::AddressesChanged {
                    wallet_id: id.to_string(),
                    expected: expected_start,
                    actual: wallet.addresses.len(),
                });
            }

            if !addresses.is_empty() {
                wallet.addresses.extend(addresses);
                wallet.updated_at = Utc::now();
            }
            Ok(wallet.addresses.len())
        })
        .await
    }

    /// Derivation index of `address` within the wallet (linear scan)
    pub async fn get_address_index(&self, wallet_id: &str, address: &str) -> Option<usize> {
        self.data
            .read()
            .await
            .wallets
            .get(wallet_id)
            .and_then(|wallet| wallet.address_index(address))
    }
}
