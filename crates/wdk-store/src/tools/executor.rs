//! Execute wallet tools against a store and a derivation backend

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::params::{self, parse};
use crate::derivation::{
    format_units, native_decimals, parse_units, Account, DerivationBackend, TransferRequest,
};
use crate::error::{EntityKind, Result, StoreError};
use crate::store::{ConfigStore, NewSeed, NewWallet, Seed, SeedUpdate, Wallet, WalletUpdate};

/// Derivation path used when `create_wallet` is given none
pub fn default_derivation_path(kind: &str) -> &'static str {
    match kind {
        "ethereum" => "m/44'/60'/0'/0",
        _ => "m/84'/0'/0'/0",
    }
}

/// Provider recorded for EVM wallets created without one
pub const DEFAULT_EVM_PROVIDER: &str = "https://eth.drpc.org";

/// Most addresses `create_wallet` or `add_wallet_address` derive in one call
pub const MAX_ADDRESSES_PER_CALL: u32 = 100;

/// Derive-then-append rounds before `add_wallet_address` gives up
const APPEND_ATTEMPTS: usize = 3;

/// Tool handlers over a shared store
pub struct WalletTools {
    store: Arc<ConfigStore>,
    backend: Arc<dyn DerivationBackend>,
}

impl WalletTools {
    pub fn new(store: Arc<ConfigStore>, backend: Arc<dyn DerivationBackend>) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Execute a tool by name.
    ///
    /// Always returns an object with a boolean `success`; failures carry an
    /// `error` message instead of propagating.
    pub async fn call(&self, name: &str, args: Value) -> Value {
        debug!("Calling tool: {}", name);

        match self.dispatch(name, args).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                json!({ "success": false, "error": e.to_string() })
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        match name {
            "create_seed" => self.create_seed(parse(args)?).await,
            "list_seeds" => self.list_seeds().await,
            "get_seed" => self.get_seed(parse(args)?).await,
            "update_seed" => self.update_seed(parse(args)?).await,
            "delete_seed" => self.delete_seed(parse(args)?).await,
            "create_wallet" => self.create_wallet(parse(args)?).await,
            "list_wallets" => self.list_wallets(parse(args)?).await,
            "get_wallet" => self.get_wallet(parse(args)?).await,
            "add_wallet_address" => self.add_wallet_address(parse(args)?).await,
            "update_wallet" => self.update_wallet(parse(args)?).await,
            "delete_wallet" => self.delete_wallet(parse(args)?).await,
            "get_balance" => self.get_balance(parse(args)?).await,
            "send_transaction" => self.send_transaction(parse(args)?).await,
            "set_api_key" => self.set_api_key(parse(args)?).await,
            "get_api_key" => self.get_api_key(parse(args)?).await,
            "list_api_keys" => self.list_api_keys().await,
            "delete_api_key" => self.delete_api_key(parse(args)?).await,
            "get_database_stats" => self.get_database_stats().await,
            "new_seedphrase" => self.new_seedphrase(),
            "get_all_wallets" => self.get_all_wallets().await,
            other => Err(StoreError::UnknownTool(other.to_string())),
        }
    }

    // Seeds

    async fn create_seed(&self, args: params::CreateSeed) -> Result<Value> {
        let phrase = self.backend.random_seed_phrase()?;
        let new = NewSeed::new(&args.name, args.description)
            .with_chains(args.chains)
            .with_mnemonic(phrase);

        self.store.create_seed(&args.seed_id, new).await?;

        Ok(json!({
            "success": true,
            "seedId": args.seed_id,
            "message": format!("Seed '{}' created successfully", args.name),
        }))
    }

    async fn list_seeds(&self) -> Result<Value> {
        let seeds = self.store.list_seeds().await?;
        let list: Vec<Value> = seeds
            .iter()
            .map(|(id, seed)| seed_summary(id, seed))
            .collect();

        Ok(json!({ "success": true, "count": list.len(), "seeds": list }))
    }

    async fn get_seed(&self, args: params::SeedId) -> Result<Value> {
        let seed = self.require_seed(&args.seed_id).await?;
        Ok(json!({ "success": true, "seed": seed_summary(&args.seed_id, &seed) }))
    }

    async fn update_seed(&self, args: params::UpdateSeed) -> Result<Value> {
        self.require_seed(&args.seed_id).await?;

        let update = SeedUpdate {
            name: args.name,
            description: args.description,
            chains: args.chains.map(Some),
            ..Default::default()
        };
        self.store.update_seed(&args.seed_id, update).await?;

        Ok(json!({
            "success": true,
            "seedId": args.seed_id,
            "message": format!("Seed '{}' updated successfully", args.seed_id),
        }))
    }

    async fn delete_seed(&self, args: params::DeleteSeed) -> Result<Value> {
        self.require_seed(&args.seed_id).await?;

        let deleted_wallets = if args.cascade {
            self.store.delete_seed_cascade(&args.seed_id).await?
        } else {
            self.store.delete_seed(&args.seed_id).await?;
            Vec::new()
        };

        Ok(json!({
            "success": true,
            "seedId": args.seed_id,
            "deletedWallets": deleted_wallets,
            "message": format!("Seed '{}' deleted successfully", args.seed_id),
        }))
    }

    // Wallets

    async fn create_wallet(&self, args: params::CreateWallet) -> Result<Value> {
        if self.store.get_wallet(&args.wallet_id).await.is_some() {
            return Err(StoreError::AlreadyExists {
                kind: EntityKind::Wallet,
                id: args.wallet_id,
            });
        }

        let mnemonic = self.require_mnemonic(&args.seed_ref).await?;
        let provider = args
            .provider
            .or_else(|| (args.kind != "bitcoin").then(|| DEFAULT_EVM_PROVIDER.to_string()));
        let count = address_count(args.address_count)?;

        let addresses = self
            .derive_addresses(&mnemonic, &args.kind, provider.as_deref(), 0, count)
            .await?;

        let new = NewWallet {
            description: args.description,
            derivation_path: Some(
                args.derivation_path
                    .unwrap_or_else(|| default_derivation_path(&args.kind).to_string()),
            ),
            provider,
            ..NewWallet::new(&args.name, &args.seed_ref, &args.kind).with_addresses(addresses)
        };
        let wallet = self.store.create_wallet(&args.wallet_id, new).await?;

        Ok(json!({
            "success": true,
            "walletId": args.wallet_id,
            "type": wallet.kind,
            "addresses": wallet.addresses,
            "message": format!(
                "Wallet '{}' created with {} address(es)",
                wallet.name,
                wallet.addresses.len()
            ),
        }))
    }

    async fn list_wallets(&self, args: params::ListWallets) -> Result<Value> {
        let wallets = match &args.seed_id {
            Some(seed_id) => self.store.list_wallets_by_seed(seed_id).await,
            None => self.store.list_wallets().await,
        };
        let list: Vec<Value> = wallets
            .iter()
            .map(|(id, wallet)| wallet_view(id, wallet))
            .collect();

        Ok(json!({
            "success": true,
            "count": list.len(),
            "filterBySeed": args.seed_id,
            "wallets": list,
        }))
    }

    async fn get_wallet(&self, args: params::WalletId) -> Result<Value> {
        let wallet = self.require_wallet(&args.wallet_id).await?;
        Ok(json!({ "success": true, "wallet": wallet_view(&args.wallet_id, &wallet) }))
    }

    async fn add_wallet_address(&self, args: params::AddWalletAddress) -> Result<Value> {
        let count = address_count(args.count)?;

        let mut attempt = 1;
        let (new_addresses, total) = loop {
            let wallet = self.require_wallet(&args.wallet_id).await?;
            let mnemonic = self.require_mnemonic(&wallet.seed_ref).await?;

            let start = wallet.addresses.len();
            let derived = self
                .derive_addresses(
                    &mnemonic,
                    &wallet.kind,
                    wallet.provider.as_deref(),
                    index_u32(start)?,
                    count,
                )
                .await?;

            match self
                .store
                .append_wallet_addresses(&args.wallet_id, start, derived.clone())
                .await
            {
                Ok(total) => break (derived, total),
                Err(e @ StoreError::AddressesChanged { .. }) if attempt < APPEND_ATTEMPTS => {
                    debug!("{}; deriving again", e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        Ok(json!({
            "success": true,
            "walletId": args.wallet_id,
            "newAddresses": new_addresses,
            "totalAddresses": total,
            "message": format!("Added {} new address(es) to wallet", new_addresses.len()),
        }))
    }

    async fn update_wallet(&self, args: params::UpdateWallet) -> Result<Value> {
        self.require_wallet(&args.wallet_id).await?;

        let update = WalletUpdate {
            name: args.name,
            description: args.description.map(Some),
            networks: args.networks.map(Some),
            ..Default::default()
        };
        self.store.update_wallet(&args.wallet_id, update).await?;

        Ok(json!({
            "success": true,
            "walletId": args.wallet_id,
            "message": format!("Wallet '{}' updated successfully", args.wallet_id),
        }))
    }

    async fn delete_wallet(&self, args: params::WalletId) -> Result<Value> {
        self.require_wallet(&args.wallet_id).await?;
        self.store.delete_wallet(&args.wallet_id).await?;

        Ok(json!({
            "success": true,
            "walletId": args.wallet_id,
            "message": format!("Wallet '{}' deleted successfully", args.wallet_id),
        }))
    }

    async fn get_balance(&self, args: params::GetBalance) -> Result<Value> {
        let (wallet, account) = self.account_for(&args.wallet_id, &args.address).await?;
        let balance = account.balance().await?;

        Ok(json!({
            "success": true,
            "address": args.address,
            "balance": format_units(balance, native_decimals(&wallet.kind)),
            "baseUnits": balance.to_string(),
        }))
    }

    async fn send_transaction(&self, args: params::SendTransaction) -> Result<Value> {
        let (wallet, account) = self.account_for(&args.wallet_id, &args.from_address).await?;
        let decimals = native_decimals(&wallet.kind);
        let value = parse_units(&args.amount.as_decimal(), decimals)?;

        let receipt = account
            .send_transaction(TransferRequest {
                to: args.to_address.clone(),
                value,
            })
            .await?;

        info!(
            "Sent {} base units from wallet '{}' to {}: {}",
            value, args.wallet_id, args.to_address, receipt.hash
        );

        Ok(json!({
            "success": true,
            "hash": receipt.hash,
            "fee": format_units(receipt.fee, decimals),
            "feeBaseUnits": receipt.fee.to_string(),
        }))
    }

    // API keys

    async fn set_api_key(&self, args: params::SetApiKey) -> Result<Value> {
        self.store.set_api_key(&args.key_name, &args.key_value).await?;

        Ok(json!({
            "success": true,
            "keyName": args.key_name,
            "message": format!("API key '{}' stored successfully", args.key_name),
        }))
    }

    async fn get_api_key(&self, args: params::KeyName) -> Result<Value> {
        let value = self
            .store
            .get_api_key(&args.key_name)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::ApiKey, &args.key_name))?;

        Ok(json!({
            "success": true,
            "keyName": args.key_name,
            "keyValue": value.expose(),
        }))
    }

    async fn list_api_keys(&self) -> Result<Value> {
        let keys = self.store.list_api_keys().await;
        Ok(json!({ "success": true, "count": keys.len(), "keys": keys }))
    }

    async fn delete_api_key(&self, args: params::KeyName) -> Result<Value> {
        self.store.delete_api_key(&args.key_name).await?;

        Ok(json!({
            "success": true,
            "keyName": args.key_name,
            "message": format!("API key '{}' deleted successfully", args.key_name),
        }))
    }

    // Utilities

    async fn get_database_stats(&self) -> Result<Value> {
        let stats = self.store.stats().await;
        Ok(json!({ "success": true, "stats": serde_json::to_value(stats)? }))
    }

    fn new_seedphrase(&self) -> Result<Value> {
        let phrase = self.backend.random_seed_phrase()?;
        Ok(json!({ "success": true, "seedPhrase": phrase }))
    }

    async fn get_all_wallets(&self) -> Result<Value> {
        let wallets = self.store.list_wallets().await;
        Ok(json!({ "success": true, "wallets": serde_json::to_value(wallets)? }))
    }

    // Helpers

    async fn require_seed(&self, seed_id: &str) -> Result<Seed> {
        self.store
            .get_seed(seed_id)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::Seed, seed_id))
    }

    async fn require_wallet(&self, wallet_id: &str) -> Result<Wallet> {
        self.store
            .get_wallet(wallet_id)
            .await
            .ok_or_else(|| StoreError::not_found(EntityKind::Wallet, wallet_id))
    }

    /// Revealed mnemonic of a seed
    async fn require_mnemonic(&self, seed_id: &str) -> Result<Zeroizing<String>> {
        self.require_seed(seed_id)
            .await?
            .mnemonic
            .map(Zeroizing::new)
            .ok_or_else(|| StoreError::MissingMnemonic(seed_id.to_string()))
    }

    async fn derive_addresses(
        &self,
        mnemonic: &str,
        kind: &str,
        provider: Option<&str>,
        start: u32,
        count: u32,
    ) -> Result<Vec<String>> {
        let manager = self.backend.manager(mnemonic, kind, provider).await?;

        let mut addresses = Vec::new();
        for offset in 0..count {
            let index = start
                .checked_add(offset)
                .ok_or_else(|| StoreError::Derivation("derivation index overflow".into()))?;
            addresses.push(manager.account(index).await?.address().await?);
        }
        Ok(addresses)
    }

    /// Wallet and the derived account owning `address`
    async fn account_for(
        &self,
        wallet_id: &str,
        address: &str,
    ) -> Result<(Wallet, Box<dyn Account>)> {
        let wallet = self.require_wallet(wallet_id).await?;
        let index = wallet
            .address_index(address)
            .ok_or_else(|| StoreError::not_found(EntityKind::Address, address))?;
        let mnemonic = self.require_mnemonic(&wallet.seed_ref).await?;

        let manager = self
            .backend
            .manager(&mnemonic, &wallet.kind, wallet.provider.as_deref())
            .await?;
        let account = manager.account(index_u32(index)?).await?;
        Ok((wallet, account))
    }
}

/// Requested address count; absent or zero means one
fn address_count(requested: Option<u32>) -> Result<u32> {
    match requested {
        None | Some(0) => Ok(1),
        Some(count) if count > MAX_ADDRESSES_PER_CALL => Err(StoreError::InvalidArguments(
            format!(
                "at most {} addresses can be derived per call, got {}",
                MAX_ADDRESSES_PER_CALL, count
            ),
        )),
        Some(count) => Ok(count),
    }
}

fn index_u32(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| StoreError::Derivation(format!("index {} out of range", index)))
}

/// Seed metadata for tool output; never includes the mnemonic
fn seed_summary(id: &str, seed: &Seed) -> Value {
    json!({
        "seedId": id,
        "name": seed.name,
        "type": seed.kind,
        "description": seed.description,
        "chains": seed.chains,
        "walletCount": seed.wallets.len(),
        "wallets": seed.wallets,
        "createdAt": seed.created_at,
        "updatedAt": seed.updated_at,
    })
}

fn wallet_view(id: &str, wallet: &Wallet) -> Value {
    json!({
        "walletId": id,
        "name": wallet.name,
        "type": wallet.kind,
        "seedRef": wallet.seed_ref,
        "description": wallet.description,
        "derivationPath": wallet.derivation_path,
        "provider": wallet.provider,
        "addresses": wallet.addresses,
        "networks": wallet.networks,
        "createdAt": wallet.created_at,
        "updatedAt": wallet.updated_at,
    })
}
