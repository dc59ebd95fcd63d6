//! Derivation backend seam
//!
//! The store never derives keys itself. Tool handlers hand a revealed
//! mnemonic to a [`DerivationBackend`] and only persist what comes back
//! (addresses). Amounts are integers in the chain's smallest unit.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Source of fresh mnemonics and per-chain account managers
#[async_trait]
pub trait DerivationBackend: Send + Sync {
    /// New random BIP-39 phrase
    fn random_seed_phrase(&self) -> Result<String>;

    /// Account manager for `kind` (e.g. "ethereum") rooted at `mnemonic`
    async fn manager(
        &self,
        mnemonic: &str,
        kind: &str,
        provider: Option<&str>,
    ) -> Result<Box<dyn AccountManager>>;
}

/// Derives accounts by index
#[async_trait]
pub trait AccountManager: Send + Sync {
    async fn account(&self, index: u32) -> Result<Box<dyn Account>>;
}

/// One derived account
#[async_trait]
pub trait Account: Send + Sync {
    async fn address(&self) -> Result<String>;

    /// Balance in base units (wei, satoshi)
    async fn balance(&self) -> Result<u128>;

    async fn send_transaction(&self, request: TransferRequest) -> Result<TransferReceipt>;
}

/// Native-token transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Recipient address
    pub to: String,
    /// Amount in base units
    pub value: u128,
}

/// Result of a submitted transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub hash: String,
    /// Fee paid, in base units
    pub fee: u128,
}

/// Decimals of the native token for a wallet kind
pub fn native_decimals(kind: &str) -> u32 {
    match kind {
        "bitcoin" => 8,
        _ => 18,
    }
}

/// Parse a decimal amount such as `"0.25"` into base units
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128> {
    let invalid = || StoreError::InvalidArguments(format!("invalid amount '{}'", amount));

    let (whole, fraction) = amount.trim().split_once('.').unwrap_or((amount.trim(), ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > decimals as usize {
        return Err(StoreError::InvalidArguments(format!(
            "amount '{}' has more than {} decimal places",
            amount, decimals
        )));
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Render base units as a decimal string without trailing zeros
pub fn format_units(value: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
