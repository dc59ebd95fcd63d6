//! Confidentiality boundary for secrets at rest
//!
//! Every seed mnemonic and API key value passes through a [`Protector`] on
//! write and on read; no other field does. The default strategy is
//! AES-256-GCM under a per-installation key. The plaintext strategy exists
//! only when asked for explicitly.

mod key_file;
mod strategy;

use std::sync::Arc;
use tracing::info;

pub use key_file::{load_or_create_key, load_or_create_salt};
pub use strategy::{AeadProtector, PlaintextProtector, Protector};

use crate::config::{ProtectionConfig, StoreConfig};
use crate::crypto::derive_key;
use crate::error::Result;

/// Build the protector described by `config`, creating key material on first use
pub async fn build_protector(config: &StoreConfig) -> Result<Arc<dyn Protector>> {
    let protector: Arc<dyn Protector> = match &config.protection {
        ProtectionConfig::KeyFile { .. } => {
            let key_path = config.key_file_path();
            let key = load_or_create_key(&key_path).await?;
            Arc::new(AeadProtector::new(key))
        }
        ProtectionConfig::Passphrase {
            passphrase, params, ..
        } => {
            let salt = load_or_create_salt(&config.salt_file_path()).await?;
            let key = derive_key(passphrase.expose(), &salt, params)?;
            Arc::new(AeadProtector::new(key))
        }
        ProtectionConfig::Insecure => Arc::new(PlaintextProtector::new()),
    };

    info!("Secrets protected with {}", protector.name());
    Ok(protector)
}
