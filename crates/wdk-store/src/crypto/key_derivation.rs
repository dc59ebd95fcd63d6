//! Passphrase-based installation keys using Argon2id

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use super::{MasterKey, KEY_LEN};
use crate::error::{Result, StoreError};

/// Argon2id cost settings. Changing them changes the derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// KiB of memory
    pub memory_cost: u32,
    /// Passes over memory
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KeyDerivationParams {
    /// Cheap parameters for tests; never use for real stores
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Generate a random salt in the PHC base64 form accepted by [`derive_key`]
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Derive a 256-bit installation key from a passphrase
pub fn derive_key(passphrase: &str, salt: &str, params: &KeyDerivationParams) -> Result<MasterKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| StoreError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let salt = SaltString::from_b64(salt.trim())
        .map_err(|e| StoreError::KeyDerivation(format!("Invalid salt: {}", e)))?;

    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| StoreError::KeyDerivation(e.to_string()))?
        .hash
        .ok_or_else(|| StoreError::KeyDerivation("No hash output".to_string()))?;

    let bytes = hash.as_bytes();
    if bytes.len() < KEY_LEN {
        return Err(StoreError::KeyDerivation(format!(
            "expected {} bytes of output, got {}",
            KEY_LEN,
            bytes.len()
        )));
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes[..KEY_LEN]);
    Ok(MasterKey::new(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = generate_salt();
        let params = KeyDerivationParams::insecure_fast();

        let key1 = derive_key("correct horse", &salt, &params).unwrap();
        let key2 = derive_key("correct horse", &salt, &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_varies_with_input() {
        let params = KeyDerivationParams::insecure_fast();
        let salt = generate_salt();

        let base = derive_key("passphrase", &salt, &params).unwrap();
        let other_pass = derive_key("passphrase2", &salt, &params).unwrap();
        let other_salt = derive_key("passphrase", &generate_salt(), &params).unwrap();

        assert_ne!(base.as_bytes(), other_pass.as_bytes());
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
    }

    #[test]
    fn test_invalid_salt() {
        let result = derive_key("x", "not a salt!", &KeyDerivationParams::insecure_fast());
        assert!(matches!(result, Err(StoreError::KeyDerivation(_))));
    }
}
