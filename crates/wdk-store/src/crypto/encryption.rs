//! AES-256-GCM sealing of short string secrets
//!
//! Token format: `aes256gcm:{base64(nonce || ciphertext || tag)}`
//! - nonce: 12 bytes, random per call
//! - tag: 16 bytes, appended by aes-gcm

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};

use super::MasterKey;
use crate::error::{Result, StoreError};

/// Prefix identifying a token produced by [`seal`]
pub const TOKEN_PREFIX: &str = "aes256gcm:";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and return a self-describing token
pub fn seal(plaintext: &str, key: &MasterKey) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&ciphertext);

    Ok(format!("{}{}", TOKEN_PREFIX, STANDARD.encode(packed)))
}

/// Decrypt a token produced by [`seal`]
pub fn open(token: &str, key: &MasterKey) -> Result<String> {
    let encoded = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or_else(|| StoreError::Decryption("value is not an aes256gcm token".to_string()))?;

    let packed = STANDARD
        .decode(encoded)
        .map_err(|e| StoreError::Decryption(format!("invalid token encoding: {}", e)))?;

    if packed.len() < NONCE_LEN + TAG_LEN {
        return Err(StoreError::Decryption(format!(
            "token too short: {} bytes",
            packed.len()
        )));
    }

    let (nonce, ciphertext) = packed.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| StoreError::Decryption(e.to_string()))?;

    // aes-gcm's error is opaque; a tag mismatch covers both tampering and a wrong key.
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| StoreError::Decryption("authentication failed".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| StoreError::Decryption(format!("Invalid UTF-8: {}", e)))
}

/// Whether `value` looks like a sealed token
pub fn is_sealed(value: &str) -> bool {
    value.starts_with(TOKEN_PREFIX)
}
