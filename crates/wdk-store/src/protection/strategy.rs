//! Protect/reveal strategies

use tracing::warn;

use crate::crypto::{self, MasterKey};
use crate::error::Result;

/// The confidentiality boundary for seed mnemonics and API key values.
///
/// `reveal(protect(x)) == x` for every `x`. Callers treat tokens as opaque.
pub trait Protector: Send + Sync {
    /// Turn a plaintext secret into its stored form
    fn protect(&self, plaintext: &str) -> Result<String>;

    /// Turn a stored token back into the plaintext secret
    fn reveal(&self, token: &str) -> Result<String>;

    /// Human-readable strategy name for logs and stats
    fn name(&self) -> &'static str;

    /// Whether stored values are actually confidential
    fn is_secure(&self) -> bool {
        true
    }
}

/// AES-256-GCM under a per-installation key
pub struct AeadProtector {
    key: MasterKey,
}

impl AeadProtector {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }
}

impl Protector for AeadProtector {
    fn protect(&self, plaintext: &str) -> Result<String> {
        crypto::seal(plaintext, &self.key)
    }

    fn reveal(&self, token: &str) -> Result<String> {
        crypto::open(token, &self.key)
    }

    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }
}

impl std::fmt::Debug for AeadProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeadProtector").field("key", &self.key).finish()
    }
}

/// Identity transform. Secrets are stored in clear text.
///
/// Only for tests and for reading stores written before encryption existed.
#[derive(Debug, Default)]
pub struct PlaintextProtector;

impl PlaintextProtector {
    pub fn new() -> Self {
        warn!("Using plaintext protector: secrets are stored unencrypted");
        Self
    }
}

impl Protector for PlaintextProtector {
    fn protect(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }

    fn reveal(&self, token: &str) -> Result<String> {
        Ok(token.to_string())
    }

    fn name(&self) -> &'static str {
        "insecure-plaintext"
    }

    fn is_secure(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_aead_roundtrip_and_opacity() {
        let protector = AeadProtector::new(MasterKey::generate());
        let token = protector.protect("sk-proj-abc123").unwrap();

        assert_ne!(token, "sk-proj-abc123");
        assert_eq!(protector.reveal(&token).unwrap(), "sk-proj-abc123");
        assert!(protector.is_secure());
    }

    #[test]
    fn test_aead_rejects_plaintext_token() {
        let protector = AeadProtector::new(MasterKey::generate());
        assert!(matches!(
            protector.reveal("word word word"),
            Err(StoreError::Decryption(_))
        ));
    }

    #[test]
    fn test_plaintext_is_identity() {
        let protector = PlaintextProtector::new();
        assert_eq!(protector.protect("m1").unwrap(), "m1");
        assert_eq!(protector.reveal("m1").unwrap(), "m1");
        assert!(!protector.is_secure());
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let protector = AeadProtector::new(MasterKey::new([0x11; 32]));
        let debug = format!("{:?}", protector);
        assert!(debug.contains("REDACTED"));
    }
}
