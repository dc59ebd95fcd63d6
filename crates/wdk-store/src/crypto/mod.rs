//! Cryptographic primitives behind the confidentiality boundary
//!
//! - AES-256-GCM sealing of secrets into opaque tokens
//! - Argon2id derivation of installation keys from a passphrase
//! - Zeroize-on-drop key and secret holders

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{is_sealed, open, seal, TOKEN_PREFIX};
pub use key_derivation::{derive_key, generate_salt, KeyDerivationParams};
pub use secure_memory::{MasterKey, SecretString, KEY_LEN};
