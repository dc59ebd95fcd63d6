//! Configuration store
//!
//! [`ConfigStore`] owns the database snapshot and is the only way to read or
//! change seeds, wallets and API keys. Operations are split into one
//! `impl ConfigStore` block per entity.

mod api_keys;
mod manager;
mod seeds;
mod types;
mod wallets;

pub use manager::ConfigStore;
pub use types::*;
