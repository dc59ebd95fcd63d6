//! Wallet tool handlers
//!
//! Each tool takes a JSON argument object (camelCase keys) and returns a JSON
//! object with `success: true` and a payload, or `success: false` and an
//! `error` message. Seed output never contains the mnemonic.

mod executor;
mod params;

pub use executor::{
    default_derivation_path, WalletTools, DEFAULT_EVM_PROVIDER, MAX_ADDRESSES_PER_CALL,
};

/// A registered tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Every tool [`WalletTools::call`] understands
pub const TOOLS: &[ToolInfo] = &[
    ToolInfo {
        name: "create_seed",
        description: "Generate and store a new seed phrase; wallets are derived from it",
    },
    ToolInfo {
        name: "list_seeds",
        description: "List stored seeds with their metadata",
    },
    ToolInfo {
        name: "get_seed",
        description: "Get details of a seed by id",
    },
    ToolInfo {
        name: "update_seed",
        description: "Update a seed's name, description or chains",
    },
    ToolInfo {
        name: "delete_seed",
        description: "Delete a seed; fails while wallets use it unless cascade is set",
    },
    ToolInfo {
        name: "create_wallet",
        description: "Create a wallet under a seed and derive its first addresses",
    },
    ToolInfo {
        name: "list_wallets",
        description: "List all wallets, optionally filtered by seed",
    },
    ToolInfo {
        name: "get_wallet",
        description: "Get a wallet including its addresses and networks",
    },
    ToolInfo {
        name: "add_wallet_address",
        description: "Derive more addresses for a wallet from the next index",
    },
    ToolInfo {
        name: "update_wallet",
        description: "Update a wallet's name, description or networks",
    },
    ToolInfo {
        name: "delete_wallet",
        description: "Delete a wallet entry",
    },
    ToolInfo {
        name: "get_balance",
        description: "Native token balance of one of a wallet's addresses",
    },
    ToolInfo {
        name: "send_transaction",
        description: "Send native tokens from one of a wallet's addresses",
    },
    ToolInfo {
        name: "set_api_key",
        description: "Store an API key",
    },
    ToolInfo {
        name: "get_api_key",
        description: "Retrieve a stored API key by name",
    },
    ToolInfo {
        name: "list_api_keys",
        description: "List stored API key names (not values)",
    },
    ToolInfo {
        name: "delete_api_key",
        description: "Delete a stored API key",
    },
    ToolInfo {
        name: "get_database_stats",
        description: "Counts of seeds, wallets and API keys",
    },
    ToolInfo {
        name: "new_seedphrase",
        description: "Generate a seed phrase without storing it",
    },
    ToolInfo {
        name: "get_all_wallets",
        description: "All wallets keyed by id; never includes seed phrases",
    },
];

/// Names of every registered tool
pub fn tool_names() -> Vec<&'static str> {
    TOOLS.iter().map(|tool| tool.name).collect()
}
