//! Tool argument types (camelCase on the wire)

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::store::NetworkConfig;

/// Deserialize tool arguments; a missing (`null`) argument object is empty
pub(crate) fn parse<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| StoreError::InvalidArguments(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SeedId {
    pub seed_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSeed {
    pub seed_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub chains: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateSeed {
    pub seed_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub chains: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteSeed {
    pub seed_id: String,
    /// Also delete every wallet derived from the seed
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WalletId {
    pub wallet_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateWallet {
    pub wallet_id: String,
    pub name: String,
    pub seed_ref: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: Option<String>,
    pub description: Option<String>,
    pub derivation_path: Option<String>,
    pub address_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListWallets {
    pub seed_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddWalletAddress {
    pub wallet_id: String,
    pub count: Option<u32>,
}

/// Type and seed reference are fixed once a wallet exists
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateWallet {
    pub wallet_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub networks: Option<IndexMap<String, NetworkConfig>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetBalance {
    pub wallet_id: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendTransaction {
    pub wallet_id: String,
    pub from_address: String,
    pub to_address: String,
    /// Decimal amount in whole tokens
    pub amount: Amount,
}

/// Amount given either as a JSON number or a decimal string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl Amount {
    pub fn as_decimal(&self) -> String {
        match self {
            Amount::Text(text) => text.clone(),
            Amount::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetApiKey {
    pub key_name: String,
    pub key_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KeyName {
    pub key_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_args_are_empty_object() {
        let args: ListWallets = parse(Value::Null).unwrap();
        assert!(args.seed_id.is_none());
    }

    #[test]
    fn test_missing_field_is_invalid_arguments() {
        let result: Result<SeedId> = parse(json!({ "id": "s1" }));
        match result {
            Err(StoreError::InvalidArguments(message)) => assert!(message.contains("seedId")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_amount_accepts_number_or_string() {
        let args: SendTransaction = parse(json!({
            "walletId": "w1", "fromAddress": "0xA", "toAddress": "0xB", "amount": 0.5
        }))
        .unwrap();
        assert_eq!(args.amount.as_decimal(), "0.5");

        let args: SendTransaction = parse(json!({
            "walletId": "w1", "fromAddress": "0xA", "toAddress": "0xB", "amount": "1.25"
        }))
        .unwrap();
        assert_eq!(args.amount.as_decimal(), "1.25");
    }

    #[test]
    fn test_create_wallet_type_field() {
        let args: CreateWallet = parse(json!({
            "walletId": "w1", "name": "Eth", "seedRef": "s1", "type": "ethereum", "addressCount": 3
        }))
        .unwrap();
        assert_eq!(args.kind, "ethereum");
        assert_eq!(args.address_count, Some(3));
    }
}
