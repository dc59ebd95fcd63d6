//! wdk-store-admin - inspect and maintain a WDK configuration store
//!
//! Reads and writes the same `wdk-data.json` file the wallet tools use. Logs
//! go to stderr; command output goes to stdout.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use wdk_store::{
    build_protector, tool_names, ConfigStore, KeyDerivationParams, ProtectionConfig,
    SecretString, StoreConfig, DEFAULT_STORE_FILE,
};

/// WDK store admin - inspect seeds and wallets, manage API keys, migrate keys
#[derive(Parser, Debug)]
#[command(name = "wdk-store-admin")]
#[command(version)]
#[command(about = "Inspect and maintain a WDK configuration store")]
struct Args {
    /// Store file
    #[arg(long, env = "WDK_STORE_PATH", default_value = DEFAULT_STORE_FILE, global = true)]
    store: PathBuf,

    /// Installation key file (default: <store>.key)
    #[arg(long, env = "WDK_STORE_KEY_FILE", global = true)]
    key_file: Option<PathBuf>,

    /// Derive the key from a passphrase instead of a key file
    #[arg(long, env = "WDK_STORE_PASSPHRASE", hide_env_values = true, global = true)]
    passphrase: Option<String>,

    /// Open a store whose secrets are kept in clear text
    #[arg(long, global = true, conflicts_with_all = ["key_file", "passphrase"])]
    insecure_plaintext: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Store(StoreCommand),
    /// List the wallet tool names
    Tools,
}

#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Entity counts
    Stats,
    /// Report drift between wallets and seeds (exit code 1 on issues)
    Check,
    /// List seeds (never prints seed phrases)
    Seeds,
    /// List wallets
    Wallets {
        /// Only wallets of this seed
        #[arg(long)]
        seed: Option<String>,
    },
    /// Derivation index of an address within a wallet
    AddressIndex { wallet: String, address: String },
    /// Manage API keys
    #[command(subcommand)]
    ApiKey(ApiKeyCommand),
    /// Re-protect every secret under a new key
    Migrate {
        /// Target key file (default: <store>.key)
        #[arg(long, conflicts_with = "to_passphrase")]
        to_key_file: Option<PathBuf>,
        /// Prompt for a passphrase to derive the target key from
        #[arg(long)]
        to_passphrase: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ApiKeyCommand {
    /// Store a key; prompts for the value when omitted
    Set { name: String, value: Option<String> },
    /// Print a key's value
    Get { name: String },
    /// List key names
    List,
    /// Delete a key
    Delete { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = store_config(&args);
    match args.command {
        Command::Store(command) => run(&config, command).await,
        Command::Tools => {
            for name in tool_names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

async fn run(config: &StoreConfig, command: StoreCommand) -> anyhow::Result<()> {
    let mut store = ConfigStore::open(config)
        .await
        .with_context(|| format!("Failed to open store {:?}", config.path))?;

    match command {
        StoreCommand::Stats => print_json(&store.stats().await)?,
        StoreCommand::Check => {
            let issues = store.check_integrity().await;
            if issues.is_empty() {
                println!("No integrity issues");
            } else {
                for issue in &issues {
                    println!("{}", issue);
                }
                std::process::exit(1);
            }
        }
        StoreCommand::Seeds => {
            for (id, seed) in store.list_seeds().await? {
                println!(
                    "{}\t{}\t{} wallet(s)\t{}",
                    id,
                    seed.name,
                    seed.wallets.len(),
                    seed.description
                );
            }
        }
        StoreCommand::Wallets { seed } => {
            let wallets = match seed {
                Some(seed) => store.list_wallets_by_seed(&seed).await,
                None => store.list_wallets().await,
            };
            print_json(&wallets)?;
        }
        StoreCommand::AddressIndex { wallet, address } => {
            match store.get_address_index(&wallet, &address).await {
                Some(index) => println!("{}", index),
                None => bail!("Address {} not found in wallet '{}'", address, wallet),
            }
        }
        StoreCommand::ApiKey(command) => api_key(&store, command).await?,
        StoreCommand::Migrate {
            to_key_file,
            to_passphrase,
        } => {
            let protection = if to_passphrase {
                ProtectionConfig::Passphrase {
                    passphrase: prompt_secret("New passphrase: ")?,
                    salt_path: None,
                    params: KeyDerivationParams::default(),
                }
            } else {
                ProtectionConfig::KeyFile { path: to_key_file }
            };
            let target = build_protector(&config.clone().with_protection(protection)).await?;

            store.reprotect(target).await?;
            info!("Store now protected with {}", store.protection());
        }
    }

    Ok(())
}

async fn api_key(store: &ConfigStore, command: ApiKeyCommand) -> anyhow::Result<()> {
    match command {
        ApiKeyCommand::Set { name, value } => {
            let value = match value {
                Some(value) => SecretString::new(value),
                None => prompt_secret(&format!("Value for {}: ", name))?,
            };
            store.set_api_key(&name, value.expose()).await?;
        }
        ApiKeyCommand::Get { name } => match store.get_api_key(&name).await? {
            Some(value) => println!("{}", value.expose()),
            None => bail!("API key '{}' not found", name),
        },
        ApiKeyCommand::List => {
            for name in store.list_api_keys().await {
                println!("{}", name);
            }
        }
        ApiKeyCommand::Delete { name } => store.delete_api_key(&name).await?,
    }
    Ok(())
}

fn store_config(args: &Args) -> StoreConfig {
    let protection = if args.insecure_plaintext {
        ProtectionConfig::Insecure
    } else if let Some(passphrase) = &args.passphrase {
        ProtectionConfig::Passphrase {
            passphrase: SecretString::new(passphrase.as_str()),
            salt_path: None,
            params: KeyDerivationParams::default(),
        }
    } else {
        ProtectionConfig::KeyFile {
            path: args.key_file.clone(),
        }
    };

    StoreConfig::new(&args.store).with_protection(protection)
}

fn prompt_secret(prompt: &str) -> anyhow::Result<SecretString> {
    let value = rpassword::prompt_password(prompt).context("Failed to read from terminal")?;
    if value.is_empty() {
        bail!("Empty value");
    }
    Ok(SecretString::new(value))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
