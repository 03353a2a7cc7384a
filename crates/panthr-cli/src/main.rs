//! Panthr CLI - Aleo wallet bot
//!
//! Usage:
//!   panthr run          - Start the Telegram bot
//!   panthr vault seal   - Seal a secret read from stdin for a user
//!   panthr vault open   - Open an envelope for a user
//!   panthr user show    - Print a stored user record

mod config;
mod telegram;

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use panthr_core::{CommandAccountProvider, UserId, UserStore, WalletService};
use panthr_crypto::Scheme;
use panthr_store::SqliteUserStore;
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, BOT_TOKEN_ENV};

#[derive(Parser)]
#[command(name = "panthr")]
#[command(version)]
#[command(about = "Aleo wallet Telegram bot with per-user encrypted keys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Run,

    /// Seal or open envelopes with the configured server secret
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// Inspect stored users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum VaultAction {
    /// Seal a secret read from stdin and print the envelope
    Seal {
        /// User id the envelope is bound to
        #[arg(long)]
        user: String,
    },

    /// Open an envelope and print the secret
    Open {
        /// User id the envelope is bound to
        #[arg(long)]
        user: String,

        /// Scheme the envelope was sealed with (aead, legacy-cbc)
        #[arg(long)]
        scheme: Option<Scheme>,

        /// Envelope in hex(iv):hex(ciphertext) form
        envelope: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Print a user record as JSON (the envelope is omitted)
    Show {
        /// User id
        user: String,
    },
}

fn open_store(config: &Config) -> anyhow::Result<SqliteUserStore> {
    let store = match &config.db_path {
        Some(path) => SqliteUserStore::open(path.clone()),
        None => SqliteUserStore::open_default(),
    };
    store.context("Failed to open user store")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // A missing server secret aborts here, before any command runs
    let config = Config::from_env().context("Invalid configuration")?;
    let vault = config.vault()?;

    match cli.command {
        Commands::Run => {
            let token = config
                .bot_token
                .as_ref()
                .map(|t| t.expose_secret().clone())
                .with_context(|| format!("{BOT_TOKEN_ENV} must be set to run the bot"))?;
            let store = open_store(&config)?;
            let accounts = CommandAccountProvider::new(&config.account_cmd);
            info!(scheme = %vault.scheme(), account_cmd = %config.account_cmd, "configuration loaded");

            let service = Arc::new(WalletService::new(vault, store, accounts));
            telegram::run_telegram_bot(token, service).await;
        }

        Commands::Vault { action } => match action {
            VaultAction::Seal { user } => {
                let mut secret = String::new();
                std::io::stdin()
                    .read_to_string(&mut secret)
                    .context("Failed to read secret from stdin")?;
                let envelope = vault.seal(secret.trim_end_matches(['\r', '\n']).as_bytes(), &user)?;
                println!("{}", envelope);
            }
            VaultAction::Open { user, scheme, envelope } => {
                let scheme = scheme.unwrap_or(vault.scheme());
                let secret = vault.open_string(scheme, envelope.trim(), &user)?;
                println!("{}", secret.as_str());
            }
        },

        Commands::User { action } => match action {
            UserAction::Show { user } => {
                let store = open_store(&config)?;
                match store.find_by_user_id(&UserId::new(user.clone()))? {
                    Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                    None => anyhow::bail!("No record for user {}", user),
                }
            }
        },
    }

    Ok(())
}
