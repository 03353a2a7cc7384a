//! Runtime configuration, read once from the environment at startup

use std::num::NonZeroU32;
use std::path::PathBuf;

use panthr_crypto::{Scheme, SecretVault, VaultError, SERVER_SECRET_ENV};
use secrecy::SecretString;
use thiserror::Error;

pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const DB_PATH_ENV: &str = "PANTHR_DB_PATH";
pub const SCHEME_ENV: &str = "PANTHR_ENVELOPE_SCHEME";
pub const KDF_ITERATIONS_ENV: &str = "PANTHR_KDF_ITERATIONS";
pub const ACCOUNT_CMD_ENV: &str = "PANTHR_ACCOUNT_CMD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(transparent)]
    Vault(#[from] VaultError),
}

pub struct Config {
    pub server_secret: SecretString,
    pub bot_token: Option<SecretString>,
    pub db_path: Option<PathBuf>,
    pub scheme: Scheme,
    pub kdf_iterations: Option<NonZeroU32>,
    pub account_cmd: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any `name -> value` source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let server_secret = get(SERVER_SECRET_ENV)
            .map(SecretString::new)
            .ok_or(ConfigError::Missing(SERVER_SECRET_ENV))?;

        let scheme = match get(SCHEME_ENV) {
            Some(value) => value
                .parse::<Scheme>()
                .map_err(|reason| ConfigError::Invalid { name: SCHEME_ENV, reason })?,
            None => Scheme::default(),
        };

        let kdf_iterations = get(KDF_ITERATIONS_ENV)
            .map(|value| {
                value.trim().parse::<NonZeroU32>().map_err(|e| ConfigError::Invalid {
                    name: KDF_ITERATIONS_ENV,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            server_secret,
            bot_token: get(BOT_TOKEN_ENV).map(SecretString::new),
            db_path: get(DB_PATH_ENV).map(PathBuf::from),
            scheme,
            kdf_iterations,
            account_cmd: get(ACCOUNT_CMD_ENV).unwrap_or_else(|| "snarkos".to_string()),
        })
    }

    pub fn vault(&self) -> Result<SecretVault, ConfigError> {
        let mut vault = SecretVault::new(self.server_secret.clone())?.with_scheme(self.scheme);
        if let Some(iterations) = self.kdf_iterations {
            vault = vault.with_kdf_iterations(iterations);
        }
        Ok(vault)
    }
}
