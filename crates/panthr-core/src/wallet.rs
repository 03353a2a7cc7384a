//! Wallet service
//!
//! Shared by every frontend: takes a user id and the raw chat text, runs the
//! matching command against the vault, store and account provider, and
//! returns the reply text. Replies never carry key material except the
//! explicit `/view_private_key` answer.

use panthr_crypto::{Scheme, SecretVault, VaultError};
use thiserror::Error;
use tracing::{info, warn};

use crate::account::{AccountError, AccountProvider};
use crate::commands::{self, CommandKind, Parsed};
use crate::record::{UserId, UserSecretRecord, SUPPORTED_LANGUAGES};
use crate::store::{StoreError, UserStore};

pub const WELCOME: &str = "Welcome to Panthr-B Aleo Wallet Bot!";
pub const NO_WALLET: &str = "No wallet found. Please create or import a wallet first.";

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Account error: {0}")]
    Account(#[from] AccountError),
    #[error("No wallet for this user")]
    NoWallet,
    #[error("Wallet already exists")]
    WalletExists,
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("Unknown envelope version {0}")]
    UnknownScheme(u8),
}

impl WalletError {
    /// Text shown to the chat user. Never includes secrets.
    pub fn user_message(&self) -> String {
        match self {
            WalletError::Vault(VaultError::MalformedEnvelope(_)) | WalletError::UnknownScheme(_) => {
                "Cannot decrypt this record.".into()
            }
            WalletError::Vault(VaultError::AuthenticationFailure) | WalletError::Vault(VaultError::NotUtf8) => {
                "Cannot decrypt your private key: wrong key/identity or corrupted data.".into()
            }
            WalletError::Vault(_) | WalletError::Store(_) => {
                "Something went wrong on our side. Please try again later.".into()
            }
            WalletError::Account(AccountError::InvalidPrivateKey) => {
                "Error importing wallet. Please check your private key and try again.".into()
            }
            WalletError::Account(_) => "The wallet service is unavailable. Please try again later.".into(),
            WalletError::NoWallet => NO_WALLET.into(),
            WalletError::WalletExists => {
                "You already have a wallet. Use /import_wallet <privateKey> to replace it.".into()
            }
            WalletError::UnsupportedLanguage(_) => format!(
                "Language not supported. Please choose from the following: {}",
                SUPPORTED_LANGUAGES.join(", ")
            ),
        }
    }
}

pub struct WalletService<S, A> {
    vault: SecretVault,
    store: S,
    accounts: A,
}

impl<S: UserStore, A: AccountProvider> WalletService<S, A> {
    pub fn new(vault: SecretVault, store: S, accounts: A) -> Self {
        Self { vault, store, accounts }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Route one chat message. `None` means the text was not a command.
    pub fn handle(&self, user_id: &UserId, text: &str) -> Option<String> {
        let reply = match commands::parse(text)? {
            Parsed::Unknown(name) => format!("Unknown command /{name}. Send /help for the list of commands."),
            Parsed::Usage(spec) => format!("Usage: {}", spec.usage),
            Parsed::Command { spec, args } => {
                let result = self.dispatch(spec.kind, user_id, &args);
                result.unwrap_or_else(|e| {
                    warn!(user_id = %user_id, command = spec.name, error = %e, "command failed");
                    e.user_message()
                })
            }
        };
        Some(reply)
    }

    fn dispatch(&self, kind: CommandKind, user_id: &UserId, args: &[&str]) -> Result<String, WalletError> {
        match kind {
            CommandKind::Start => Ok(WELCOME.to_string()),
            CommandKind::Help => Ok(commands::help_text()),
            CommandKind::CreateWallet => {
                let address = self.create_wallet(user_id)?;
                Ok(format!(
                    "Wallet created successfully!\nAddress: {address}\nUse /view_private_key to see your private key, then write it down and keep it safe."
                ))
            }
            CommandKind::ImportWallet => {
                let address = self.import_wallet(user_id, args[0])?;
                Ok(format!("Wallet imported successfully!\nAddress: {address}"))
            }
            CommandKind::ViewPrivateKey => {
                let private_key = self.view_private_key(user_id)?;
                Ok(format!("Your private key is: {}", private_key.as_str()))
            }
            CommandKind::SetLanguage => {
                let language = self.set_language(user_id, args[0])?;
                Ok(format!("Language updated to {language}."))
            }
            CommandKind::ToggleNotifications => {
                let enabled = self.toggle_notifications(user_id)?;
                Ok(format!(
                    "Notifications have been {}.",
                    if enabled { "enabled" } else { "disabled" }
                ))
            }
            CommandKind::ComingSoon(feature) => Ok(format!("{feature} feature is coming soon. Stay tuned for updates!")),
        }
    }

    fn require_record(&self, user_id: &UserId) -> Result<UserSecretRecord, WalletError> {
        self.store.find_by_user_id(user_id)?.ok_or(WalletError::NoWallet)
    }

    /// Create a fresh account and store its sealed private key.
    /// Refuses to overwrite an existing wallet.
    pub fn create_wallet(&self, user_id: &UserId) -> Result<String, WalletError> {
        if self.store.find_by_user_id(user_id)?.is_some() {
            return Err(WalletError::WalletExists);
        }
        let account = self.accounts.create()?;
        let envelope = self.vault.seal(account.private_key.as_bytes(), user_id.as_str())?;

        let record = UserSecretRecord::new(
            user_id.clone(),
            envelope,
            self.vault.scheme(),
            account.address.clone(),
            account.view_key.clone(),
        );
        self.store.upsert(&record)?;
        info!(user_id = %user_id, "wallet created");
        Ok(account.address)
    }

    /// Store an existing private key, replacing any previous wallet
    pub fn import_wallet(&self, user_id: &UserId, private_key: &str) -> Result<String, WalletError> {
        let account = self.accounts.import(private_key)?;
        let envelope = self.vault.seal(account.private_key.as_bytes(), user_id.as_str())?;
        let scheme = self.vault.scheme();

        let record = match self.store.find_by_user_id(user_id)? {
            Some(mut existing) => {
                existing.replace_wallet(envelope, scheme, account.address.clone(), account.view_key.clone());
                existing
            }
            None => UserSecretRecord::new(
                user_id.clone(),
                envelope,
                scheme,
                account.address.clone(),
                account.view_key.clone(),
            ),
        };
        self.store.upsert(&record)?;
        info!(user_id = %user_id, "wallet imported");
        Ok(account.address)
    }

    /// Decrypt the stored private key. Records written under an older scheme
    /// are re-sealed with the current one and written back.
    pub fn view_private_key(&self, user_id: &UserId) -> Result<zeroize::Zeroizing<String>, WalletError> {
        let mut record = self.require_record(user_id)?;
        let scheme = record
            .scheme()
            .ok_or(WalletError::UnknownScheme(record.envelope_version))?;
        let private_key = self.vault.open_string(scheme, &record.envelope, user_id.as_str())?;

        let current = self.vault.scheme();
        if scheme != current {
            self.migrate(&mut record, scheme, current, private_key.as_bytes());
        }
        Ok(private_key)
    }

    fn migrate(&self, record: &mut UserSecretRecord, from: Scheme, to: Scheme, private_key: &[u8]) {
        let result = self
            .vault
            .seal(private_key, record.user_id.as_str())
            .map_err(WalletError::from)
            .and_then(|envelope| {
                record.envelope = envelope;
                record.envelope_version = to.version();
                record.touch();
                self.store.upsert(record).map_err(WalletError::from)
            });
        match result {
            Ok(()) => info!(user_id = %record.user_id, from = %from, to = %to, "re-sealed private key"),
            Err(e) => warn!(user_id = %record.user_id, error = %e, "failed to re-seal private key"),
        }
    }

    pub fn set_language(&self, user_id: &UserId, language: &str) -> Result<String, WalletError> {
        let language = language.to_lowercase();
        if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
            return Err(WalletError::UnsupportedLanguage(language));
        }
        let mut record = self.require_record(user_id)?;
        record.language = language.clone();
        record.touch();
        self.store.upsert(&record)?;
        Ok(language)
    }

    pub fn toggle_notifications(&self, user_id: &UserId) -> Result<bool, WalletError> {
        let mut record = self.require_record(user_id)?;
        record.notifications_enabled = !record.notifications_enabled;
        record.touch();
        self.store.upsert(&record)?;
        Ok(record.notifications_enabled)
    }
}
