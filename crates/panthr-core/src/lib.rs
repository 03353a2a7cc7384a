//! Panthr Core - wallet service, command table and collaborator contracts
//!
//! This crate contains the logic shared by every Panthr frontend
//! (Telegram, the operator CLI, anything added later).

pub mod account;
pub mod commands;
pub mod record;
pub mod store;
pub mod wallet;

pub use account::{Account, AccountError, AccountProvider, CommandAccountProvider};
pub use commands::{CommandKind, CommandSpec, COMMANDS};
pub use record::{UserId, UserSecretRecord, SUPPORTED_LANGUAGES};
pub use store::{StoreError, UserStore};
pub use wallet::{WalletError, WalletService};
