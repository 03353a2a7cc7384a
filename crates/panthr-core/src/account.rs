//! Account SDK seam
//!
//! Key-pair generation and address derivation live outside this workspace.
//! The bot only needs "make me an account" and "validate this private key",
//! and gets both from an external account CLI.

use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

const PRIVATE_KEY_PREFIX: &str = "APrivateKey1";
const VIEW_KEY_PREFIX: &str = "AViewKey1";
const ADDRESS_PREFIX: &str = "aleo1";

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Account tool failed: {0}")]
    Tool(String),
    #[error("Account tool output is missing the {0}")]
    MissingField(&'static str),
}

/// Key material of one account
pub struct Account {
    pub private_key: Zeroizing<String>,
    pub view_key: String,
    pub address: String,
}

pub trait AccountProvider: Send + Sync {
    /// Generate a fresh account
    fn create(&self) -> Result<Account, AccountError>;

    /// Derive view key and address from an existing private key
    fn import(&self, private_key: &str) -> Result<Account, AccountError>;
}

/// Runs an account CLI, `snarkos` by default:
/// `snarkos account new` and `snarkos account import <private-key>`.
#[derive(Debug, Clone)]
pub struct CommandAccountProvider {
    program: String,
    new_args: Vec<String>,
    import_args: Vec<String>,
}

impl Default for CommandAccountProvider {
    fn default() -> Self {
        Self::new("snarkos")
    }
}

impl CommandAccountProvider {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            new_args: vec!["account".into(), "new".into()],
            import_args: vec!["account".into(), "import".into()],
        }
    }

    fn run(&self, args: &[&str]) -> Result<Zeroizing<String>, AccountError> {
        debug!(program = %self.program, subcommand = ?args.first(), "running account tool");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| AccountError::Tool(format!("failed to spawn '{}': {}", self.program, e)))?;

        if !output.status.success() {
            return Err(AccountError::Tool(format!("'{}' exited with {}", self.program, output.status)));
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| AccountError::Tool("output is not UTF-8".into()))?;
        Ok(Zeroizing::new(stdout))
    }
}

impl AccountProvider for CommandAccountProvider {
    fn create(&self) -> Result<Account, AccountError> {
        let args: Vec<&str> = self.new_args.iter().map(String::as_str).collect();
        parse_account(&self.run(&args)?)
    }

    fn import(&self, private_key: &str) -> Result<Account, AccountError> {
        let private_key = private_key.trim();
        if !looks_like_private_key(private_key) {
            return Err(AccountError::InvalidPrivateKey);
        }
        let mut args: Vec<&str> = self.import_args.iter().map(String::as_str).collect();
        args.push(private_key);

        let account = parse_account(&self.run(&args)?)?;
        if account.private_key.as_str() != private_key {
            return Err(AccountError::InvalidPrivateKey);
        }
        Ok(account)
    }
}

pub fn looks_like_private_key(candidate: &str) -> bool {
    candidate.starts_with(PRIVATE_KEY_PREFIX)
        && candidate.len() > PRIVATE_KEY_PREFIX.len()
        && candidate.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Pick the private key, view key and address tokens out of the tool's
/// human-readable output, wherever they appear.
pub fn parse_account(output: &str) -> Result<Account, AccountError> {
    let find = |prefix: &str| {
        output
            .split(|c: char| c.is_whitespace() || c == ':' || c == '"' || c == ',')
            .find(|token| token.starts_with(prefix) && token.len() > prefix.len())
    };

    let private_key = find(PRIVATE_KEY_PREFIX).ok_or(AccountError::MissingField("private key"))?;
    let view_key = find(VIEW_KEY_PREFIX).ok_or(AccountError::MissingField("view key"))?;
    let address = find(ADDRESS_PREFIX).ok_or(AccountError::MissingField("address"))?;

    Ok(Account {
        private_key: Zeroizing::new(private_key.to_string()),
        view_key: view_key.to_string(),
        address: address.to_string(),
    })
}
