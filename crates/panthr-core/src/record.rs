//! User identity and the per-user wallet record

use std::fmt;

use chrono::{DateTime, Utc};
use panthr_crypto::Scheme;
use serde::{Deserialize, Serialize};

/// Languages the bot accepts in `/set_language`
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "fr"];

pub const DEFAULT_LANGUAGE: &str = "en";

/// Opaque user identifier. Key derivation treats it as an exact byte
/// string, so numeric chat ids always go through `From<u64>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for UserId {
    fn from(chat_id: u64) -> Self {
        Self(chat_id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the store keeps for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSecretRecord {
    pub user_id: UserId,
    /// `hex(iv):hex(ciphertext)` of the wallet private key
    #[serde(skip_serializing)]
    pub envelope: String,
    /// Version of the scheme that produced `envelope`
    pub envelope_version: u8,
    pub public_address: String,
    pub view_key: String,
    pub language: String,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSecretRecord {
    pub fn new(
        user_id: UserId,
        envelope: String,
        scheme: Scheme,
        public_address: String,
        view_key: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            envelope,
            envelope_version: scheme.version(),
            public_address,
            view_key,
            language: DEFAULT_LANGUAGE.to_string(),
            notifications_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scheme of the stored envelope, `None` for an unknown version
    pub fn scheme(&self) -> Option<Scheme> {
        Scheme::from_version(self.envelope_version)
    }

    /// Swap in new key material, keeping language and notification settings
    pub fn replace_wallet(&mut self, envelope: String, scheme: Scheme, public_address: String, view_key: String) {
        self.envelope = envelope;
        self.envelope_version = scheme.version();
        self.public_address = public_address;
        self.view_key = view_key;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
