//! Secret vault - per-user encryption of secrets at rest
//!
//! The vault holds only the server secret. Every seal/open re-derives the
//! user's key from `(user_id, server_secret)` and drops it when the call
//! returns, so the vault is stateless and can be shared across threads.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher::{self, CipherError};
use crate::envelope::{Envelope, EnvelopeError};
use crate::kdf::{self, DerivedKey, DEFAULT_PBKDF2_ITERATIONS};

/// Environment variable holding the server secret
pub const SERVER_SECRET_ENV: &str = "SECRET_KEY";

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),
    #[error("Authentication failed: wrong identity, wrong server secret or corrupted envelope")]
    AuthenticationFailure,
    #[error("User id must not be empty")]
    EmptyUserId,
    #[error("Decrypted secret is not valid UTF-8")]
    NotUtf8,
    #[error("Encryption error: {0}")]
    Encryption(CipherError),
}

/// Key derivation + cipher pair used to produce an envelope.
///
/// The envelope string does not say which scheme made it; callers persist
/// [`Scheme::version`] next to the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// SHA-256 hex-prefix key, AES-256-CBC. Readable by the first bot release.
    LegacyCbc,
    /// PBKDF2-HMAC-SHA256 key, AES-256-GCM with the user id as associated data.
    #[default]
    Aead,
}

impl Scheme {
    pub fn version(self) -> u8 {
        match self {
            Scheme::LegacyCbc => 1,
            Scheme::Aead => 2,
        }
    }

    pub fn from_version(version: u8) -> Option<Self> {
        match version {
            1 => Some(Scheme::LegacyCbc),
            2 => Some(Scheme::Aead),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::LegacyCbc => "legacy-cbc",
            Scheme::Aead => "aead",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy-cbc" | "legacy" | "1" => Ok(Scheme::LegacyCbc),
            "aead" | "2" => Ok(Scheme::Aead),
            other => Err(format!("unknown envelope scheme '{other}' (expected 'aead' or 'legacy-cbc')")),
        }
    }
}

pub struct SecretVault {
    server_secret: SecretString,
    scheme: Scheme,
    iterations: NonZeroU32,
}

impl SecretVault {
    /// Build a vault around the server secret. An empty secret is a
    /// configuration error, never a per-call one.
    pub fn new(server_secret: SecretString) -> Result<Self, VaultError> {
        if server_secret.expose_secret().is_empty() {
            return Err(VaultError::Configuration("server secret is empty".into()));
        }
        Ok(Self {
            server_secret,
            scheme: Scheme::default(),
            iterations: NonZeroU32::new(DEFAULT_PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN),
        })
    }

    /// Build a vault from `SECRET_KEY`
    pub fn from_env() -> Result<Self, VaultError> {
        let secret = std::env::var(SERVER_SECRET_ENV)
            .map_err(|_| VaultError::Configuration(format!("{SERVER_SECRET_ENV} is not set")))?;
        Self::new(SecretString::new(secret))
    }

    /// Scheme used by [`seal`](Self::seal) and [`open`](Self::open)
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// PBKDF2 work factor for the AEAD scheme
    pub fn with_kdf_iterations(mut self, iterations: NonZeroU32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn derive_key(&self, user_id: &str, scheme: Scheme) -> Result<DerivedKey, VaultError> {
        if user_id.is_empty() {
            return Err(VaultError::EmptyUserId);
        }
        let secret = self.server_secret.expose_secret();
        Ok(match scheme {
            Scheme::LegacyCbc => kdf::derive_legacy(user_id, secret),
            Scheme::Aead => kdf::derive_pbkdf2(user_id, secret, self.iterations),
        })
    }

    pub fn seal(&self, plaintext: &[u8], user_id: &str) -> Result<String, VaultError> {
        self.seal_with(self.scheme, plaintext, user_id)
    }

    pub fn seal_with(&self, scheme: Scheme, plaintext: &[u8], user_id: &str) -> Result<String, VaultError> {
        let key = self.derive_key(user_id, scheme)?;
        let iv = cipher::generate_iv().map_err(VaultError::Encryption)?;
        let ciphertext = match scheme {
            Scheme::LegacyCbc => cipher::cbc_encrypt(key.as_bytes(), &iv, plaintext),
            Scheme::Aead => cipher::gcm_encrypt(key.as_bytes(), &iv, plaintext, user_id.as_bytes()),
        }
        .map_err(VaultError::Encryption)?;

        debug!(scheme = %scheme, ciphertext_len = ciphertext.len(), "sealed secret");
        Ok(Envelope::new(iv, ciphertext).to_string())
    }

    pub fn open(&self, envelope: &str, user_id: &str) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        self.open_with(self.scheme, envelope, user_id)
    }

    pub fn open_with(&self, scheme: Scheme, envelope: &str, user_id: &str) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let envelope: Envelope = envelope.parse()?;
        let key = self.derive_key(user_id, scheme)?;
        let plaintext = match scheme {
            Scheme::LegacyCbc => cipher::cbc_decrypt(key.as_bytes(), &envelope.iv, &envelope.ciphertext),
            Scheme::Aead => cipher::gcm_decrypt(key.as_bytes(), &envelope.iv, &envelope.ciphertext, user_id.as_bytes()),
        }
        .map_err(|e| {
            debug!(scheme = %scheme, error = %e, "failed to open envelope");
            VaultError::AuthenticationFailure
        })?;

        Ok(plaintext)
    }

    /// Open and require the plaintext to be UTF-8
    pub fn open_string(&self, scheme: Scheme, envelope: &str, user_id: &str) -> Result<Zeroizing<String>, VaultError> {
        let mut bytes = self.open_with(scheme, envelope, user_id)?;
        let text = String::from_utf8(std::mem::take(&mut *bytes)).map_err(|e| {
            drop(Zeroizing::new(e.into_bytes()));
            VaultError::NotUtf8
        })?;
        Ok(Zeroizing::new(text))
    }

    /// Re-encrypt an envelope written under `from` with the vault's scheme
    pub fn reseal(&self, from: Scheme, envelope: &str, user_id: &str) -> Result<String, VaultError> {
        let plaintext = self.open_with(from, envelope, user_id)?;
        self.seal(&plaintext, user_id)
    }
}

impl fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretVault")
            .field("scheme", &self.scheme)
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}
