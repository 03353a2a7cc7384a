//! Panthr Crypto - per-user secret vault
//!
//! This crate provides:
//! - Key derivation from a user identity and the server secret
//! - AES-256-GCM (current) and AES-256-CBC (legacy) envelopes
//! - The `hex(iv):hex(ciphertext)` envelope codec

pub mod cipher;
pub mod envelope;
pub mod kdf;
pub mod vault;

pub use envelope::{Envelope, EnvelopeError};
pub use kdf::DerivedKey;
pub use vault::{Scheme, SecretVault, VaultError, SERVER_SECRET_ENV};
