//! Per-user key derivation.
//!
//! Both derivations are deterministic in `(user_id, server_secret)`; nothing
//! they produce is ever persisted.

use std::num::NonZeroU32;

use ring::{digest, pbkdf2};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::KEY_SIZE;

/// Domain separator prefixed to the user id to form the PBKDF2 salt.
pub const PBKDF2_SALT_PREFIX: &[u8] = b"panthr-vault/v2\0";

/// Default PBKDF2-HMAC-SHA256 work factor.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// 256-bit key derived from a user identity and the server secret.
///
/// Zeroized on drop. Deliberately neither `Clone` nor `Debug`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        ring::constant_time::verify_slices_are_equal(&self.0, &other.0).is_ok()
    }
}

impl Eq for DerivedKey {}

/// First-generation derivation: SHA-256 over `user_id || server_secret`,
/// keeping the first 32 characters of the lower-case hex digest as the raw
/// key bytes. Kept byte-for-byte so envelopes written by the old bot still
/// open; it is a plain hash, not a stretching function.
pub fn derive_legacy(user_id: &str, server_secret: &str) -> DerivedKey {
    let mut ctx = digest::Context::new(&digest::SHA256);
    ctx.update(user_id.as_bytes());
    ctx.update(server_secret.as_bytes());
    let digest = ctx.finish();

    let mut hex_digest = hex::encode(digest.as_ref());
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&hex_digest.as_bytes()[..KEY_SIZE]);
    hex_digest.zeroize();
    DerivedKey(key)
}

/// PBKDF2-HMAC-SHA256 with the server secret as password and
/// `PBKDF2_SALT_PREFIX || user_id` as salt.
pub fn derive_pbkdf2(user_id: &str, server_secret: &str, iterations: NonZeroU32) -> DerivedKey {
    let mut salt = Vec::with_capacity(PBKDF2_SALT_PREFIX.len() + user_id.len());
    salt.extend_from_slice(PBKDF2_SALT_PREFIX);
    salt.extend_from_slice(user_id.as_bytes());

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        server_secret.as_bytes(),
        &mut key,
    );
    DerivedKey(key)
}
