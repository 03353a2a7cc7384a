//! Block cipher primitives behind the vault schemes
//!
//! - AES-256-GCM with a 16-byte nonce for current envelopes
//! - AES-256-CBC with PKCS#7 padding for envelopes written by the first
//!   generation of the bot

use aes::Aes256;
use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit, Payload},
    AesGcm, Nonce,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroizing;

/// 256-bit key (32 bytes)
pub const KEY_SIZE: usize = 32;
/// 128-bit initialization vector (16 bytes), shared by both ciphers
pub const IV_SIZE: usize = 16;
/// GCM authentication tag length appended to the ciphertext
pub const TAG_SIZE: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed - data may be corrupted or tampered")]
    DecryptionFailed,

    #[error("Invalid key size: expected {KEY_SIZE}, got {0}")]
    InvalidKeySize(usize),

    #[error("Invalid IV size: expected {IV_SIZE}, got {0}")]
    InvalidIvSize(usize),

    #[error("System random number generator failed")]
    Rng,
}

/// Generate a fresh IV from the OS random source
pub fn generate_iv() -> Result<[u8; IV_SIZE], CipherError> {
    let mut iv = [0u8; IV_SIZE];
    SystemRandom::new().fill(&mut iv).map_err(|_| CipherError::Rng)?;
    Ok(iv)
}

fn check_sizes(key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
    if key.len() != KEY_SIZE {
        return Err(CipherError::InvalidKeySize(key.len()));
    }
    if iv.len() != IV_SIZE {
        return Err(CipherError::InvalidIvSize(iv.len()));
    }
    Ok(())
}

/// Encrypt with AES-256-GCM.
///
/// Returns ciphertext || tag. `aad` is authenticated but not encrypted.
pub fn gcm_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_sizes(key, iv)?;
    let cipher = Aes256Gcm16::new_from_slice(key).map_err(|_| CipherError::InvalidKeySize(key.len()))?;
    cipher
        .encrypt(Nonce::<U16>::from_slice(iv), Payload { msg: plaintext, aad })
        .map_err(|_| CipherError::EncryptionFailed)
}

/// Decrypt ciphertext || tag produced by [`gcm_encrypt`]
pub fn gcm_decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    check_sizes(key, iv)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(CipherError::DecryptionFailed);
    }
    let cipher = Aes256Gcm16::new_from_slice(key).map_err(|_| CipherError::InvalidKeySize(key.len()))?;
    let plaintext = cipher
        .decrypt(Nonce::<U16>::from_slice(iv), Payload { msg: ciphertext, aad })
        .map_err(|_| CipherError::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

/// Encrypt with AES-256-CBC and PKCS#7 padding (no integrity)
pub fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_sizes(key, iv)?;
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| CipherError::EncryptionFailed)?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt AES-256-CBC. A bad padding block is the only failure signal this
/// mode has, so a wrong key decrypts to garbage roughly 1 time in 256.
pub fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    check_sizes(key, iv)?;
    let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CipherError::DecryptionFailed)?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}
