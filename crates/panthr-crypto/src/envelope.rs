//! Envelope wire format: `<32-hex-char-iv>:<hex-ciphertext>`

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::cipher::IV_SIZE;

/// Separator between the iv and the ciphertext fields
pub const DELIMITER: char = ':';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("missing '{DELIMITER}' delimiter")]
    MissingDelimiter,

    #[error("{field} is not valid hex")]
    InvalidHex { field: &'static str },

    #[error("iv must be {IV_SIZE} bytes, got {0}")]
    InvalidIvLength(usize),

    #[error("ciphertext is empty")]
    EmptyCiphertext,
}

/// Sealed secret as stored by the user store. Carries no key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(iv: [u8; IV_SIZE], ciphertext: Vec<u8>) -> Self {
        Self { iv, ciphertext }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", hex::encode(self.iv), DELIMITER, hex::encode(&self.ciphertext))
    }
}

impl FromStr for Envelope {
    type Err = EnvelopeError;

    /// Splits on the first delimiter; anything after it must be hex, so a
    /// second delimiter is rejected as invalid ciphertext hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (iv_hex, ct_hex) = s.split_once(DELIMITER).ok_or(EnvelopeError::MissingDelimiter)?;

        let iv = hex::decode(iv_hex).map_err(|_| EnvelopeError::InvalidHex { field: "iv" })?;
        let ciphertext = hex::decode(ct_hex).map_err(|_| EnvelopeError::InvalidHex { field: "ciphertext" })?;

        let iv: [u8; IV_SIZE] = iv
            .as_slice()
            .try_into()
            .map_err(|_| EnvelopeError::InvalidIvLength(iv.len()))?;
        if ciphertext.is_empty() {
            return Err(EnvelopeError::EmptyCiphertext);
        }

        Ok(Self { iv, ciphertext })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_two_hex_fields() {
        let envelope = Envelope::new([0xab; IV_SIZE], vec![0x01, 0xff]);
        assert_eq!(envelope.to_string(), format!("{}:01ff", "ab".repeat(IV_SIZE)));
    }

    #[test]
    fn test_parses_rendered_form() {
        let text = "000102030405060708090a0b0c0d0e0f:ef3c76962713909e508eec350843dc34";
        let envelope: Envelope = text.parse().unwrap();
        assert_eq!(envelope.iv[15], 0x0f);
        assert_eq!(envelope.ciphertext.len(), 16);
        assert_eq!(envelope.to_string(), text);
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let text = format!("{}:ABCD", "0A".repeat(IV_SIZE));
        let envelope: Envelope = text.parse().unwrap();
        assert_eq!(envelope.ciphertext, vec![0xab, 0xcd]);
    }

    #[test]
    fn test_rejects_structural_errors() {
        let iv = "00".repeat(IV_SIZE);
        assert_eq!("deadbeef".parse::<Envelope>(), Err(EnvelopeError::MissingDelimiter));
        assert_eq!(
            format!("zz{}:00", &iv[2..]).parse::<Envelope>(),
            Err(EnvelopeError::InvalidHex { field: "iv" })
        );
        assert_eq!(
            format!("{iv}:nothex").parse::<Envelope>(),
            Err(EnvelopeError::InvalidHex { field: "ciphertext" })
        );
        assert_eq!(
            format!("{iv}:00:11").parse::<Envelope>(),
            Err(EnvelopeError::InvalidHex { field: "ciphertext" })
        );
        assert_eq!("0011:2233".parse::<Envelope>(), Err(EnvelopeError::InvalidIvLength(2)));
        assert_eq!(format!("{iv}:").parse::<Envelope>(), Err(EnvelopeError::EmptyCiphertext));
    }
}
