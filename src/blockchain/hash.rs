use std::fmt;

use hex::FromHex;
use sha2::{Digest, Sha256};

use crate::error::{ChainError, Result};

/// SHA-256 digest of a block's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

impl Blockhash {
    /// Hash arbitrary content.
    pub fn digest_of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    /// Parse a 64-character hex digest. Any other length is an error.
    pub fn from_hex(hash: &str) -> Result<Self> {
        <[u8; 32]>::from_hex(hash)
            .map(Self)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    /// Bit `bit` of the digest, counted from the most significant bit of byte 0.
    pub fn is_zero_bit(&self, bit: u8) -> bool {
        let byte = self.0[usize::from(bit / 8)];
        (byte >> (7 - bit % 8)) & 1 == 0
    }

    /// True when the first `difficulty` bits are all zero.
    pub fn meets_difficulty(&self, difficulty: u8) -> bool {
        (0..difficulty).all(|bit| self.is_zero_bit(bit))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::Blockhash;

    #[test]
    fn hex_round_trip() {
        let h = Blockhash::digest_of(b"hello chain");
        let hex = h.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hex.to_lowercase());
        assert_eq!(Blockhash::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(Blockhash::from_hex("zz").is_err());
        assert!(Blockhash::from_hex(&"0".repeat(62)).is_err());
        assert!(Blockhash::from_hex(&"0".repeat(66)).is_err());
        assert!(Blockhash::from_hex(&format!("{}g", "0".repeat(63))).is_err());
        assert!(Blockhash::from_hex("").is_err());
    }

    #[test]
    fn bits_are_numbered_from_msb() {
        // 0x20 = 0010_0000: bits 0 and 1 are zero, bit 2 is one
        let mut hex = String::from("20");
        hex.push_str(&"ff".repeat(31));
        let h = Blockhash::from_hex(&hex).unwrap();
        assert!(h.is_zero_bit(0));
        assert!(h.is_zero_bit(1));
        assert!(!h.is_zero_bit(2));
        assert!(h.meets_difficulty(0));
        assert!(h.meets_difficulty(2));
        assert!(!h.meets_difficulty(3));
    }

    #[test]
    fn zero_digest_meets_any_difficulty() {
        let h = Blockhash::from_hex(&"0".repeat(64)).unwrap();
        assert!(h.meets_difficulty(255));
        assert!(h.is_zero_bit(255));
    }
}
