pub mod merkle;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

/// A 32-byte SHA-256 digest, rendered as 64 lowercase hex characters.
///
/// Used for transaction ids, block hashes and recipient commitments alike.
/// The all-zero digest is reserved: it marks the genesis predecessor and the
/// coinbase input's previous transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The reserved all-zero digest.
    pub const NULL: Hash256 = Hash256([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// True when the digest starts with at least `n` zero hex characters
    /// (i.e. `4 * n` leading zero bits).
    pub fn leading_zero_hex(&self, n: usize) -> bool {
        let full = n / 2;
        if self.0[..full].iter().any(|b| *b != 0) {
            return false;
        }
        if n % 2 == 1 && self.0[full] & 0xf0 != 0 {
            return false;
        }
        true
    }
}

/// Hash arbitrary bytes with SHA-256.
pub fn sha256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid digest hex: {0}")]
pub struct ParseHashError(String);

impl FromStr for Hash256 {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ParseHashError(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseHashError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // FIPS 180-2 test vector for "abc"
        assert_eq!(
            sha256(b"abc").to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        let h = Hash256::from_bytes([0x0a; 32]);
        let s = h.to_string();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c == '0' || c == 'a'));
    }

    #[test]
    fn hex_round_trip() {
        let h = sha256(b"round trip");
        let parsed: Hash256 = h.to_string().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn null_digest_is_all_zero_hex() {
        assert_eq!(Hash256::NULL.to_string(), "0".repeat(64));
        assert!(Hash256::NULL.is_null());
        assert!(!sha256(b"x").is_null());
    }

    #[test]
    fn leading_zero_hex_counts_nibbles() {
        let mut bytes = [0u8; 32];
        bytes[2] = 0x0f; // hex: 00000f...
        let h = Hash256::from_bytes(bytes);
        assert!(h.leading_zero_hex(4));
        assert!(h.leading_zero_hex(5));
        assert!(!h.leading_zero_hex(6));
    }

    #[test]
    fn serde_round_trip_as_hex_string() {
        let h = sha256(b"serde");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h));
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!("xyz".parse::<Hash256>().is_err());
        assert!("00".parse::<Hash256>().is_err()); // wrong length
    }
}
