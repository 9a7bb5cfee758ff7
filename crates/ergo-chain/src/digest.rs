//! Digest and identifier newtypes.
//!
//! All ids on the wire are raw 32-byte Blake2b-256 digests; in logs,
//! JSON, and config they are rendered as lowercase hex.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Compute a Blake2b-256 digest.
pub fn blake2b256(data: &[u8]) -> Digest32 {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&result);
    Digest32(arr)
}

/// 32-byte digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    /// All-zero digest.
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// View as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest32({})", hex::encode(self.0))
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("expected 32-byte hex digest"))?;
        Ok(Self(arr))
    }
}

/// 33-byte authenticated-dictionary digest (root hash plus tree height).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ADDigest(pub [u8; 33]);

impl ADDigest {
    /// All-zero digest.
    pub fn zero() -> Self {
        Self([0u8; 33])
    }
}

impl From<[u8; 33]> for ADDigest {
    fn from(bytes: [u8; 33]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ADDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ADDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADDigest({})", hex::encode(self.0))
    }
}

/// Block identifier: the Blake2b-256 digest of the header bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub Digest32);

impl BlockId {
    /// All-zero id (parent of the genesis header).
    pub fn zero() -> Self {
        Self(Digest32::zero())
    }

    /// View as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<[u8; 32]> for BlockId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(Digest32(bytes))
    }
}

impl AsRef<[u8]> for BlockId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// Miner votes on protocol parameters (3 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Votes(pub [u8; 3]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake2b256_known_empty() {
        // blake2b256 of the empty input, as pinned by the extension rules.
        let digest = blake2b256(&[]);
        assert_eq!(
            hex::encode(digest.0),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_block_id_display_roundtrip() {
        let id = BlockId::from([0xABu8; 32]);
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 64);
        assert!(rendered.starts_with("abab"));
    }

    #[test]
    fn test_digest_serde_hex() {
        let digest = Digest32::from([0x01u8; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: Digest32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_digest_serde_rejects_bad_length() {
        let err = serde_json::from_str::<Digest32>("\"0011\"");
        assert!(err.is_err());
    }
}
