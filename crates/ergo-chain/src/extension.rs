//! Block extension: an ordered sequence of key-value fields committed to
//! by the header's `extension_root`.
//!
//! Structural rules enforced here: keys are exactly 2 bytes (by type),
//! values are at most 64 bytes, keys are unique. Field order is
//! significant: it determines the Merkle digest.

use crate::digest::Digest32;
use crate::merkle::{MerkleProof, MerkleTree};
use crate::SerializationError;
use std::collections::HashSet;

/// Extension field key size (bytes).
pub const FIELD_KEY_SIZE: usize = 2;

/// Maximum extension field value size (bytes).
pub const FIELD_VALUE_MAX_SIZE: usize = 64;

/// Extension field (key-value pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionField {
    /// Field key (exactly 2 bytes).
    pub key: [u8; FIELD_KEY_SIZE],
    /// Field value (0-64 bytes).
    pub value: Vec<u8>,
}

impl ExtensionField {
    /// Create a new extension field.
    pub fn new(key: [u8; FIELD_KEY_SIZE], value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Merkle leaf encoding: `key_length ++ key ++ value`.
    fn to_leaf(&self) -> Vec<u8> {
        let mut leaf = Vec::with_capacity(1 + FIELD_KEY_SIZE + self.value.len());
        leaf.push(FIELD_KEY_SIZE as u8);
        leaf.extend_from_slice(&self.key);
        leaf.extend_from_slice(&self.value);
        leaf
    }
}

/// Candidate extension: ordered fields plus Merkle capability, before the
/// owning block exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCandidate {
    fields: Vec<ExtensionField>,
}

impl ExtensionCandidate {
    /// Build a candidate, enforcing the structural rules.
    pub fn new(fields: Vec<ExtensionField>) -> Result<Self, SerializationError> {
        let mut seen_keys = HashSet::new();
        for (i, field) in fields.iter().enumerate() {
            if field.value.len() > FIELD_VALUE_MAX_SIZE {
                return Err(SerializationError::MalformedField(format!(
                    "extension field {} value too long: {} bytes, max {}",
                    i,
                    field.value.len(),
                    FIELD_VALUE_MAX_SIZE
                )));
            }
            if !seen_keys.insert(field.key) {
                return Err(SerializationError::MalformedField(format!(
                    "duplicate extension key: {:02x}{:02x}",
                    field.key[0], field.key[1]
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Empty candidate (valid for genesis only at the consensus level).
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Ordered fields.
    pub fn fields(&self) -> &[ExtensionField] {
        &self.fields
    }

    /// Look up a field value by key.
    pub fn get(&self, key: &[u8; FIELD_KEY_SIZE]) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|f| &f.key == key)
            .map(|f| f.value.as_slice())
    }

    /// Merkle digest over the ordered fields.
    pub fn digest(&self) -> Digest32 {
        self.merkle_tree().root_hash()
    }

    /// Inclusion proof for the field with the given key.
    pub fn proof_for_key(&self, key: &[u8; FIELD_KEY_SIZE]) -> Option<MerkleProof> {
        let index = self.fields.iter().position(|f| &f.key == key)?;
        self.merkle_tree().proof_by_index(index)
    }

    fn merkle_tree(&self) -> MerkleTree {
        MerkleTree::new(self.fields.iter().map(ExtensionField::to_leaf).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ExtensionCandidate {
        ExtensionCandidate::new(vec![
            ExtensionField::new([0x00, 0x01], vec![0x11, 0x22, 0x33]),
            ExtensionField::new([0x01, 0x00], vec![0x44; 33]),
            ExtensionField::new([0x01, 0x01], vec![0x55; 33]),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_by_key() {
        let ext = candidate();
        assert_eq!(ext.get(&[0x00, 0x01]), Some(&[0x11, 0x22, 0x33][..]));
        assert_eq!(ext.get(&[0x09, 0x09]), None);
    }

    #[test]
    fn test_rejects_value_too_long() {
        let result = ExtensionCandidate::new(vec![ExtensionField::new([0, 1], vec![0u8; 65])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let result = ExtensionCandidate::new(vec![
            ExtensionField::new([0, 1], vec![0x11]),
            ExtensionField::new([0, 1], vec![0x22]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_digest_sensitive_to_order() {
        let a = ExtensionCandidate::new(vec![
            ExtensionField::new([0, 1], vec![1]),
            ExtensionField::new([0, 2], vec![2]),
        ])
        .unwrap();
        let b = ExtensionCandidate::new(vec![
            ExtensionField::new([0, 2], vec![2]),
            ExtensionField::new([0, 1], vec![1]),
        ])
        .unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_proof_for_key_verifies() {
        let ext = candidate();
        let root = ext.digest();
        let proof = ext.proof_for_key(&[0x01, 0x01]).unwrap();
        assert!(proof.valid(&root));
        assert!(ext.proof_for_key(&[0x07, 0x07]).is_none());
    }

    #[test]
    fn test_empty_candidate() {
        let ext = ExtensionCandidate::empty();
        assert!(ext.fields().is_empty());
        // Digest of the empty field set is the empty-input digest.
        assert_eq!(
            hex::encode(ext.digest().as_ref()),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}
