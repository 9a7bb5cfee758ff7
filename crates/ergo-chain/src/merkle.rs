//! Blake2b-256 Merkle tree with inclusion proofs.
//!
//! Leaf and internal hashes are domain-separated with prefix bytes
//! (0x00 leaf, 0x01 internal); a node without a right sibling is hashed
//! alone under the internal prefix. The empty tree's root is the digest
//! of the empty byte string.

use crate::digest::{blake2b256, Digest32};

const LEAF_PREFIX: u8 = 0x00;
const INTERNAL_PREFIX: u8 = 0x01;

fn hash_leaf(data: &[u8]) -> Digest32 {
    let mut buf = Vec::with_capacity(1 + data.len());
    buf.push(LEAF_PREFIX);
    buf.extend_from_slice(data);
    blake2b256(&buf)
}

fn hash_internal(left: &Digest32, right: Option<&Digest32>) -> Digest32 {
    let mut buf = Vec::with_capacity(65);
    buf.push(INTERNAL_PREFIX);
    buf.extend_from_slice(left.as_ref());
    if let Some(right) = right {
        buf.extend_from_slice(right.as_ref());
    }
    blake2b256(&buf)
}

/// Which side a proof-level sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Sibling is the left child; the running hash is the right child.
    Left,
    /// Sibling is the right child; the running hash is the left child.
    Right,
}

/// One level of an inclusion proof: the sibling digest (absent when the
/// node was a lone child) and its side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelNode {
    /// Sibling digest, if the node had one at this level.
    pub hash: Option<Digest32>,
    /// Side the sibling sits on.
    pub side: Side,
}

/// Inclusion proof for a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Raw leaf data the proof commits to.
    pub leaf_data: Vec<u8>,
    /// Sibling path from the leaf up to the root.
    pub levels: Vec<LevelNode>,
}

impl MerkleProof {
    /// Check the proof against an expected root.
    pub fn valid(&self, expected_root: &Digest32) -> bool {
        let mut current = hash_leaf(&self.leaf_data);
        for level in &self.levels {
            current = match (&level.hash, level.side) {
                (Some(sibling), Side::Left) => hash_internal(sibling, Some(&current)),
                (Some(sibling), Side::Right) => hash_internal(&current, Some(sibling)),
                (None, _) => hash_internal(&current, None),
            };
        }
        current == *expected_root
    }
}

/// Merkle tree over a fixed, ordered set of leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    leaves: Vec<Vec<u8>>,
    /// levels[0] = leaf hashes, last level = [root].
    levels: Vec<Vec<Digest32>>,
}

impl MerkleTree {
    /// Build a tree from ordered leaf data.
    pub fn new(leaves: Vec<Vec<u8>>) -> Self {
        let mut levels: Vec<Vec<Digest32>> = Vec::new();
        if !leaves.is_empty() {
            let mut current: Vec<Digest32> = leaves.iter().map(|l| hash_leaf(l)).collect();
            levels.push(current.clone());
            while current.len() > 1 {
                let mut next = Vec::with_capacity(current.len().div_ceil(2));
                for pair in current.chunks(2) {
                    next.push(hash_internal(&pair[0], pair.get(1)));
                }
                levels.push(next.clone());
                current = next;
            }
        }
        Self { leaves, levels }
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Root hash of the tree.
    pub fn root_hash(&self) -> Digest32 {
        match self.levels.last() {
            Some(top) => top[0],
            None => blake2b256(&[]),
        }
    }

    /// Inclusion proof for the leaf at `index`, or `None` when out of
    /// bounds.
    pub fn proof_by_index(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }
        let mut levels = Vec::new();
        let mut pos = index;
        // Walk every level below the root.
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let sibling_pos = pos ^ 1;
            let side = if pos % 2 == 0 { Side::Right } else { Side::Left };
            levels.push(LevelNode {
                hash: level.get(sibling_pos).copied(),
                side,
            });
            pos /= 2;
        }
        Some(MerkleProof {
            leaf_data: self.leaves[index].clone(),
            levels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(count: usize) -> Vec<Vec<u8>> {
        (0..count).map(|i| vec![i as u8; 8]).collect()
    }

    #[test]
    fn test_empty_tree_root() {
        let tree = MerkleTree::new(Vec::new());
        assert_eq!(
            hex::encode(tree.root_hash().as_ref()),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_single_leaf_root_is_leaf_hash() {
        let tree = MerkleTree::new(vec![b"abc".to_vec()]);
        assert_eq!(tree.root_hash(), hash_leaf(b"abc"));
    }

    #[test]
    fn test_proofs_verify_for_all_leaves() {
        for count in 1..=9 {
            let tree = MerkleTree::new(leaves(count));
            let root = tree.root_hash();
            for i in 0..count {
                let proof = tree.proof_by_index(i).unwrap();
                assert!(proof.valid(&root), "leaf {i} of {count} failed");
            }
        }
    }

    #[test]
    fn test_proof_rejects_wrong_root() {
        let tree = MerkleTree::new(leaves(4));
        let proof = tree.proof_by_index(2).unwrap();
        assert!(!proof.valid(&Digest32::from([0xFFu8; 32])));
    }

    #[test]
    fn test_proof_rejects_tampered_leaf() {
        let tree = MerkleTree::new(leaves(4));
        let root = tree.root_hash();
        let mut proof = tree.proof_by_index(1).unwrap();
        proof.leaf_data[0] ^= 1;
        assert!(!proof.valid(&root));
    }

    #[test]
    fn test_proof_out_of_bounds() {
        let tree = MerkleTree::new(leaves(3));
        assert!(tree.proof_by_index(3).is_none());
    }

    #[test]
    fn test_root_changes_with_leaf_order() {
        let a = MerkleTree::new(vec![b"x".to_vec(), b"y".to_vec()]);
        let b = MerkleTree::new(vec![b"y".to_vec(), b"x".to_vec()]);
        assert_ne!(a.root_hash(), b.root_hash());
    }
}
