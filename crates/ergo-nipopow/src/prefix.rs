//! Detachable NiPoPoW proof prefix.
//!
//! When the large prefix and the short suffix travel separately, the
//! prefix is shipped in this form together with the id of the suffix
//! head it belongs to.

use crate::error::{NipopowError, NipopowResult};
use crate::popow_header::PoPowHeader;
use crate::proof::NipopowProof;
use ergo_chain::serialization::{ByteReader, ByteWriter};
use ergo_chain::{BlockId, ModifierType};

/// Prefix-only variant of a NiPoPoW proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NipopowProofPrefix {
    /// Security parameter used to generate the proof.
    pub m: u32,
    /// Prefix headers, height-ascending.
    pub chain: Vec<PoPowHeader>,
    /// Id of the suffix head this prefix anchors.
    pub suffix_id: BlockId,
}

impl NipopowProofPrefix {
    /// Network modifier type id of serialized prefixes.
    pub const MODIFIER_TYPE: ModifierType = ModifierType::NipopowProofPrefix;

    /// Create a new proof prefix.
    pub fn new(m: u32, chain: Vec<PoPowHeader>, suffix_id: BlockId) -> Self {
        Self {
            m,
            chain,
            suffix_id,
        }
    }

    /// Genesis id claimed by this prefix.
    pub fn genesis_id(&self) -> Option<BlockId> {
        self.chain.first().map(PoPowHeader::id)
    }

    /// Structural validity: non-empty, monotone heights, linked headers.
    pub fn is_valid(&self) -> bool {
        if self.chain.is_empty() {
            return false;
        }
        let heights_ok = self
            .chain
            .windows(2)
            .all(|pair| pair[0].height() < pair[1].height());
        let connections_ok = self.chain.windows(2).all(|pair| {
            pair[1].interlinks.contains(&pair[0].id())
                || pair[1].header.parent_id == pair[0].id()
        });
        heights_ok && connections_ok
    }

    /// Serialize to the wire format (modifier type id 111).
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(64 + 256 * self.chain.len());
        w.put_u32(self.m);
        w.put_bytes(self.suffix_id.as_bytes());
        w.put_u32(self.chain.len() as u32);
        for popow in &self.chain {
            let bytes = popow.serialize();
            w.put_u32(bytes.len() as u32);
            w.put_bytes(&bytes);
        }
        w.into_bytes()
    }

    /// Parse from the exact wire encoding.
    pub fn parse(data: &[u8]) -> NipopowResult<Self> {
        let mut r = ByteReader::new(data);
        let m = r.get_u32()?;
        let suffix_id = BlockId::from(r.get_array_32()?);
        let count = r.get_count(2)?;
        let mut chain = Vec::with_capacity(count);
        for _ in 0..count {
            let len = r.get_u32()? as usize;
            let bytes = r.get_bytes(len)?;
            chain.push(PoPowHeader::parse(bytes)?);
        }
        if !r.is_finished() {
            return Err(NipopowError::MalformedProof(format!(
                "{} trailing bytes after proof prefix",
                r.remaining()
            )));
        }
        Ok(Self {
            m,
            chain,
            suffix_id,
        })
    }
}

impl NipopowProof {
    /// Detach the prefix (including the suffix head) for separate
    /// propagation.
    pub fn to_prefix(&self) -> NipopowProofPrefix {
        NipopowProofPrefix::new(self.m, self.prefix.clone(), self.suffix_head.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_popow_header;

    fn sample_prefix() -> NipopowProofPrefix {
        let genesis = make_popow_header(1, None, vec![]);
        let block2 = make_popow_header(4, Some(&genesis), vec![genesis.id()]);
        let suffix_id = BlockId::from([0xCCu8; 32]);
        NipopowProofPrefix::new(6, vec![genesis, block2], suffix_id)
    }

    #[test]
    fn test_prefix_valid() {
        assert!(sample_prefix().is_valid());
    }

    #[test]
    fn test_prefix_invalid_when_unordered() {
        let mut prefix = sample_prefix();
        prefix.chain.swap(0, 1);
        assert!(!prefix.is_valid());
    }

    #[test]
    fn test_prefix_invalid_when_empty() {
        let prefix = NipopowProofPrefix::new(6, vec![], BlockId::zero());
        assert!(!prefix.is_valid());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let prefix = sample_prefix();
        let parsed = NipopowProofPrefix::parse(&prefix.serialize()).unwrap();
        assert_eq!(parsed, prefix);
    }

    #[test]
    fn test_parse_rejects_truncated() {
        let bytes = sample_prefix().serialize();
        assert!(NipopowProofPrefix::parse(&bytes[..bytes.len() - 1]).is_err());
        assert!(NipopowProofPrefix::parse(&bytes[..10]).is_err());
    }

    #[test]
    fn test_from_proof_carries_suffix_id() {
        let genesis = make_popow_header(1, None, vec![]);
        let block2 = make_popow_header(2, Some(&genesis), vec![genesis.id()]);
        let head = make_popow_header(3, Some(&block2), vec![genesis.id(), block2.id()]);
        let proof = NipopowProof::new(6, 1, vec![genesis, block2], head.clone(), vec![]);
        let prefix = proof.to_prefix();
        assert_eq!(prefix.suffix_id, head.id());
        assert_eq!(prefix.m, 6);
        assert_eq!(prefix.chain.len(), 2);
        assert!(prefix.is_valid());
    }
}
