//! Block header and its deterministic byte encoding.
//!
//! The header id is the Blake2b-256 digest of the serialized header, so
//! the encoding below is a consensus surface: two nodes that serialize a
//! header differently disagree on every id derived from it.

use crate::digest::{blake2b256, ADDigest, BlockId, Digest32, Votes};
use crate::serialization::{ByteReader, ByteWriter};
use crate::SerializationError;

/// Height of the genesis header.
pub const GENESIS_HEIGHT: u32 = 1;

/// Network modifier (block section) type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierType {
    /// Block header.
    Header = 101,
    /// NiPoPoW proof.
    NipopowProof = 105,
    /// Block extension.
    Extension = 108,
    /// Detached NiPoPoW proof prefix.
    NipopowProofPrefix = 111,
}

impl ModifierType {
    /// Create from byte value.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            101 => Some(Self::Header),
            105 => Some(Self::NipopowProof),
            108 => Some(Self::Extension),
            111 => Some(Self::NipopowProofPrefix),
            _ => None,
        }
    }

    /// Convert to byte value.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Autolykos v2 Proof-of-Work solution carried in a header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AutolykosSolution {
    /// Miner public key (compressed EC point).
    pub miner_pk: [u8; 33],
    /// Mining nonce.
    pub nonce: [u8; 8],
}

impl Default for AutolykosSolution {
    fn default() -> Self {
        Self {
            miner_pk: [0u8; 33],
            nonce: [0u8; 8],
        }
    }
}

/// Block header.
///
/// `n_bits` carries the required difficulty in compact form; `height`
/// starts at [`GENESIS_HEIGHT`] for the genesis header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    /// Protocol version.
    pub version: u8,
    /// Id of the parent header; all-zero for genesis.
    pub parent_id: BlockId,
    /// Root of the AD-proofs section.
    pub ad_proofs_root: Digest32,
    /// Authenticated state digest after this block.
    pub state_root: ADDigest,
    /// Merkle root of the block transactions.
    pub transaction_root: Digest32,
    /// Block timestamp (milliseconds since epoch).
    pub timestamp: u64,
    /// Required difficulty in compact form.
    pub n_bits: u32,
    /// Block height.
    pub height: u32,
    /// Merkle digest of the extension section.
    pub extension_root: Digest32,
    /// Miner votes on protocol parameters.
    pub votes: Votes,
    /// Proof-of-Work solution.
    pub solution: AutolykosSolution,
}

impl Header {
    /// Header id: Blake2b-256 of the serialized header.
    pub fn id(&self) -> BlockId {
        BlockId(blake2b256(&self.bytes()))
    }

    /// Whether this is the genesis header.
    pub fn is_genesis(&self) -> bool {
        self.height == GENESIS_HEIGHT
    }

    /// Modifier id of this header's extension section.
    ///
    /// Derived as `H(sectionType ++ headerId ++ extensionRoot)`, so the
    /// extension can be fetched by id before its body is known.
    pub fn extension_id(&self) -> BlockId {
        let mut data = Vec::with_capacity(1 + 32 + 32);
        data.push(ModifierType::Extension.to_byte());
        data.extend_from_slice(self.id().as_bytes());
        data.extend_from_slice(self.extension_root.as_bytes());
        BlockId(blake2b256(&data))
    }

    /// Deterministic header encoding, Proof-of-Work solution excluded.
    ///
    /// This is the message the PoW hit is computed over.
    pub fn bytes_without_pow(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(200);
        w.put_u8(self.version);
        w.put_bytes(self.parent_id.as_bytes());
        w.put_bytes(self.ad_proofs_root.as_bytes());
        w.put_bytes(self.transaction_root.as_bytes());
        w.put_bytes(self.state_root.as_ref());
        w.put_u64(self.timestamp);
        w.put_bytes(self.extension_root.as_bytes());
        w.put_bytes(&self.n_bits.to_be_bytes());
        w.put_u32(self.height);
        w.put_bytes(&self.votes.0);
        w.into_bytes()
    }

    /// Full deterministic header encoding.
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = self.bytes_without_pow();
        bytes.extend_from_slice(&self.solution.miner_pk);
        bytes.extend_from_slice(&self.solution.nonce);
        bytes
    }

    /// Parse a header from its exact byte encoding.
    ///
    /// The whole slice must be consumed; trailing bytes are rejected.
    pub fn parse(data: &[u8]) -> Result<Self, SerializationError> {
        let mut r = ByteReader::new(data);
        let version = r.get_u8()?;
        let parent_id = BlockId::from(r.get_array_32()?);
        let ad_proofs_root = Digest32::from(r.get_array_32()?);
        let transaction_root = Digest32::from(r.get_array_32()?);
        let mut state_root = [0u8; 33];
        state_root.copy_from_slice(r.get_bytes(33)?);
        let timestamp = r.get_u64()?;
        let extension_root = Digest32::from(r.get_array_32()?);
        let mut n_bits_bytes = [0u8; 4];
        n_bits_bytes.copy_from_slice(r.get_bytes(4)?);
        let n_bits = u32::from_be_bytes(n_bits_bytes);
        let height = r.get_u32()?;
        let mut votes = [0u8; 3];
        votes.copy_from_slice(r.get_bytes(3)?);
        let mut miner_pk = [0u8; 33];
        miner_pk.copy_from_slice(r.get_bytes(33)?);
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(r.get_bytes(8)?);
        if !r.is_finished() {
            return Err(SerializationError::InvalidLength(format!(
                "{} trailing bytes after header",
                r.remaining()
            )));
        }
        Ok(Self {
            version,
            parent_id,
            ad_proofs_root,
            state_root: ADDigest::from(state_root),
            transaction_root,
            timestamp,
            n_bits,
            height,
            extension_root,
            votes: Votes(votes),
            solution: AutolykosSolution { miner_pk, nonce },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_header(height: u32, parent_id: BlockId) -> Header {
        Header {
            version: 2,
            parent_id,
            ad_proofs_root: Digest32::zero(),
            state_root: ADDigest::zero(),
            transaction_root: Digest32::from([0x11u8; 32]),
            timestamp: 1_600_000_000_000,
            n_bits: 0x1d00ffff,
            height,
            extension_root: Digest32::from([0x22u8; 32]),
            votes: Votes([0, 0, 0]),
            solution: AutolykosSolution {
                miner_pk: [0x02u8; 33],
                nonce: [7u8; 8],
            },
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header(42, BlockId::from([0xAAu8; 32]));
        let bytes = header.bytes();
        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.id(), header.id());
    }

    #[test]
    fn test_header_bytes_deterministic() {
        let header = sample_header(10, BlockId::zero());
        assert_eq!(header.bytes(), header.bytes());
        assert_eq!(header.id(), header.id());
    }

    #[test]
    fn test_header_id_depends_on_pow() {
        let header = sample_header(10, BlockId::zero());
        let mut other = header.clone();
        other.solution.nonce = [9u8; 8];
        assert_ne!(header.id(), other.id());
        assert_eq!(header.bytes_without_pow(), other.bytes_without_pow());
    }

    #[test]
    fn test_header_truncated_rejected() {
        let header = sample_header(10, BlockId::zero());
        let bytes = header.bytes();
        assert!(Header::parse(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_header_trailing_rejected() {
        let header = sample_header(10, BlockId::zero());
        let mut bytes = header.bytes();
        bytes.push(0);
        assert!(Header::parse(&bytes).is_err());
    }

    #[test]
    fn test_genesis_height() {
        let header = sample_header(GENESIS_HEIGHT, BlockId::zero());
        assert!(header.is_genesis());
        assert!(!sample_header(2, BlockId::zero()).is_genesis());
    }

    #[test]
    fn test_extension_id_differs_from_header_id() {
        let header = sample_header(5, BlockId::zero());
        assert_ne!(header.extension_id(), header.id());
    }

    #[test]
    fn test_modifier_type_bytes() {
        assert_eq!(ModifierType::NipopowProof.to_byte(), 105);
        assert_eq!(ModifierType::NipopowProofPrefix.to_byte(), 111);
        assert_eq!(ModifierType::from_byte(105), Some(ModifierType::NipopowProof));
        assert_eq!(ModifierType::from_byte(0), None);
    }

    proptest! {
        #[test]
        fn prop_header_roundtrip(
            height in 1u32..5_000_000,
            timestamp in 0u64..u64::MAX / 2,
            n_bits in any::<u32>(),
            parent in proptest::array::uniform32(any::<u8>()),
            nonce in proptest::array::uniform8(any::<u8>()),
        ) {
            let mut header = sample_header(height, BlockId::from(parent));
            header.timestamp = timestamp;
            header.n_bits = n_bits;
            header.solution.nonce = nonce;
            let parsed = Header::parse(&header.bytes()).unwrap();
            prop_assert_eq!(parsed, header);
        }
    }
}
