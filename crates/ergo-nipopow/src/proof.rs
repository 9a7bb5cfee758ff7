//! NiPoPoW proof: structure, validation, comparison and wire codec.

use crate::algos::NipopowAlgos;
use crate::error::{NipopowError, NipopowResult};
use crate::popow_header::PoPowHeader;
use ergo_chain::serialization::{ByteReader, ByteWriter};
use ergo_chain::{BlockId, Header, ModifierType};
use serde::{Deserialize, Serialize};

/// Default security parameter (minimum superchain length).
pub const DEFAULT_M: u32 = 30;

/// Default suffix length.
pub const DEFAULT_K: u32 = 30;

/// NiPoPoW security parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoPowParams {
    /// Minimum superchain length at each level.
    pub m: u32,
    /// Suffix length: number of full headers at the end.
    pub k: u32,
}

impl Default for PoPowParams {
    fn default() -> Self {
        Self {
            m: DEFAULT_M,
            k: DEFAULT_K,
        }
    }
}

impl PoPowParams {
    /// Create new parameters.
    pub fn new(m: u32, k: u32) -> Self {
        Self { m, k }
    }

    /// Check the parameter contract (`m >= 1`, `k >= 1`).
    pub fn validate(&self) -> NipopowResult<()> {
        if self.m < 1 || self.k < 1 {
            return Err(NipopowError::InvalidParams {
                m: self.m,
                k: self.k,
            });
        }
        Ok(())
    }
}

/// A NiPoPoW proof that a chain suffix is anchored in a long,
/// high-work history.
///
/// The prefix is a sparse superblock sample down to genesis; the suffix
/// is the last `k` headers in full: the head with interlinks, the tail
/// as plain headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NipopowProof {
    /// Security parameter used to generate this proof.
    pub m: u32,
    /// Suffix length.
    pub k: u32,
    /// Prefix headers (selected superblocks), height-ascending.
    pub prefix: Vec<PoPowHeader>,
    /// First header of the suffix, with interlinks.
    pub suffix_head: PoPowHeader,
    /// Remaining `k - 1` suffix headers.
    pub suffix_tail: Vec<Header>,
}

impl NipopowProof {
    /// Network modifier type id of serialized proofs.
    pub const MODIFIER_TYPE: ModifierType = ModifierType::NipopowProof;

    /// Create a new proof.
    pub fn new(
        m: u32,
        k: u32,
        prefix: Vec<PoPowHeader>,
        suffix_head: PoPowHeader,
        suffix_tail: Vec<Header>,
    ) -> Self {
        Self {
            m,
            k,
            prefix,
            suffix_head,
            suffix_tail,
        }
    }

    /// Genesis id claimed by this proof (first prefix header).
    pub fn genesis_id(&self) -> Option<BlockId> {
        self.prefix.first().map(PoPowHeader::id)
    }

    /// All headers in the proof: prefix, suffix head, suffix tail.
    pub fn headers_chain(&self) -> Vec<&Header> {
        let mut chain: Vec<&Header> = self.prefix.iter().map(|ph| &ph.header).collect();
        chain.push(&self.suffix_head.header);
        chain.extend(self.suffix_tail.iter());
        chain
    }

    /// Height of the proof tip (last suffix header).
    pub fn tip_height(&self) -> u32 {
        self.suffix_tail
            .last()
            .map(|h| h.height)
            .unwrap_or_else(|| self.suffix_head.height())
    }

    /// Id of the proof tip.
    pub fn tip_id(&self) -> BlockId {
        self.suffix_tail
            .last()
            .map(Header::id)
            .unwrap_or_else(|| self.suffix_head.id())
    }

    /// Heights are strictly increasing across the whole proof chain.
    pub fn has_valid_heights(&self) -> bool {
        let chain = self.headers_chain();
        chain.windows(2).all(|pair| pair[0].height < pair[1].height)
    }

    /// Adjacent prefix headers (and the suffix head) are linked by an
    /// interlink or by the parent id; the suffix tail is a plain parent
    /// chain.
    pub fn has_valid_connections(&self) -> bool {
        let popows: Vec<&PoPowHeader> = self
            .prefix
            .iter()
            .chain(std::iter::once(&self.suffix_head))
            .collect();
        let prefix_ok = popows.windows(2).all(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            next.interlinks.contains(&prev.id()) || next.header.parent_id == prev.id()
        });

        let mut prev_id = self.suffix_head.id();
        let suffix_ok = self.suffix_tail.iter().all(|header| {
            let linked = header.parent_id == prev_id;
            prev_id = header.id();
            linked
        });

        prefix_ok && suffix_ok
    }

    /// Structural validity: a non-empty prefix, a suffix of exactly `k`
    /// headers, monotone heights and valid connections.
    ///
    /// Invalidity is silent; higher layers decide whether to penalize
    /// the sender.
    pub fn is_valid(&self) -> bool {
        !self.prefix.is_empty()
            && self.k >= 1
            && self.suffix_tail.len() + 1 == self.k as usize
            && self.has_valid_heights()
            && self.has_valid_connections()
    }

    /// Whether this proof represents strictly more work than `that`.
    ///
    /// A valid proof beats an invalid one; two invalid proofs compare
    /// `false`. Otherwise the diverging portions past the lowest common
    /// ancestor are scored with `best_arg`; ties favor the incumbent.
    pub fn is_better_than(&self, that: &NipopowProof, algos: &NipopowAlgos) -> bool {
        if !self.is_valid() {
            return false;
        }
        if !that.is_valid() {
            return true;
        }

        let self_chain = self.headers_chain();
        let that_chain = that.headers_chain();

        let (self_score, that_score) =
            match algos.lowest_common_ancestor(&self_chain, &that_chain) {
                Some(lca) => {
                    let fork_height = lca.height;
                    let self_diverging: Vec<&Header> = self_chain
                        .iter()
                        .copied()
                        .filter(|h| h.height > fork_height)
                        .collect();
                    let that_diverging: Vec<&Header> = that_chain
                        .iter()
                        .copied()
                        .filter(|h| h.height > fork_height)
                        .collect();
                    (
                        algos.best_arg(&self_diverging, self.m),
                        algos.best_arg(&that_diverging, that.m),
                    )
                }
                None => (
                    algos.best_arg(&self_chain, self.m),
                    algos.best_arg(&that_chain, that.m),
                ),
            };

        self_score > that_score
    }

    /// Serialize to the wire format (modifier type id 105).
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(512);
        w.put_u32(self.m);
        w.put_u32(self.k);

        w.put_u32(self.prefix.len() as u32);
        for popow in &self.prefix {
            let bytes = popow.serialize();
            w.put_u32(bytes.len() as u32);
            w.put_bytes(&bytes);
        }

        let head_bytes = self.suffix_head.serialize();
        w.put_u32(head_bytes.len() as u32);
        w.put_bytes(&head_bytes);

        w.put_u32(self.suffix_tail.len() as u32);
        for header in &self.suffix_tail {
            let bytes = header.bytes();
            w.put_u32(bytes.len() as u32);
            w.put_bytes(&bytes);
        }
        w.into_bytes()
    }

    /// Parse from the exact wire encoding.
    pub fn parse(data: &[u8]) -> NipopowResult<Self> {
        let mut r = ByteReader::new(data);
        let m = r.get_u32()?;
        let k = r.get_u32()?;

        let prefix_count = r.get_count(2)?;
        let mut prefix = Vec::with_capacity(prefix_count);
        for _ in 0..prefix_count {
            let len = r.get_u32()? as usize;
            let bytes = r.get_bytes(len)?;
            prefix.push(PoPowHeader::parse(bytes)?);
        }

        let head_len = r.get_u32()? as usize;
        let head_bytes = r.get_bytes(head_len)?;
        let suffix_head = PoPowHeader::parse(head_bytes)?;

        let tail_count = r.get_count(2)?;
        let mut suffix_tail = Vec::with_capacity(tail_count);
        for _ in 0..tail_count {
            let len = r.get_u32()? as usize;
            let bytes = r.get_bytes(len)?;
            suffix_tail.push(Header::parse(bytes)?);
        }

        if !r.is_finished() {
            return Err(NipopowError::MalformedProof(format!(
                "{} trailing bytes after proof",
                r.remaining()
            )));
        }

        Ok(Self {
            m,
            k,
            prefix,
            suffix_head,
            suffix_tail,
        })
    }
}
