//! Shared test helpers: deterministic headers, a mock PoW scheme with
//! per-height levels, and an interlinked chain builder.

use crate::algos::NipopowAlgos;
use crate::history::InMemoryHistory;
use crate::interlinks::pack_interlinks;
use crate::popow_header::PoPowHeader;
use ergo_chain::difficulty::decode_compact_bits;
use ergo_chain::{
    pow_modulus, ADDigest, AutolykosSolution, BlockId, Digest32, ExtensionCandidate, Header,
    PowScheme, Votes,
};
use num_bigint::BigUint;
use num_traits::One;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Compact difficulty used by every test header.
pub const TEST_N_BITS: u32 = 0x1d00ffff;

/// Deterministic header at a height with an explicit parent id.
pub fn make_header(height: u32, parent_id: BlockId) -> Header {
    let mut nonce = [0u8; 8];
    nonce[4..].copy_from_slice(&height.to_be_bytes());
    Header {
        version: 2,
        parent_id,
        ad_proofs_root: Digest32::zero(),
        state_root: ADDigest::zero(),
        transaction_root: Digest32::zero(),
        timestamp: u64::from(height) * 120_000,
        n_bits: TEST_N_BITS,
        height,
        extension_root: ExtensionCandidate::empty().digest(),
        votes: Votes::default(),
        solution: AutolykosSolution {
            miner_pk: [0x02u8; 33],
            nonce,
        },
    }
}

/// Header chained onto a concrete parent header.
pub fn make_child_header(height: u32, parent: &Header) -> Header {
    make_header(height, parent.id())
}

/// PoPowHeader chained onto an optional parent, with explicit interlinks.
pub fn make_popow_header(
    height: u32,
    parent: Option<&PoPowHeader>,
    interlinks: Vec<BlockId>,
) -> PoPowHeader {
    let parent_id = parent.map(|p| p.id()).unwrap_or_else(BlockId::zero);
    PoPowHeader::new(make_header(height, parent_id), interlinks)
}

/// Mock PoW scheme assigning fixed μ-levels per height.
///
/// The hit for a header at height `h` is `target >> level(h)`, so the
/// level calculus recovers exactly the assigned level. Every hit
/// evaluation is counted.
pub struct MockPow {
    levels: HashMap<u32, u32>,
    fixed_hit: Option<BigUint>,
    calls: Arc<AtomicUsize>,
}

impl MockPow {
    /// Levels by height; unlisted heights are level 0.
    pub fn with_levels(levels: &[(u32, u32)]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
            fixed_hit: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always return the given hit.
    pub fn with_fixed_hit(hit: BigUint) -> Self {
        Self {
            levels: HashMap::new(),
            fixed_hit: Some(hit),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared hit-evaluation counter.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PowScheme for MockPow {
    fn pow_hit(&self, header: &Header) -> BigUint {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hit) = &self.fixed_hit {
            return hit.clone();
        }
        let level = self.levels.get(&header.height).copied().unwrap_or(0);
        let target = pow_modulus() / decode_compact_bits(header.n_bits);
        (target >> level).max(BigUint::one())
    }
}

/// Algorithms over a [`MockPow`] with the given per-height levels.
pub fn algos_with_levels(levels: &[(u32, u32)]) -> NipopowAlgos {
    NipopowAlgos::new(Arc::new(MockPow::with_levels(levels)))
}

/// A fully built test chain with its backing history.
pub struct BuiltChain {
    /// Interlinked headers, ascending from genesis.
    pub chain: Vec<PoPowHeader>,
    /// History answering reader queries for the same chain.
    pub history: InMemoryHistory,
    /// Algorithms over the chain's mock PoW.
    pub algos: NipopowAlgos,
    /// Counter of mock hit evaluations.
    pub pow_calls: Arc<AtomicUsize>,
}

/// Builds an honest chain whose interlinks and extensions go through the
/// production codec.
pub struct ChainBuilder {
    length: u32,
    levels: Vec<(u32, u32)>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            length: 0,
            levels: Vec::new(),
        }
    }

    /// Total chain length, genesis included.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Assign a superblock level to a height.
    pub fn with_level(mut self, height: u32, level: u32) -> Self {
        self.levels.push((height, level));
        self
    }

    pub fn build(self) -> BuiltChain {
        let pow = MockPow::with_levels(&self.levels);
        let pow_calls = pow.call_counter();
        let algos = NipopowAlgos::new(Arc::new(pow));
        let history = InMemoryHistory::new();

        let mut chain: Vec<PoPowHeader> = Vec::with_capacity(self.length as usize);
        let mut prev: Option<(Header, Vec<BlockId>)> = None;
        for height in 1..=self.length {
            let interlinks = match &prev {
                None => Vec::new(),
                Some((prev_header, prev_links)) => algos
                    .updated_interlinks(prev_header, prev_links)
                    .expect("well-formed parent interlinks"),
            };
            let fields = pack_interlinks(&interlinks).expect("packable interlinks");
            let extension = ExtensionCandidate::new(fields).expect("valid extension");

            let parent_id = prev
                .as_ref()
                .map(|(h, _)| h.id())
                .unwrap_or_else(BlockId::zero);
            let mut header = make_header(height, parent_id);
            header.extension_root = extension.digest();

            history
                .append(header.clone(), &extension)
                .expect("contiguous append");
            chain.push(PoPowHeader::new(header.clone(), interlinks.clone()));
            prev = Some((header, interlinks));
        }

        BuiltChain {
            chain,
            history,
            algos,
            pow_calls,
        }
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
