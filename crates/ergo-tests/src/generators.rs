//! Test data generators for NiPoPoW integration tests.
//!
//! Chains are generated through the production code paths: interlinks
//! via the interlink updater, extensions via the interlink codec, and
//! superblock levels via a deterministic mock PoW that reads the level
//! assigned to each header from its votes field, so forked branches can
//! carry their own level assignments.

use ergo_chain::difficulty::decode_compact_bits;
use ergo_chain::{
    pow_modulus, ADDigest, AutolykosSolution, BlockId, Digest32, ExtensionCandidate,
    ExtensionField, Header, PowScheme, Votes,
};
use ergo_nipopow::{pack_interlinks, HistoryReader, InMemoryHistory, NipopowAlgos, PoPowHeader};
use num_bigint::BigUint;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Compact difficulty used by every generated header.
pub const TEST_N_BITS: u32 = 0x1d00ffff;

/// Deterministic mock PoW: the hit of a header at level `L` (read from
/// `votes[0]`) is `target >> L`, so the level calculus recovers exactly
/// the assigned level. Hit evaluations are counted.
pub struct LevelTaggedPow {
    calls: Arc<AtomicUsize>,
}

impl LevelTaggedPow {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared hit-evaluation counter.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for LevelTaggedPow {
    fn default() -> Self {
        Self::new()
    }
}

impl PowScheme for LevelTaggedPow {
    fn pow_hit(&self, header: &Header) -> BigUint {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let level = u32::from(header.votes.0[0]);
        let target = pow_modulus() / decode_compact_bits(header.n_bits);
        (target >> level).max(BigUint::from(1u32))
    }
}

/// Algorithms over a fresh [`LevelTaggedPow`], plus its call counter.
pub fn test_algos() -> (NipopowAlgos, Arc<AtomicUsize>) {
    let pow = LevelTaggedPow::new();
    let calls = pow.call_counter();
    (NipopowAlgos::new(Arc::new(pow)), calls)
}

fn next_block(
    algos: &NipopowAlgos,
    parent: Option<&PoPowHeader>,
    height: u32,
    level: u8,
    salt: u8,
) -> PoPowHeader {
    let interlinks = match parent {
        None => Vec::new(),
        Some(prev) => algos
            .updated_interlinks(&prev.header, &prev.interlinks)
            .expect("well-formed parent interlinks"),
    };
    let extension = interlink_extension(&interlinks);

    let mut nonce = [0u8; 8];
    nonce[0] = salt;
    nonce[4..].copy_from_slice(&height.to_be_bytes());
    let header = Header {
        version: 2,
        parent_id: parent.map(|p| p.id()).unwrap_or_else(BlockId::zero),
        ad_proofs_root: Digest32::zero(),
        state_root: ADDigest::zero(),
        transaction_root: Digest32::zero(),
        timestamp: u64::from(height) * 120_000,
        n_bits: TEST_N_BITS,
        height,
        extension_root: extension.digest(),
        votes: Votes([level, 0, 0]),
        solution: AutolykosSolution {
            miner_pk: [0x02u8; 33],
            nonce,
        },
    };
    PoPowHeader::new(header, interlinks)
}

/// Extension candidate carrying exactly the packed interlink vector.
pub fn interlink_extension(interlinks: &[BlockId]) -> ExtensionCandidate {
    let fields = pack_interlinks(interlinks).expect("packable interlinks");
    ExtensionCandidate::new(fields).expect("valid extension")
}

/// Honest chain from genesis; `levels[i]` is the superblock level of the
/// header at height `i + 1` (the genesis entry is ignored: genesis sits
/// at every level).
pub fn chain_with_levels(algos: &NipopowAlgos, levels: &[u8]) -> Vec<PoPowHeader> {
    let mut chain: Vec<PoPowHeader> = Vec::with_capacity(levels.len());
    for (i, &level) in levels.iter().enumerate() {
        let block = next_block(algos, chain.last(), i as u32 + 1, level, 0);
        chain.push(block);
    }
    chain
}

/// Extend `base` with a branch of the given levels; `salt` keeps headers
/// of competing branches distinct even when their levels coincide.
pub fn extend_chain(
    algos: &NipopowAlgos,
    base: &[PoPowHeader],
    levels: &[u8],
    salt: u8,
) -> Vec<PoPowHeader> {
    let mut chain = base.to_vec();
    for (i, &level) in levels.iter().enumerate() {
        let height = base.len() as u32 + i as u32 + 1;
        let block = next_block(algos, chain.last(), height, level, salt);
        chain.push(block);
    }
    chain
}

/// Load a materialized chain into an in-memory history.
pub fn history_from_chain(chain: &[PoPowHeader]) -> InMemoryHistory {
    let history = InMemoryHistory::new();
    for popow in chain {
        let extension = interlink_extension(&popow.interlinks);
        history
            .append(popow.header.clone(), &extension)
            .expect("contiguous chain");
    }
    history
}

/// Reader wrapper counting per-header lookups, to observe cache hits.
pub struct CountingReader<R> {
    inner: R,
    header_lookups: AtomicUsize,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            header_lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `header_by_id` calls seen so far.
    pub fn header_lookups(&self) -> usize {
        self.header_lookups.load(Ordering::SeqCst)
    }

    /// The wrapped reader.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: HistoryReader> HistoryReader for CountingReader<R> {
    fn headers_height(&self) -> u32 {
        self.inner.headers_height()
    }

    fn best_header(&self) -> Option<Header> {
        self.inner.best_header()
    }

    fn best_header_id_at_height(&self, height: u32) -> Option<BlockId> {
        self.inner.best_header_id_at_height(height)
    }

    fn header_by_id(&self, id: &BlockId) -> Option<Header> {
        self.header_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.header_by_id(id)
    }

    fn extension_fields(&self, extension_id: &BlockId) -> Option<Vec<ExtensionField>> {
        self.inner.extension_fields(extension_id)
    }
}
