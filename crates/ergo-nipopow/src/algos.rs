//! Core NiPoPoW algorithms: superblock levels, chain scoring and proof
//! construction (KMZ17, FC20 version).

use crate::error::{NipopowError, NipopowResult};
use crate::history::HistoryReader;
use crate::interlinks::update_interlinks;
use crate::popow_header::PoPowHeader;
use crate::proof::{NipopowProof, PoPowParams};
use ergo_chain::difficulty::decode_compact_bits;
use ergo_chain::{pow_modulus, Autolykos2Pow, BlockId, Header, PowScheme, GENESIS_HEIGHT};
use num_traits::{ToPrimitive, Zero};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Scan ceiling for level iteration; a genesis header sits at every
/// level, so unbounded loops must stop somewhere past any real μ.
const MAX_LEVEL_SCAN: i32 = 255;

/// NiPoPoW algorithms over a PoW hit scheme.
///
/// Pure reads: every method is safe to call concurrently on shared
/// immutable inputs.
#[derive(Clone)]
pub struct NipopowAlgos {
    /// Hit evaluation for solved headers.
    pub pow: Arc<dyn PowScheme>,
}

impl Default for NipopowAlgos {
    fn default() -> Self {
        Self::new(Arc::new(Autolykos2Pow))
    }
}

impl NipopowAlgos {
    /// Create algorithms over a specific PoW scheme.
    pub fn new(pow: Arc<dyn PowScheme>) -> Self {
        Self { pow }
    }

    /// Superblock level (μ) of a header.
    ///
    /// Genesis belongs to every superchain and gets `i32::MAX`. Otherwise
    /// `μ = ⌊log2(target) − log2(hit)⌋` with `target = q / difficulty`,
    /// computed in double precision: the rounding behaviour is a
    /// compatibility surface shared by every node, not a free choice.
    pub fn max_level_of(&self, header: &Header) -> i32 {
        if header.is_genesis() {
            return i32::MAX;
        }
        let difficulty = decode_compact_bits(header.n_bits);
        if difficulty.is_zero() {
            return 0;
        }
        let target = pow_modulus() / difficulty;
        let hit = self.pow.pow_hit(header);
        let t = target.to_f64().unwrap_or(f64::INFINITY);
        let b = hit.to_f64().unwrap_or(f64::INFINITY);
        // Casting saturates, so a zero hit degenerates to i32::MAX rather
        // than wrapping.
        (t.log2() - b.log2()).floor() as i32
    }

    /// Best proof score over a chain segment.
    ///
    /// Level 0 always counts the whole segment; higher levels are
    /// admitted while at least `m` superblocks remain, and the first
    /// level below `m` stops the scan. The score `2^μ · n_μ` is widened
    /// to `u64` and saturates instead of wrapping.
    pub fn best_arg(&self, chain: &[&Header], m: u32) -> u64 {
        let mut best = chain.len() as u64;
        let mut level: i32 = 1;
        while level <= MAX_LEVEL_SCAN {
            let count = chain
                .iter()
                .copied()
                .filter(|h| self.max_level_of(h) >= level)
                .count() as u64;
            if count < u64::from(m.max(1)) {
                break;
            }
            let score = 1u64
                .checked_shl(level as u32)
                .map_or(u64::MAX, |weight| weight.saturating_mul(count));
            best = best.max(score);
            level += 1;
        }
        best
    }

    /// Headers of the level-μ superchain within a chain segment.
    ///
    /// Not used by the comparator; kept as a public accessor for
    /// inspection and test scaffolding.
    pub fn chain_of_level<'a>(&self, chain: &'a [PoPowHeader], level: i32) -> Vec<&'a PoPowHeader> {
        chain
            .iter()
            .filter(|h| self.max_level_of(&h.header) >= level)
            .collect()
    }

    /// Lowest common ancestor of two proof chains.
    ///
    /// Deliberately stricter than a graph LCA: `None` unless the chains
    /// share their first header; otherwise the last header present in
    /// both, in the left chain's order.
    pub fn lowest_common_ancestor<'a>(
        &self,
        left: &[&'a Header],
        right: &[&Header],
    ) -> Option<&'a Header> {
        let left_first = left.first()?;
        let right_first = right.first()?;
        if left_first.id() != right_first.id() {
            return None;
        }
        let right_ids: HashSet<BlockId> = right.iter().map(|h| h.id()).collect();
        left.iter()
            .filter(|h| right_ids.contains(&h.id()))
            .last()
            .copied()
    }

    /// Interlink vector for the block following `prev_header`.
    pub fn updated_interlinks(
        &self,
        prev_header: &Header,
        prev_interlinks: &[BlockId],
    ) -> NipopowResult<Vec<BlockId>> {
        update_interlinks(
            prev_header.id(),
            self.max_level_of(prev_header),
            prev_interlinks,
            prev_header.is_genesis(),
        )
    }

    /// Build a proof from a fully materialized chain in ascending height
    /// order.
    pub fn prove(
        &self,
        chain: &[PoPowHeader],
        params: &PoPowParams,
    ) -> NipopowResult<NipopowProof> {
        params.validate()?;
        let k = params.k as usize;
        let m = params.m as usize;
        if chain.len() < k + m {
            return Err(NipopowError::InsufficientChain {
                length: chain.len() as u32,
                m: params.m,
                k: params.k,
            });
        }
        let first = &chain[0];
        if !first.is_genesis() {
            return Err(NipopowError::NotAnchored {
                height: first.height(),
            });
        }

        let (pre, suffix) = chain.split_at(chain.len() - k);
        let suffix_head = suffix[0].clone();
        let suffix_tail: Vec<Header> = suffix[1..].iter().map(|h| h.header.clone()).collect();

        // The deepest level any pre-suffix ancestor reached.
        let max_level = pre
            .last()
            .map(|h| h.interlinks.len() as i32 - 1)
            .unwrap_or(0);

        let mut collected: HashMap<BlockId, &PoPowHeader> = HashMap::new();
        let mut anchor_height = first.height();
        for level in (0..=max_level.max(0)).rev() {
            let sub: Vec<&PoPowHeader> = pre
                .iter()
                .filter(|h| {
                    self.max_level_of(&h.header) >= level && h.height() >= anchor_height
                })
                .collect();
            for h in &sub {
                collected.insert(h.id(), *h);
            }
            if sub.len() > m {
                anchor_height = sub[sub.len() - m].height();
            }
        }

        let mut prefix: Vec<PoPowHeader> = collected.into_values().cloned().collect();
        prefix.sort_by_key(PoPowHeader::height);

        Ok(NipopowProof::new(
            params.m,
            params.k,
            prefix,
            suffix_head,
            suffix_tail,
        ))
    }

    /// Build a proof from a history-reader view.
    ///
    /// With `header_id` the proof's suffix starts at that header (infix
    /// proof); otherwise the suffix is the tip of the best chain. The
    /// prefix is assembled by walking interlink superchains from the
    /// suffix head, higher levels first, raising the anchoring height
    /// whenever a level contributes more than `m` headers.
    pub fn prove_from_reader<R>(
        &self,
        reader: &R,
        header_id: Option<&BlockId>,
        params: &PoPowParams,
    ) -> NipopowResult<NipopowProof>
    where
        R: HistoryReader + ?Sized,
    {
        params.validate()?;
        let k = params.k;
        let m = params.m as usize;
        let height = reader.headers_height();
        if height < params.k + params.m {
            return Err(NipopowError::InsufficientChain {
                length: height,
                m: params.m,
                k,
            });
        }

        let (suffix_head, suffix_tail) = match header_id {
            Some(id) => {
                let head = reader
                    .popow_header_by_id(id)
                    .ok_or(NipopowError::HeaderNotFound(*id))?;
                let tail = reader.best_headers_after(&head.header, k - 1);
                (head, tail)
            }
            None => {
                let last = reader.last_headers(k);
                let first = last.first().ok_or(NipopowError::EmptyChain)?;
                let first_id = first.id();
                let head = reader
                    .popow_header_by_id(&first_id)
                    .ok_or(NipopowError::HeaderNotFound(first_id))?;
                (head, last[1..].to_vec())
            }
        };
        if suffix_tail.len() + 1 != k as usize {
            return Err(NipopowError::InsufficientChain {
                length: height,
                m: params.m,
                k,
            });
        }

        // The interlink tail is stored highest level first; walking it in
        // natural order processes higher levels before lower ones, so the
        // anchoring height only ever moves forward.
        let mut collected: HashMap<BlockId, PoPowHeader> = HashMap::new();
        let mut anchoring_height = GENESIS_HEIGHT;
        let links_tail = suffix_head.interlinks.get(1..).unwrap_or(&[]);
        for (i, prev_id) in links_tail.iter().enumerate() {
            let level_idx = links_tail.len() - 1 - i;
            let level_headers =
                self.collect_level(reader, prev_id, level_idx, anchoring_height)?;
            for ph in &level_headers {
                collected.insert(ph.id(), ph.clone());
            }
            if level_headers.len() > m {
                anchoring_height = level_headers[level_headers.len() - m].height();
            }
        }

        let genesis = reader
            .popow_header_at_height(GENESIS_HEIGHT)
            .ok_or(NipopowError::EmptyChain)?;
        let mut prefix: Vec<PoPowHeader> = collected
            .into_values()
            .filter(|h| !h.is_genesis())
            .collect();
        prefix.sort_by_key(PoPowHeader::height);
        prefix.insert(0, genesis);

        Ok(NipopowProof::new(
            params.m,
            k,
            prefix,
            suffix_head,
            suffix_tail,
        ))
    }

    /// Walk one superchain backwards from `start_id`, following each
    /// header's interlink pointer at level index `level_idx` (the
    /// level-`level_idx + 1` slot of its vector), until the height drops
    /// below `anchoring_height`. Returned ascending by height.
    fn collect_level<R>(
        &self,
        reader: &R,
        start_id: &BlockId,
        level_idx: usize,
        anchoring_height: u32,
    ) -> NipopowResult<Vec<PoPowHeader>>
    where
        R: HistoryReader + ?Sized,
    {
        let mut acc: Vec<PoPowHeader> = Vec::new();
        let mut current_id = *start_id;
        loop {
            let popow = reader
                .popow_header_by_id(&current_id)
                .ok_or(NipopowError::HeaderNotFound(current_id))?;
            if popow.height() < anchoring_height {
                break;
            }
            let next = popow.interlink_by_level_index(level_idx).copied();
            acc.push(popow);
            match next {
                Some(id) => current_id = id,
                None => break,
            }
        }
        acc.reverse();
        Ok(acc)
    }
}

impl std::fmt::Debug for NipopowAlgos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NipopowAlgos").finish_non_exhaustive()
    }
}
