//! Proof generation service with a single-slot cache.
//!
//! Tip proofs are expensive and requested repeatedly while the chain
//! stands still, so the last emitted proof is memoized under the best
//! header id and dropped the moment the tip moves. Infix proofs are
//! always regenerated.

use crate::algos::NipopowAlgos;
use crate::error::{NipopowError, NipopowResult};
use crate::history::HistoryReader;
use crate::proof::{NipopowProof, PoPowParams};
use ergo_chain::BlockId;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

struct CachedProof {
    tip_id: BlockId,
    params: PoPowParams,
    proof: NipopowProof,
}

/// NiPoPoW proof service over a history reader.
pub struct NipopowProver<R> {
    reader: Arc<R>,
    algos: NipopowAlgos,
    cache: RwLock<Option<CachedProof>>,
}

impl<R: HistoryReader> NipopowProver<R> {
    /// Create a prover over a shared history reader.
    pub fn new(reader: Arc<R>, algos: NipopowAlgos) -> Self {
        Self {
            reader,
            algos,
            cache: RwLock::new(None),
        }
    }

    /// The algorithms this prover runs on.
    pub fn algos(&self) -> &NipopowAlgos {
        &self.algos
    }

    /// Prove the current chain suffix.
    ///
    /// Returns the cached proof while the best header is unchanged and
    /// the parameters match; otherwise regenerates and atomically
    /// replaces the slot. The cache is never populated on failure.
    pub fn prove_suffix(&self, params: &PoPowParams) -> NipopowResult<NipopowProof> {
        let best = self.reader.best_header().ok_or(NipopowError::EmptyChain)?;
        let tip_id = best.id();

        if let Some(cached) = self.cache.read().as_ref() {
            if cached.tip_id == tip_id && cached.params == *params {
                debug!(tip = %tip_id, "returning cached NiPoPoW proof");
                return Ok(cached.proof.clone());
            }
        }

        let proof = self
            .algos
            .prove_from_reader(self.reader.as_ref(), None, params)?;
        info!(
            tip = %tip_id,
            height = proof.tip_height(),
            prefix_len = proof.prefix.len(),
            "generated NiPoPoW suffix proof"
        );
        *self.cache.write() = Some(CachedProof {
            tip_id,
            params: *params,
            proof: proof.clone(),
        });
        Ok(proof)
    }

    /// Prove a suffix starting at a specific header (infix proof).
    ///
    /// Bypasses the cache: the slot is reserved for the tip case.
    pub fn prove_infix(
        &self,
        header_id: &BlockId,
        params: &PoPowParams,
    ) -> NipopowResult<NipopowProof> {
        let proof = self
            .algos
            .prove_from_reader(self.reader.as_ref(), Some(header_id), params)?;
        debug!(
            suffix_head = %header_id,
            prefix_len = proof.prefix.len(),
            "generated NiPoPoW infix proof"
        );
        Ok(proof)
    }
}
