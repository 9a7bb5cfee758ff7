//! NiPoPoW proof verifier.
//!
//! Maintains the best proof received from peers and decides, proof by
//! proof, whether a newcomer represents a better chain. Used for light
//! client bootstrap.

use crate::algos::NipopowAlgos;
use crate::proof::NipopowProof;
use ergo_chain::{BlockId, Header};
use tracing::{debug, info, warn};

/// Result of processing one NiPoPoW proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NipopowVerificationResult {
    /// The new proof represents a better chain.
    BetterChain {
        /// Number of proofs processed so far.
        proofs_processed: u32,
    },
    /// The existing proof is still the best.
    NoBetterChain {
        /// Number of proofs processed so far.
        proofs_processed: u32,
    },
    /// The proof failed structural validation.
    Invalid,
    /// The proof is anchored at a different genesis.
    WrongGenesis,
}

/// Best-proof state machine.
pub struct NipopowVerifier {
    algos: NipopowAlgos,
    /// Expected genesis id, if known up front.
    genesis_id: Option<BlockId>,
    best_proof: Option<NipopowProof>,
    proofs_processed: u32,
}

impl NipopowVerifier {
    /// Create a verifier; learns the genesis from the first valid proof.
    pub fn new(algos: NipopowAlgos) -> Self {
        Self {
            algos,
            genesis_id: None,
            best_proof: None,
            proofs_processed: 0,
        }
    }

    /// Create a verifier pinned to a known genesis id.
    pub fn with_genesis(algos: NipopowAlgos, genesis_id: BlockId) -> Self {
        Self {
            algos,
            genesis_id: Some(genesis_id),
            best_proof: None,
            proofs_processed: 0,
        }
    }

    /// Current best proof.
    pub fn best_proof(&self) -> Option<&NipopowProof> {
        self.best_proof.as_ref()
    }

    /// Tip height of the best proof.
    pub fn best_height(&self) -> Option<u32> {
        self.best_proof.as_ref().map(NipopowProof::tip_height)
    }

    /// Number of proofs processed.
    pub fn proofs_processed(&self) -> u32 {
        self.proofs_processed
    }

    /// Expected genesis id, once known.
    pub fn genesis_id(&self) -> Option<&BlockId> {
        self.genesis_id.as_ref()
    }

    /// Headers of the best proof, for applying to a local history.
    pub fn headers_to_apply(&self) -> Option<Vec<&Header>> {
        self.best_proof.as_ref().map(NipopowProof::headers_chain)
    }

    /// Process a received proof against the current best.
    pub fn process(&mut self, proof: NipopowProof) -> NipopowVerificationResult {
        self.proofs_processed += 1;

        if !proof.is_valid() {
            warn!(
                tip_height = proof.tip_height(),
                "rejecting structurally invalid NiPoPoW proof"
            );
            return NipopowVerificationResult::Invalid;
        }

        let proof_genesis = proof.genesis_id();
        if let (Some(expected), Some(got)) = (&self.genesis_id, &proof_genesis) {
            if got != expected {
                warn!(expected = %expected, got = %got, "NiPoPoW proof has wrong genesis");
                return NipopowVerificationResult::WrongGenesis;
            }
        }
        if self.genesis_id.is_none() {
            if let Some(genesis) = proof_genesis {
                info!(genesis = %genesis, "learned genesis from first valid proof");
                self.genesis_id = Some(genesis);
            }
        }

        let is_better = match &self.best_proof {
            None => {
                info!(height = proof.tip_height(), "first NiPoPoW proof received");
                true
            }
            Some(current) => {
                if proof.is_better_than(current, &self.algos) {
                    info!(
                        old_height = current.tip_height(),
                        new_height = proof.tip_height(),
                        "found better NiPoPoW proof"
                    );
                    true
                } else {
                    debug!(
                        current_height = current.tip_height(),
                        proof_height = proof.tip_height(),
                        "NiPoPoW proof not better than current best"
                    );
                    false
                }
            }
        };

        if is_better {
            self.best_proof = Some(proof);
            NipopowVerificationResult::BetterChain {
                proofs_processed: self.proofs_processed,
            }
        } else {
            NipopowVerificationResult::NoBetterChain {
                proofs_processed: self.proofs_processed,
            }
        }
    }

    /// Forget the best proof but keep the learned genesis.
    pub fn reset(&mut self) {
        self.best_proof = None;
        self.proofs_processed = 0;
    }
}
