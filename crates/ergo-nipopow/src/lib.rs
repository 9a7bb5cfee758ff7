//! # ergo-nipopow
//!
//! NiPoPoW (Non-Interactive Proofs of Proof-of-Work) support, as
//! described in the KMZ17 paper (FC20 version).
//!
//! It provides:
//! - Interlink data structures and algorithms
//! - Proof generation from a materialized chain or a history reader
//! - Proof comparison, validation and wire codecs
//! - A tip-keyed proof cache and a best-proof verifier for light
//!   client bootstrap
//!
//! # Overview
//!
//! NiPoPoW enables efficient proofs that a chain represents significant
//! PoW. It works by:
//! 1. Classifying blocks by their level (how much the hit beat the target)
//! 2. Maintaining interlinks in each block to higher-level superblocks
//! 3. Selecting relevant superblocks at each level into a succinct proof
//!
//! # Key concepts
//!
//! - **Level (μ)**: a block's level is `⌊log2(target / hit)⌋`
//! - **Superblock**: a block at level μ ≥ 1
//! - **Interlinks**: a vector of block ids forming a skip-list over levels
//! - **Proof**: sparse prefix + the last `k` headers in full

mod algos;
mod error;
mod history;
mod interlinks;
mod popow_header;
mod prefix;
mod proof;
mod prover;
#[cfg(test)]
pub(crate) mod test_helpers;
mod verifier;

pub use algos::NipopowAlgos;
pub use error::{NipopowError, NipopowResult};
pub use history::{HistoryError, HistoryReader, InMemoryHistory};
pub use interlinks::{
    pack_interlinks, proof_for_interlink_vector, unpack_interlinks, update_interlinks,
    INTERLINK_VECTOR_PREFIX,
};
pub use popow_header::PoPowHeader;
pub use prefix::NipopowProofPrefix;
pub use proof::{NipopowProof, PoPowParams, DEFAULT_K, DEFAULT_M};
pub use prover::NipopowProver;
pub use verifier::{NipopowVerificationResult, NipopowVerifier};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let params = PoPowParams::default();
        assert_eq!(params.m, DEFAULT_M);
        assert_eq!(params.k, DEFAULT_K);
        assert_eq!(INTERLINK_VECTOR_PREFIX, 0x01);
    }
}
