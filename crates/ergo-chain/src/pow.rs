//! Proof-of-Work hit evaluation interface.
//!
//! The NiPoPoW core only needs the numeric hit of a solved header; the
//! full memory-hard evaluation (table generation, index derivation) is a
//! mining/validation concern and lives with the node's PoW verifier.

use crate::digest::blake2b256;
use crate::header::Header;
use num_bigint::BigUint;

/// The fixed PoW modulus `q` (group order of secp256k1).
///
/// The difficulty target of a header is `q / difficulty`.
pub fn pow_modulus() -> BigUint {
    BigUint::from_bytes_be(&[
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C,
        0xD0, 0x36, 0x41, 0x41,
    ])
}

/// Hit evaluation for a solved header.
///
/// Implementations must be deterministic in the header: the same header
/// always yields the same hit, so superblock levels are stable across
/// nodes.
pub trait PowScheme: Send + Sync {
    /// The numeric PoW hit of a header, as a non-negative 256-bit value.
    fn pow_hit(&self, header: &Header) -> BigUint;
}

/// Autolykos v2 hit chain: `hit = H(H(m ‖ nonce) ‖ nonce ‖ pk)` over the
/// pow-less header bytes `m`, with Blake2b-256 throughout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autolykos2Pow;

impl PowScheme for Autolykos2Pow {
    fn pow_hit(&self, header: &Header) -> BigUint {
        let mut msg_input = header.bytes_without_pow();
        msg_input.extend_from_slice(&header.solution.nonce);
        let msg = blake2b256(&msg_input);

        let mut hit_input = Vec::with_capacity(32 + 8 + 33);
        hit_input.extend_from_slice(msg.as_ref());
        hit_input.extend_from_slice(&header.solution.nonce);
        hit_input.extend_from_slice(&header.solution.miner_pk);
        BigUint::from_bytes_be(blake2b256(&hit_input).as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{ADDigest, BlockId, Digest32, Votes};
    use crate::header::AutolykosSolution;

    fn header_with_nonce(nonce: [u8; 8]) -> Header {
        Header {
            version: 2,
            parent_id: BlockId::zero(),
            ad_proofs_root: Digest32::zero(),
            state_root: ADDigest::zero(),
            transaction_root: Digest32::zero(),
            timestamp: 1,
            n_bits: 0x1d00ffff,
            height: 2,
            extension_root: Digest32::zero(),
            votes: Votes::default(),
            solution: AutolykosSolution {
                miner_pk: [0x02u8; 33],
                nonce,
            },
        }
    }

    #[test]
    fn test_pow_modulus_width() {
        let q = pow_modulus();
        assert_eq!(q.bits(), 256);
    }

    #[test]
    fn test_hit_deterministic() {
        let header = header_with_nonce([1u8; 8]);
        let pow = Autolykos2Pow;
        assert_eq!(pow.pow_hit(&header), pow.pow_hit(&header));
    }

    #[test]
    fn test_hit_varies_with_nonce() {
        let pow = Autolykos2Pow;
        let a = pow.pow_hit(&header_with_nonce([1u8; 8]));
        let b = pow.pow_hit(&header_with_nonce([2u8; 8]));
        assert_ne!(a, b);
    }
}
