//! Compact difficulty-bits codec.
//!
//! `n_bits` packs a big-integer difficulty into 4 bytes: one exponent
//! byte and a 3-byte mantissa, `difficulty = mantissa * 2^(8*(exponent-3))`.
//! A mantissa with the sign bit set is renormalized on encode so the
//! value is never interpreted as negative.

use num_bigint::BigUint;
use num_traits::Zero;

/// Decode compact bits into the full difficulty value.
pub fn decode_compact_bits(n_bits: u32) -> BigUint {
    let exponent = (n_bits >> 24) as usize;
    let mantissa = n_bits & 0x007F_FFFF;

    if exponent <= 3 {
        BigUint::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigUint::from(mantissa) << (8 * (exponent - 3))
    }
}

/// Encode a difficulty value into compact bits.
///
/// Lossy for values wider than the 3-byte mantissa, as on every chain
/// using this format.
pub fn encode_compact_bits(difficulty: &BigUint) -> u32 {
    if difficulty.is_zero() {
        return 0;
    }

    let bytes = difficulty.to_bytes_be();
    let len = bytes.len();

    let (size, word) = if len <= 3 {
        let mut word = 0u32;
        for (i, &b) in bytes.iter().enumerate() {
            word |= u32::from(b) << (8 * (len - 1 - i));
        }
        (len as u32, word << (8 * (3 - len)))
    } else {
        let word =
            (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
        (len as u32, word)
    };

    if word & 0x0080_0000 != 0 {
        ((size + 1) << 24) | (word >> 8)
    } else {
        (size << 24) | word
    }
}
