//! # ergo-chain
//!
//! Minimal chain data model consumed by the NiPoPoW core.
//!
//! This crate provides:
//! - Digest and block-id newtypes (Blake2b-256 based)
//! - The block header with its deterministic byte encoding
//! - Block extensions (ordered key-value fields with a Merkle digest)
//! - The compact difficulty-bits codec
//! - The Proof-of-Work hit interface
//! - VLQ serialization primitives shared by all wire formats
//!
//! Heavier chain concerns (transactions, script execution, persistent
//! storage) live outside this workspace and are referenced by interface
//! only.

pub mod difficulty;
mod digest;
mod error;
pub mod extension;
mod header;
pub mod merkle;
pub mod pow;
pub mod serialization;

pub use digest::{blake2b256, ADDigest, BlockId, Digest32, Votes};
pub use error::SerializationError;
pub use extension::{
    ExtensionCandidate, ExtensionField, FIELD_KEY_SIZE, FIELD_VALUE_MAX_SIZE,
};
pub use header::{AutolykosSolution, Header, ModifierType, GENESIS_HEIGHT};
pub use merkle::{MerkleProof, MerkleTree, Side};
pub use pow::{pow_modulus, Autolykos2Pow, PowScheme};
