//! Error types for NiPoPoW proof generation and parsing.

use ergo_chain::{BlockId, SerializationError};
use thiserror::Error;

/// Errors raised by the NiPoPoW core.
///
/// The validator and comparator deliberately return `bool` rather than
/// these: an invalid peer proof is an expected input, not a fault.
#[derive(Error, Debug)]
pub enum NipopowError {
    /// History has no best header yet a proof was requested.
    #[error("history is empty: no best header to prove from")]
    EmptyChain,

    /// The input chain is too short for the requested parameters.
    #[error("chain of {length} headers is insufficient for m={m}, k={k}")]
    InsufficientChain { length: u32, m: u32, k: u32 },

    /// The first header of the input chain is not genesis.
    #[error("chain is not anchored: first header at height {height} is not genesis")]
    NotAnchored { height: u32 },

    /// Security parameters outside their contract.
    #[error("invalid proof parameters: m={m}, k={k} (both must be >= 1)")]
    InvalidParams { m: u32, k: u32 },

    /// An interlink vector or its packed form violates an invariant.
    #[error("malformed interlinks: {0}")]
    MalformedInterlinks(String),

    /// A proof byte stream cannot be parsed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The history reader has no header under the given id.
    #[error("header {0} not found in history")]
    HeaderNotFound(BlockId),
}

impl From<SerializationError> for NipopowError {
    fn from(err: SerializationError) -> Self {
        Self::MalformedProof(err.to_string())
    }
}

/// Result type for NiPoPoW operations.
pub type NipopowResult<T> = Result<T, NipopowError>;
