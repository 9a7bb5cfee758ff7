//! Error types for the chain data model.

use thiserror::Error;

/// Errors raised while encoding or decoding chain structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// A length prefix or fixed-size read exceeds the remaining buffer.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A VLQ value did not terminate within its maximum width.
    #[error("VLQ value overflows {width}-bit range")]
    VlqOverflow { width: u32 },

    /// A declared count or length is impossible for the remaining input.
    #[error("invalid length field: {0}")]
    InvalidLength(String),

    /// A field violates a structural invariant.
    #[error("malformed field: {0}")]
    MalformedField(String),
}
