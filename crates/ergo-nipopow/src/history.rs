//! History-reader capability consumed by the prover, and an in-memory
//! implementation of it.
//!
//! The reader is synchronous from the core's point of view and must
//! present a single consistent snapshot per call; snapshot semantics are
//! the reader's responsibility.

use crate::interlinks::unpack_interlinks;
use crate::popow_header::PoPowHeader;
use ergo_chain::{BlockId, ExtensionCandidate, ExtensionField, Header, GENESIS_HEIGHT};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// Read access to the best header chain and block extensions.
pub trait HistoryReader {
    /// Height of the best header chain (0 when empty).
    fn headers_height(&self) -> u32;

    /// Best (tip) header, if any.
    fn best_header(&self) -> Option<Header>;

    /// Id of the best-chain header at a height.
    fn best_header_id_at_height(&self, height: u32) -> Option<BlockId>;

    /// Header by id.
    fn header_by_id(&self, id: &BlockId) -> Option<Header>;

    /// Extension fields of the section with the given modifier id.
    fn extension_fields(&self, extension_id: &BlockId) -> Option<Vec<ExtensionField>>;

    /// Best-chain header at a height.
    fn header_at_height(&self, height: u32) -> Option<Header> {
        let id = self.best_header_id_at_height(height)?;
        self.header_by_id(&id)
    }

    /// Header plus unpacked interlinks, by id.
    ///
    /// `None` when the header, its extension, or a well-formed interlink
    /// vector is missing.
    fn popow_header_by_id(&self, id: &BlockId) -> Option<PoPowHeader> {
        let header = self.header_by_id(id)?;
        let fields = self.extension_fields(&header.extension_id())?;
        let interlinks = unpack_interlinks(&fields).ok()?;
        Some(PoPowHeader::new(header, interlinks))
    }

    /// Header plus unpacked interlinks, by best-chain height.
    fn popow_header_at_height(&self, height: u32) -> Option<PoPowHeader> {
        let id = self.best_header_id_at_height(height)?;
        self.popow_header_by_id(&id)
    }

    /// Last `count` best-chain headers, ascending by height.
    fn last_headers(&self, count: u32) -> Vec<Header> {
        let height = self.headers_height();
        if height == 0 || count == 0 {
            return Vec::new();
        }
        let from = height.saturating_sub(count - 1).max(GENESIS_HEIGHT);
        (from..=height)
            .filter_map(|h| self.header_at_height(h))
            .collect()
    }

    /// Up to `count` best-chain headers strictly after `header`,
    /// ascending by height.
    fn best_headers_after(&self, header: &Header, count: u32) -> Vec<Header> {
        let from = header.height + 1;
        let to = self
            .headers_height()
            .min(header.height.saturating_add(count));
        (from..=to)
            .filter_map(|h| self.header_at_height(h))
            .collect()
    }
}

/// Errors raised while appending to the in-memory history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// A header skips or repeats a height.
    #[error("non-contiguous append: expected height {expected}, got {got}")]
    NonContiguous { expected: u32, got: u32 },

    /// A header does not extend the current tip.
    #[error("header at height {height} does not reference the current tip")]
    WrongParent { height: u32 },

    /// The extension digest does not match the header's commitment.
    #[error("extension digest mismatch at height {height}")]
    ExtensionMismatch { height: u32 },
}

#[derive(Default)]
struct HistoryInner {
    headers: HashMap<BlockId, Header>,
    /// Best-chain index: entry `h - 1` is the id at height `h`.
    best_chain: Vec<BlockId>,
    /// Extension fields keyed by extension modifier id.
    extensions: HashMap<BlockId, Vec<ExtensionField>>,
}

/// In-memory best-chain history.
///
/// Appends go through `&self` behind an `RwLock`, so a shared history
/// can be mutated while provers hold references to it; readers see
/// either the old or the new tip, never a torn state.
#[derive(Default)]
pub struct InMemoryHistory {
    inner: RwLock<HistoryInner>,
}

impl InMemoryHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next best-chain header with its extension.
    ///
    /// The header must sit directly on the current tip and commit to the
    /// given extension via `extension_root`.
    pub fn append(
        &self,
        header: Header,
        extension: &ExtensionCandidate,
    ) -> Result<(), HistoryError> {
        let mut inner = self.inner.write();

        let expected = inner.best_chain.len() as u32 + 1;
        if header.height != expected {
            return Err(HistoryError::NonContiguous {
                expected,
                got: header.height,
            });
        }
        if let Some(tip_id) = inner.best_chain.last() {
            if header.parent_id != *tip_id {
                return Err(HistoryError::WrongParent {
                    height: header.height,
                });
            }
        }
        if extension.digest() != header.extension_root {
            return Err(HistoryError::ExtensionMismatch {
                height: header.height,
            });
        }

        let id = header.id();
        inner
            .extensions
            .insert(header.extension_id(), extension.fields().to_vec());
        inner.best_chain.push(id);
        inner.headers.insert(id, header);
        Ok(())
    }
}

impl HistoryReader for InMemoryHistory {
    fn headers_height(&self) -> u32 {
        self.inner.read().best_chain.len() as u32
    }

    fn best_header(&self) -> Option<Header> {
        let inner = self.inner.read();
        let id = inner.best_chain.last()?;
        inner.headers.get(id).cloned()
    }

    fn best_header_id_at_height(&self, height: u32) -> Option<BlockId> {
        if height < GENESIS_HEIGHT {
            return None;
        }
        self.inner
            .read()
            .best_chain
            .get((height - GENESIS_HEIGHT) as usize)
            .copied()
    }

    fn header_by_id(&self, id: &BlockId) -> Option<Header> {
        self.inner.read().headers.get(id).cloned()
    }

    fn extension_fields(&self, extension_id: &BlockId) -> Option<Vec<ExtensionField>> {
        self.inner.read().extensions.get(extension_id).cloned()
    }
}
