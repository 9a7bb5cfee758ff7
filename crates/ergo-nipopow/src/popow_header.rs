//! PoPowHeader: a block header together with its unpacked interlinks.

use crate::error::{NipopowError, NipopowResult};
use ergo_chain::serialization::{ByteReader, ByteWriter};
use ergo_chain::{BlockId, Header};

/// Header plus unpacked interlink vector.
///
/// For non-genesis headers the vector is non-empty and its first entry
/// is the chain's genesis id; the genesis header itself carries an empty
/// vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoPowHeader {
    /// The block header.
    pub header: Header,
    /// Unpacked interlinks vector.
    pub interlinks: Vec<BlockId>,
}

impl PoPowHeader {
    /// Create a new PoPowHeader.
    pub fn new(header: Header, interlinks: Vec<BlockId>) -> Self {
        Self { header, interlinks }
    }

    /// Block id.
    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    /// Block height.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Whether this is the genesis header.
    pub fn is_genesis(&self) -> bool {
        self.header.is_genesis()
    }

    /// Genesis id from the interlinks (first entry).
    pub fn genesis_id(&self) -> Option<&BlockId> {
        self.interlinks.first()
    }

    /// Interlink at a raw vector position, when present.
    pub fn interlink_at(&self, index: usize) -> Option<&BlockId> {
        self.interlinks.get(index)
    }

    /// Interlink pointer by level index.
    ///
    /// The tail of the vector is stored highest level first, so index 0
    /// resolves to the level-1 pointer, index 1 to the level-2 pointer,
    /// and so on; `None` when the vector never reached that level.
    pub fn interlink_by_level_index(&self, level_idx: usize) -> Option<&BlockId> {
        if self.interlinks.len() < 2 {
            return None;
        }
        self.interlinks[1..].iter().rev().nth(level_idx)
    }

    /// Serialize: `uint(headerLen) ‖ header ‖ uint(count) ‖ ids`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(256 + 32 * self.interlinks.len());
        self.write_to(&mut w);
        w.into_bytes()
    }

    pub(crate) fn write_to(&self, w: &mut ByteWriter) {
        let header_bytes = self.header.bytes();
        w.put_u32(header_bytes.len() as u32);
        w.put_bytes(&header_bytes);
        w.put_u32(self.interlinks.len() as u32);
        for link in &self.interlinks {
            w.put_bytes(link.as_bytes());
        }
    }

    /// Parse from the exact byte encoding produced by [`serialize`].
    ///
    /// [`serialize`]: Self::serialize
    pub fn parse(data: &[u8]) -> NipopowResult<Self> {
        let mut r = ByteReader::new(data);
        let parsed = Self::read_from(&mut r)?;
        if !r.is_finished() {
            return Err(NipopowError::MalformedProof(format!(
                "{} trailing bytes after PoPowHeader",
                r.remaining()
            )));
        }
        Ok(parsed)
    }

    pub(crate) fn read_from(r: &mut ByteReader<'_>) -> NipopowResult<Self> {
        let header_len = r.get_u32()? as usize;
        let header_bytes = r.get_bytes(header_len)?;
        let header = Header::parse(header_bytes)?;
        let links_count = r.get_count(32)?;
        let mut interlinks = Vec::with_capacity(links_count);
        for _ in 0..links_count {
            interlinks.push(BlockId::from(r.get_array_32()?));
        }
        Ok(Self { header, interlinks })
    }
}
