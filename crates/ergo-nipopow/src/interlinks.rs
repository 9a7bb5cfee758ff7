//! Interlink vector packing, unpacking and extension lookups.
//!
//! Interlinks are stored in block extensions under the reserved 0x01 key
//! prefix, run-length compressed: consecutive duplicate ids collapse to
//! one field whose value is `[count, id]`.

use crate::error::{NipopowError, NipopowResult};
use ergo_chain::{BlockId, ExtensionCandidate, ExtensionField, MerkleProof};

/// Extension key prefix reserved for the interlink vector.
pub const INTERLINK_VECTOR_PREFIX: u8 = 0x01;

/// Packed interlink value size: one count byte plus a 32-byte id.
const PACKED_VALUE_SIZE: usize = 33;

/// Pack an interlink vector into extension key-value fields.
///
/// Keys are `[INTERLINK_VECTOR_PREFIX, group_index]`, values are
/// `[duplicates_count, id]`. A run longer than 255 spills into the next
/// group. Fails when the vector needs more than 256 groups, since the
/// group index is a single byte.
pub fn pack_interlinks(links: &[BlockId]) -> NipopowResult<Vec<ExtensionField>> {
    let mut fields = Vec::new();
    let mut i = 0;
    while i < links.len() {
        let link = links[i];
        let count = links[i..]
            .iter()
            .take_while(|id| **id == link)
            .count()
            .min(255);

        let group_index = u8::try_from(fields.len()).map_err(|_| {
            NipopowError::MalformedInterlinks(format!(
                "interlink vector of {} ids needs more than 256 groups",
                links.len()
            ))
        })?;

        let mut value = Vec::with_capacity(PACKED_VALUE_SIZE);
        value.push(count as u8);
        value.extend_from_slice(link.as_bytes());
        fields.push(ExtensionField::new(
            [INTERLINK_VECTOR_PREFIX, group_index],
            value,
        ));

        i += count;
    }
    Ok(fields)
}

/// Unpack an interlink vector from extension fields.
///
/// Fields whose key does not start with [`INTERLINK_VECTOR_PREFIX`] are
/// ignored; matching fields are consumed in input order. Any matching
/// field whose value is not exactly 33 bytes fails the whole unpack.
pub fn unpack_interlinks(fields: &[ExtensionField]) -> NipopowResult<Vec<BlockId>> {
    let mut links = Vec::new();
    for field in fields
        .iter()
        .filter(|f| f.key[0] == INTERLINK_VECTOR_PREFIX)
    {
        if field.value.len() != PACKED_VALUE_SIZE {
            return Err(NipopowError::MalformedInterlinks(format!(
                "packed value of {} bytes under key {:02x}{:02x}, expected {}",
                field.value.len(),
                field.key[0],
                field.key[1],
                PACKED_VALUE_SIZE
            )));
        }
        let count = field.value[0] as usize;
        let mut id = [0u8; 32];
        id.copy_from_slice(&field.value[1..PACKED_VALUE_SIZE]);
        for _ in 0..count {
            links.push(BlockId::from(id));
        }
    }
    Ok(links)
}

/// Merkle inclusion proof for the interlink field carrying `block_id`.
///
/// Scans the candidate's ordered fields for the first interlink entry
/// whose packed id equals `block_id`; `None` when no such field exists.
pub fn proof_for_interlink_vector(
    extension: &ExtensionCandidate,
    block_id: &BlockId,
) -> Option<MerkleProof> {
    let field = extension.fields().iter().find(|f| {
        f.key[0] == INTERLINK_VECTOR_PREFIX
            && f.value.len() == PACKED_VALUE_SIZE
            && &f.value[1..PACKED_VALUE_SIZE] == block_id.as_ref()
    })?;
    extension.proof_for_key(&field.key)
}

/// Interlink vector for the block following `prev`.
///
/// The tail keeps higher levels first, so a level-μ block overwrites the
/// μ trailing slots (levels μ down to 1) with its own id; a non-positive
/// level leaves the vector unchanged. The first block after genesis gets
/// `[genesis_id]`.
pub fn update_interlinks(
    prev_id: BlockId,
    prev_level: i32,
    prev_interlinks: &[BlockId],
    prev_is_genesis: bool,
) -> NipopowResult<Vec<BlockId>> {
    if prev_is_genesis {
        return Ok(vec![prev_id]);
    }

    let genesis = *prev_interlinks.first().ok_or_else(|| {
        NipopowError::MalformedInterlinks(
            "empty interlink vector for a non-genesis parent".to_string(),
        )
    })?;

    if prev_level <= 0 {
        return Ok(prev_interlinks.to_vec());
    }

    let tail = &prev_interlinks[1..];
    let level = prev_level as usize;

    let mut result = Vec::with_capacity(1 + tail.len().max(level));
    result.push(genesis);
    result.extend_from_slice(&tail[..tail.len().saturating_sub(level)]);
    result.extend(std::iter::repeat(prev_id).take(level));
    Ok(result)
}
