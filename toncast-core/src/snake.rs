use crate::builder::CellBuilder;
use crate::cell::{Cell, CellRef};
use crate::error::{Error, Result};

/// Bytes per chunk of a snake chain. 127 bytes = 1016 bits, which leaves
/// headroom under the 1023-bit cell budget for the chains that carry a
/// leading tag byte.
pub const CHUNK_BYTES: usize = 127;

/// Encodes a byte buffer as a right-nested chain of cells: each link
/// holds up to [`CHUNK_BYTES`] bytes and at most one reference to the
/// rest of the buffer. Empty input produces a single empty cell; a
/// buffer needing more links than the maximum tree depth fails with
/// the depth capacity error.
pub fn write_bytes(data: &[u8]) -> Result<CellRef> {
    let mut tail: Option<CellRef> = None;
    for chunk in data.chunks(CHUNK_BYTES).rev() {
        let mut builder = CellBuilder::new().store_bytes(chunk)?;
        if let Some(rest) = tail.take() {
            builder = builder.store_ref(rest)?;
        }
        tail = Some(builder.build_ref());
    }
    Ok(tail.unwrap_or_else(|| CellBuilder::new().build_ref()))
}

/// Decodes a snake chain back into bytes: reads each link's data, then
/// descends into its single child until a leaf is reached.
pub fn read_bytes(root: &Cell) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut node = root;
    loop {
        if node.bit_len() % 8 != 0 {
            return Err(Error::InvalidBoc(format!(
                "snake link holds {} bits, not byte aligned",
                node.bit_len()
            )));
        }
        out.extend_from_slice(node.data());
        match node.refs() {
            [] => return Ok(out),
            [next] => node = next,
            refs => {
                return Err(Error::InvalidBoc(format!(
                    "snake link has {} refs, expected at most one",
                    refs.len()
                )))
            }
        }
    }
}
