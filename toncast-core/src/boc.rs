//! Bag-of-cells: the canonical flat byte encoding of a cell tree.
//!
//! Cells are listed root first in reverse post-order, so every reference
//! points at a strictly larger index; a subtree shared through the same
//! [`CellRef`] is written once and referenced by index from each parent
//! (deduplication is by pointer identity, not content equality).

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::debug;

use crate::cell::{Cell, CellRef, MAX_BITS, MAX_DEPTH, MAX_REFS};
use crate::crc::crc32c;
use crate::error::{Error, Result};

/// Magic prefix of a serialized bag of cells.
pub const BOC_MAGIC: u32 = 0xb5ee9c72;

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;

/// Serializes a tree with the default wallet-facing settings (CRC32-C
/// trailer on).
pub fn serialize(root: &CellRef) -> Result<Vec<u8>> {
    serialize_with(root, true)
}

/// Serializes a tree, optionally appending the CRC32-C trailer.
/// Deterministic: identical trees produce identical bytes.
pub fn serialize_with(root: &CellRef, with_crc: bool) -> Result<Vec<u8>> {
    let cells = flatten(root)?;
    let index: HashMap<*const Cell, usize> = cells
        .iter()
        .enumerate()
        .map(|(i, c)| (Arc::as_ptr(c), i))
        .collect();

    let ref_bytes = bytes_for(cells.len() as u64);
    let data_size: usize = cells
        .iter()
        .map(|c| 2 + c.bit_len().div_ceil(8) + c.refs().len() * ref_bytes)
        .sum();
    let off_bytes = bytes_for(data_size as u64);

    let mut out = Vec::with_capacity(4 + 3 + 3 * ref_bytes + off_bytes + data_size + 4);
    out.extend_from_slice(&BOC_MAGIC.to_be_bytes());
    out.push(if with_crc { FLAG_HAS_CRC } else { 0 } | ref_bytes as u8);
    out.push(off_bytes as u8);
    write_be(&mut out, cells.len() as u64, ref_bytes);
    write_be(&mut out, 1, ref_bytes); // roots
    write_be(&mut out, 0, ref_bytes); // absent
    write_be(&mut out, data_size as u64, off_bytes);
    write_be(&mut out, 0, ref_bytes); // root index

    for cell in &cells {
        out.push(cell.d1());
        out.push(cell.d2());
        out.extend_from_slice(&cell.data_with_completion_tag());
        for r in cell.refs() {
            write_be(&mut out, index[&Arc::as_ptr(r)] as u64, ref_bytes);
        }
    }

    if with_crc {
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }
    debug!("serialized {} cells into {} bytes", cells.len(), out.len());
    Ok(out)
}

/// Renders container bytes as URL-safe base64: `+` → `-`, `/` → `_`,
/// padding stripped.
pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Flattens the tree into root-first order: post-order walk (children
/// before parents, each distinct cell once), then reversed. A visiting
/// set guards against cycles, which builders cannot produce but a broken
/// caller could; recursion is bounded by the [`MAX_DEPTH`] cap enforced
/// at construction.
fn flatten(root: &CellRef) -> Result<Vec<CellRef>> {
    #[derive(PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        cell: &CellRef,
        marks: &mut HashMap<*const Cell, Mark>,
        out: &mut Vec<CellRef>,
    ) -> Result<()> {
        let ptr = Arc::as_ptr(cell);
        match marks.get(&ptr) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(Error::CyclicStructure),
            None => {}
        }
        marks.insert(ptr, Mark::Visiting);
        for r in cell.refs() {
            visit(r, marks, out)?;
        }
        marks.insert(ptr, Mark::Done);
        out.push(cell.clone());
        Ok(())
    }

    let mut out = Vec::new();
    visit(root, &mut HashMap::new(), &mut out)?;
    out.reverse();
    Ok(out)
}

/// Minimum number of bytes needed to hold `value` (at least one).
fn bytes_for(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

fn write_be(out: &mut Vec<u8>, value: u64, width: usize) {
    for i in (0..width).rev() {
        out.push((value >> (8 * i)) as u8);
    }
}

/// Byte-stream reader for [`parse`].
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos + count;
        if end > self.bytes.len() {
            return Err(Error::InvalidBoc("truncated".into()));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn be(&mut self, width: usize) -> Result<u64> {
        let mut value = 0u64;
        for &byte in self.take(width)? {
            value = value << 8 | byte as u64;
        }
        Ok(value)
    }
}

/// Parses a serialized bag of cells back into its (single) root cell.
///
/// Accepts the optional index section and CRC trailer; rejects exotic
/// cells, absent cells and malformed descriptors with
/// [`Error::InvalidBoc`].
pub fn parse(bytes: &[u8]) -> Result<CellRef> {
    let mut r = Reader { bytes, pos: 0 };
    let magic = r.be(4)? as u32;
    if magic != BOC_MAGIC {
        return Err(Error::InvalidBoc(format!("bad magic {magic:#010x}")));
    }

    let flags = r.byte()?;
    let has_index = flags & FLAG_HAS_INDEX != 0;
    let has_crc = flags & FLAG_HAS_CRC != 0;
    let _has_cache_bits = flags & FLAG_HAS_CACHE_BITS != 0;
    let ref_bytes = (flags & 0x07) as usize;
    if ref_bytes == 0 || ref_bytes > 8 {
        return Err(Error::InvalidBoc(format!("ref width {ref_bytes}")));
    }
    let off_bytes = r.byte()? as usize;
    if off_bytes == 0 || off_bytes > 8 {
        return Err(Error::InvalidBoc(format!("offset width {off_bytes}")));
    }

    let cell_count = r.be(ref_bytes)? as usize;
    let root_count = r.be(ref_bytes)? as usize;
    let absent_count = r.be(ref_bytes)? as usize;
    if root_count != 1 {
        return Err(Error::InvalidBoc(format!("{root_count} roots, expected 1")));
    }
    if absent_count != 0 {
        return Err(Error::InvalidBoc("absent cells unsupported".into()));
    }
    if cell_count == 0 {
        return Err(Error::InvalidBoc("no cells".into()));
    }
    // Every cell occupies at least its two descriptor bytes, so the count
    // is bounded by the input length. Checked before the count sizes any
    // allocation or multiplication.
    if cell_count > bytes.len() / 2 {
        return Err(Error::InvalidBoc(format!(
            "{cell_count} cells cannot fit in {} bytes",
            bytes.len()
        )));
    }
    let data_size = r.be(off_bytes)? as usize;
    let root_index = r.be(ref_bytes)? as usize;
    if root_index >= cell_count {
        return Err(Error::InvalidBoc("root index out of range".into()));
    }
    if has_index {
        r.take(cell_count * off_bytes)?;
    }

    if has_crc {
        let body_len = bytes
            .len()
            .checked_sub(4)
            .ok_or_else(|| Error::InvalidBoc("truncated".into()))?;
        let stored = u32::from_le_bytes(
            bytes[body_len..].try_into().expect("4 trailing bytes"),
        );
        if crc32c(&bytes[..body_len]) != stored {
            return Err(Error::InvalidBoc("checksum mismatch".into()));
        }
    }

    let data_start = r.pos;
    let mut raw: Vec<(Vec<u8>, usize, Vec<usize>)> = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        let d1 = r.byte()?;
        let d2 = r.byte()? as usize;
        if d1 & 0x08 != 0 {
            return Err(Error::InvalidBoc("exotic cells unsupported".into()));
        }
        let ref_count = (d1 & 0x07) as usize;
        if ref_count > MAX_REFS {
            return Err(Error::InvalidBoc(format!("{ref_count} refs in one cell")));
        }
        let byte_len = d2.div_ceil(2);
        let mut data = r.take(byte_len)?.to_vec();
        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            // Completion tag: the lowest set bit of the last byte marks
            // the end of data.
            let last = *data.last().ok_or_else(|| {
                Error::InvalidBoc("partial byte with no data".into())
            })?;
            if last == 0 {
                return Err(Error::InvalidBoc("missing completion tag".into()));
            }
            let tag_bits = last.trailing_zeros() as usize + 1;
            if tag_bits >= 8 {
                // A partial byte with no data bits contradicts d2.
                return Err(Error::InvalidBoc("empty partial byte".into()));
            }
            // Clear the tag and everything below it.
            let idx = data.len() - 1;
            data[idx] = last & (0xffu8 << tag_bits);
            byte_len * 8 - tag_bits
        };
        if bit_len > MAX_BITS {
            return Err(Error::InvalidBoc(format!("{bit_len} bits in one cell")));
        }
        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let target = r.be(ref_bytes)? as usize;
            if target <= i || target >= cell_count {
                return Err(Error::InvalidBoc(format!(
                    "cell {i} references {target}"
                )));
            }
            refs.push(target);
        }
        raw.push((data, bit_len, refs));
    }
    if r.pos - data_start != data_size {
        return Err(Error::InvalidBoc(format!(
            "cell data occupies {} bytes, header says {data_size}",
            r.pos - data_start
        )));
    }

    // References only point forward, so build back to front. Evaluating
    // every cell's depth as it is built keeps the cached recursion one
    // level deep and catches over-deep chains before the root exists.
    let mut cells: Vec<Option<CellRef>> = vec![None; cell_count];
    for (i, (data, bit_len, refs)) in raw.into_iter().enumerate().rev() {
        let children: Vec<CellRef> = refs
            .iter()
            .map(|&t| cells[t].clone().expect("forward refs already built"))
            .collect();
        let cell = Arc::new(Cell::from_parts(data, bit_len, children));
        if cell.depth() as usize > MAX_DEPTH {
            return Err(Error::InvalidBoc(format!(
                "cell {i} sits deeper than {MAX_DEPTH} levels"
            )));
        }
        cells[i] = Some(cell);
    }
    debug!("parsed {cell_count} cells");
    Ok(cells[root_index].take().expect("all cells built"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CellBuilder;

    #[test]
    fn empty_cell_known_vector() {
        let root = CellBuilder::new().build_ref();
        let bytes = serialize_with(&root, false).unwrap();
        assert_eq!(
            bytes,
            [0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn crc_trailer_roundtrips() {
        let root = CellBuilder::new().store_uint(42, 32).unwrap().build_ref();
        let bytes = serialize(&root).unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(*parsed, *root);

        let mut broken = bytes.clone();
        let last = broken.len() - 1;
        broken[last] ^= 0xff;
        assert!(matches!(parse(&broken), Err(Error::InvalidBoc(_))));
    }

    #[test]
    fn shared_subtree_serialized_once() {
        let shared = CellBuilder::new().store_bytes(b"shared").unwrap().build_ref();
        let left = CellBuilder::new()
            .store_bit(false)
            .unwrap()
            .store_ref(shared.clone())
            .unwrap()
            .build_ref();
        let right = CellBuilder::new()
            .store_bit(true)
            .unwrap()
            .store_ref(shared.clone())
            .unwrap()
            .build_ref();
        let root = CellBuilder::new()
            .store_ref(left)
            .unwrap()
            .store_ref(right)
            .unwrap()
            .build_ref();

        let cells = flatten(&root).unwrap();
        assert_eq!(cells.len(), 4); // root, left, right, shared once

        // Both parents must record the same index for the shared child.
        let shared_ptr = Arc::as_ptr(&shared);
        let positions: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, c)| Arc::as_ptr(c) == shared_ptr)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions.len(), 1);

        // An identical but distinct cell is NOT deduplicated.
        let clone = CellBuilder::new().store_bytes(b"shared").unwrap().build_ref();
        let root2 = CellBuilder::new()
            .store_ref(shared)
            .unwrap()
            .store_ref(clone)
            .unwrap()
            .build_ref();
        assert_eq!(flatten(&root2).unwrap().len(), 3);
    }

    #[test]
    fn deterministic_output() {
        let build = || {
            CellBuilder::new()
                .store_uint(7, 13)
                .unwrap()
                .store_ref(CellBuilder::new().store_bytes(b"leaf").unwrap().build_ref())
                .unwrap()
                .build_ref()
        };
        assert_eq!(serialize(&build()).unwrap(), serialize(&build()).unwrap());
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let inner = CellBuilder::new().store_uint(0x1234, 16).unwrap().build_ref();
        let root = CellBuilder::new()
            .store_uint(0b10110, 5)
            .unwrap()
            .store_ref(inner.clone())
            .unwrap()
            .store_ref(inner)
            .unwrap()
            .build_ref();
        let parsed = parse(&serialize(&root).unwrap()).unwrap();
        assert_eq!(parsed.bit_len(), 5);
        assert_eq!(parsed.refs().len(), 2);
        assert_eq!(*parsed, *root);
        // The shared child comes back as one deduplicated cell.
        assert_eq!(
            Arc::as_ptr(&parsed.refs()[0]),
            Arc::as_ptr(&parsed.refs()[1])
        );
    }

    #[test]
    fn base64url_alphabet() {
        // 0xfb 0xff encodes to "-_8" in the URL alphabet ("+/8" standard).
        assert_eq!(to_base64url(&[0xfb, 0xff]), "-_8");
        let encoded = to_base64url(&serialize(&CellBuilder::new().build_ref()).unwrap());
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
    }

    #[test]
    fn huge_cell_count_rejected() {
        // ref width 7, cell count 2^55: a 35-byte header claiming more
        // cells than any input could hold.
        let mut bytes = vec![0xb5, 0xee, 0x9c, 0x72, 0x07, 0x01];
        bytes.extend_from_slice(&[0x80, 0, 0, 0, 0, 0, 0]); // cells
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1]); // roots
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0]); // absent
        bytes.push(0); // tot_cells_size
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0]); // root index
        assert!(matches!(parse(&bytes), Err(Error::InvalidBoc(_))));
    }

    #[test]
    fn overly_deep_chain_rejected() {
        // 1100 single-ref cells chained end to end, deeper than any tree
        // a builder can produce.
        let count: u16 = 1100;
        let mut body = Vec::new();
        for i in 0..count - 1 {
            body.push(0x01); // d1: one ref
            body.push(0x00); // d2: no data
            body.extend_from_slice(&(i + 1).to_be_bytes());
        }
        body.extend_from_slice(&[0x00, 0x00]); // leaf

        let mut bytes = vec![0xb5, 0xee, 0x9c, 0x72, 0x02, 0x02];
        bytes.extend_from_slice(&count.to_be_bytes()); // cells
        bytes.extend_from_slice(&[0x00, 0x01]); // roots
        bytes.extend_from_slice(&[0x00, 0x00]); // absent
        bytes.extend_from_slice(&(body.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00]); // root index
        bytes.extend_from_slice(&body);
        assert!(matches!(parse(&bytes), Err(Error::InvalidBoc(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse(&[0, 1, 2]), Err(Error::InvalidBoc(_))));
        assert!(matches!(
            parse(&[0xb5, 0xee, 0x9c, 0x73, 0x01, 0x01]),
            Err(Error::InvalidBoc(_))
        ));
    }
}
