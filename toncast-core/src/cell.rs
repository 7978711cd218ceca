use std::fmt;
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};

/// Maximum number of data bits a single cell can hold.
pub const MAX_BITS: usize = 1023;
/// Maximum number of child references a single cell can hold.
pub const MAX_REFS: usize = 4;
/// Maximum depth of a cell tree (a leaf has depth 0). Enforced whenever
/// a reference is attached, so every recursive walk over a constructed
/// tree (hashing, depth, flattening) is bounded.
pub const MAX_DEPTH: usize = 1024;

/// Shared handle to an immutable cell.
///
/// Reusing the same `CellRef` under two parents makes the subtree appear
/// once in the serialized container; cloning the underlying `Cell` would
/// produce a second, independent entry.
pub type CellRef = Arc<Cell>;

/// A single unit of the cell tree: up to 1023 data bits and up to 4
/// references to child cells.
///
/// Cells are immutable once built (see [`CellBuilder`](crate::CellBuilder)).
/// The standard representation hash is computed lazily on first access to
/// [`hash`](Cell::hash), then cached, so large trees can be assembled
/// without hashing until an address or container actually needs it.
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<CellRef>,
    hash: OnceLock<[u8; 32]>,
    depth: OnceLock<u16>,
}

impl Cell {
    /// Builds a cell from raw parts. Callers must guarantee the invariants
    /// (`bit_len <= MAX_BITS`, `refs.len() <= MAX_REFS`, `data` holds
    /// exactly `ceil(bit_len / 8)` bytes with unused trailing bits zero).
    pub(crate) fn from_parts(data: Vec<u8>, bit_len: usize, refs: Vec<CellRef>) -> Self {
        debug_assert!(bit_len <= MAX_BITS);
        debug_assert!(refs.len() <= MAX_REFS);
        debug_assert_eq!(data.len(), bit_len.div_ceil(8));
        Cell {
            data,
            bit_len,
            refs,
            hash: OnceLock::new(),
            depth: OnceLock::new(),
        }
    }

    /// Number of data bits stored in this cell.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Raw data bytes, `ceil(bit_len / 8)` of them; trailing bits of the
    /// last byte are zero when `bit_len` is not byte aligned.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Child references, in storage order.
    pub fn refs(&self) -> &[CellRef] {
        &self.refs
    }

    /// Returns the bit at the given position (0 = most significant bit of
    /// the first byte). Panics if out of range.
    pub(crate) fn bit(&self, index: usize) -> bool {
        assert!(index < self.bit_len);
        self.data[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Data bytes with the completion tag applied: when `bit_len` is not
    /// byte aligned, a single `1` bit follows the data, then zeros.
    pub(crate) fn data_with_completion_tag(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.bit_len % 8 != 0 {
            out[self.bit_len / 8] |= 0x80 >> (self.bit_len % 8);
        }
        out
    }

    /// First descriptor byte: reference count (ordinary level-0 cells only).
    pub(crate) fn d1(&self) -> u8 {
        self.refs.len() as u8
    }

    /// Second descriptor byte: `floor(bits / 8) + ceil(bits / 8)`. Odd
    /// values mark a cell whose data ends with a completion tag.
    pub(crate) fn d2(&self) -> u8 {
        (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8
    }

    /// Depth of the cell: 0 for a leaf, one more than the deepest child
    /// otherwise. Cached after the first call.
    pub fn depth(&self) -> u16 {
        *self.depth.get_or_init(|| {
            self.refs
                .iter()
                .map(|r| r.depth() + 1)
                .max()
                .unwrap_or(0)
        })
    }

    /// Standard representation hash: SHA-256 over both descriptor bytes,
    /// the tag-completed data, each child's depth (big-endian u16) and each
    /// child's hash. Computed lazily and cached.
    pub fn hash(&self) -> [u8; 32] {
        *self.hash.get_or_init(|| {
            let mut hasher = Sha256::new();
            hasher.update([self.d1(), self.d2()]);
            hasher.update(self.data_with_completion_tag());
            for r in &self.refs {
                hasher.update(r.depth().to_be_bytes());
            }
            for r in &self.refs {
                hasher.update(r.hash());
            }
            hasher.finalize().into()
        })
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hex = String::with_capacity(self.data.len() * 2);
        for byte in &self.data {
            hex.push_str(&format!("{:02x}", byte));
        }
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex)
            .field("refs", &self.refs.len())
            .finish()
    }
}
