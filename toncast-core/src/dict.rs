use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::builder::CellBuilder;
use crate::cell::{Cell, CellRef};
use crate::error::{Error, Result};
use crate::slice::CellSlice;
use crate::snake;

/// Marker byte prefixing on-chain (vs. off-chain) content cells.
pub const ONCHAIN_CONTENT_PREFIX: u8 = 0x00;
/// Marker byte prefixing snake-encoded text values.
pub const SNAKE_PREFIX: u8 = 0x00;
/// Key width of the content dictionary, in bits.
pub const KEY_BITS: usize = 256;

/// Wraps a string as a text value cell: the snake marker byte followed by
/// the UTF-8 bytes, chained across cells when longer than one chunk.
pub fn text_cell(text: &str) -> Result<CellRef> {
    let mut buf = Vec::with_capacity(text.len() + 1);
    buf.push(SNAKE_PREFIX);
    buf.extend_from_slice(text.as_bytes());
    snake::write_bytes(&buf)
}

/// On-chain content dictionary: string keys hashed with SHA-256 into
/// 256-bit big-endian integers, cell values.
///
/// Entries are held in a `BTreeMap`, so serialization order is ascending
/// key hash no matter the insertion order. Putting the same key twice
/// silently keeps the later value (map semantics).
#[derive(Default)]
pub struct ContentDict {
    entries: BTreeMap<[u8; 32], Entry>,
}

struct Entry {
    /// Source key retained to catch hash collisions between distinct keys
    /// in debug builds.
    source_key: String,
    value: CellRef,
}

impl ContentDict {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 of the key's UTF-8 bytes, as the dictionary key.
    pub fn key_hash(key: &str) -> [u8; 32] {
        Sha256::digest(key.as_bytes()).into()
    }

    /// Inserts or overwrites the value stored under `key`.
    pub fn put(&mut self, key: &str, value: CellRef) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidKey("empty key".into()));
        }
        let hash = Self::key_hash(key);
        if let Some(prev) = self.entries.get(&hash) {
            debug_assert_eq!(
                prev.source_key, key,
                "distinct keys collide after hashing"
            );
        }
        self.entries.insert(
            hash,
            Entry {
                source_key: key.to_string(),
                value,
            },
        );
        Ok(())
    }

    /// Inserts `text` wrapped as a snake text cell.
    pub fn put_str(&mut self, key: &str, text: &str) -> Result<()> {
        self.put(key, text_cell(text)?)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes to a single cell: the on-chain marker byte, then the
    /// dictionary as `HashmapE 256 ^Cell` (one absence bit when empty,
    /// else a presence bit plus a reference to the root trie edge).
    pub fn serialize(&self) -> Result<CellRef> {
        let mut builder =
            CellBuilder::new().store_uint(ONCHAIN_CONTENT_PREFIX as u128, 8)?;
        if self.entries.is_empty() {
            builder = builder.store_bit(false)?;
        } else {
            let items: Vec<(&[u8; 32], &CellRef)> = self
                .entries
                .iter()
                .map(|(k, e)| (k, &e.value))
                .collect();
            let root = build_edge(&items, 0)?;
            builder = builder.store_bit(true)?.store_ref(root)?;
        }
        Ok(builder.build_ref())
    }
}

/// Reads back the key hashes of a serialized content dictionary cell, in
/// ascending order.
pub fn keys(cell: &Cell) -> Result<Vec<[u8; 32]>> {
    let mut slice = CellSlice::new(cell);
    let prefix = slice.load_uint(8)? as u8;
    if prefix != ONCHAIN_CONTENT_PREFIX {
        return Err(Error::InvalidBoc(format!(
            "expected on-chain content prefix, got {prefix:#04x}"
        )));
    }
    let mut out = Vec::new();
    if slice.load_bit()? {
        let root = slice.load_ref()?;
        collect_keys(root, &mut Vec::with_capacity(KEY_BITS), &mut out)?;
    }
    Ok(out)
}

/// Bits needed to store a length in `0..=max` (`ceil(log2(max + 1))`).
fn bits_for(max: usize) -> usize {
    (usize::BITS - max.leading_zeros()) as usize
}

fn key_bit(key: &[u8; 32], index: usize) -> bool {
    key[index / 8] & (0x80 >> (index % 8)) != 0
}

/// Builds one trie edge for `items` (sorted ascending, non-empty), whose
/// keys agree on the first `pos` bits. The label is the longest common
/// prefix of the remaining bits; a full label makes a leaf (value stored
/// as a reference), otherwise the edge forks on the next bit.
fn build_edge(items: &[(&[u8; 32], &CellRef)], pos: usize) -> Result<CellRef> {
    let first = items[0].0;
    let last = items[items.len() - 1].0;
    let key_space = KEY_BITS - pos;

    // Sorted input: the common prefix of the set is the common prefix of
    // its extremes.
    let mut label_len = 0;
    while label_len < key_space
        && key_bit(first, pos + label_len) == key_bit(last, pos + label_len)
    {
        label_len += 1;
    }
    let label: Vec<bool> = (0..label_len)
        .map(|i| key_bit(first, pos + i))
        .collect();

    let mut builder = store_label(CellBuilder::new(), &label, key_space)?;
    let after = pos + label_len;
    if after == KEY_BITS {
        builder = builder.store_ref(items[0].1.clone())?;
    } else {
        // Both halves are non-empty: the label already absorbed every bit
        // the extremes agree on.
        let split = items.partition_point(|(k, _)| !key_bit(k, after));
        let left = build_edge(&items[..split], after + 1)?;
        let right = build_edge(&items[split..], after + 1)?;
        builder = builder.store_ref(left)?.store_ref(right)?;
    }
    Ok(builder.build_ref())
}

/// Stores an edge label using the shortest of the three encodings:
/// `hml_short$0` (unary length), `hml_long$10` (binary length) or
/// `hml_same$11` (repeated bit).
fn store_label(
    mut builder: CellBuilder,
    label: &[bool],
    key_space: usize,
) -> Result<CellBuilder> {
    let n = label.len();
    let klen = bits_for(key_space);
    let short_len = 2 * n + 2;
    let long_len = 2 + klen + n;
    let same_len = 3 + klen;
    let all_same = n > 0 && label.iter().all(|&bit| bit == label[0]);

    if all_same && same_len < short_len && same_len < long_len {
        builder = builder
            .store_uint(0b11, 2)?
            .store_bit(label[0])?
            .store_uint(n as u128, klen)?;
    } else if long_len < short_len {
        builder = builder
            .store_uint(0b10, 2)?
            .store_uint(n as u128, klen)?;
        for &bit in label {
            builder = builder.store_bit(bit)?;
        }
    } else {
        builder = builder.store_bit(false)?;
        for _ in 0..n {
            builder = builder.store_bit(true)?;
        }
        builder = builder.store_bit(false)?;
        for &bit in label {
            builder = builder.store_bit(bit)?;
        }
    }
    Ok(builder)
}

fn collect_keys(
    edge: &Cell,
    prefix: &mut Vec<bool>,
    out: &mut Vec<[u8; 32]>,
) -> Result<()> {
    let depth_before = prefix.len();
    let key_space = KEY_BITS - prefix.len();
    let klen = bits_for(key_space);
    let mut slice = CellSlice::new(edge);

    if !slice.load_bit()? {
        // hml_short: unary length, then the bits
        let mut n = 0;
        while slice.load_bit()? {
            n += 1;
        }
        for _ in 0..n {
            let bit = slice.load_bit()?;
            prefix.push(bit);
        }
    } else if !slice.load_bit()? {
        let n = slice.load_uint(klen)? as usize;
        for _ in 0..n {
            let bit = slice.load_bit()?;
            prefix.push(bit);
        }
    } else {
        let repeated = slice.load_bit()?;
        let n = slice.load_uint(klen)? as usize;
        for _ in 0..n {
            prefix.push(repeated);
        }
    }

    if prefix.len() > KEY_BITS {
        return Err(Error::InvalidBoc("trie label overruns the key".into()));
    }
    if prefix.len() == KEY_BITS {
        let mut key = [0u8; 32];
        for (i, &bit) in prefix.iter().enumerate() {
            if bit {
                key[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out.push(key);
    } else {
        let left = slice.load_ref()?.clone();
        let right = slice.load_ref()?.clone();
        prefix.push(false);
        collect_keys(&left, prefix, out)?;
        prefix.pop();
        prefix.push(true);
        collect_keys(&right, prefix, out)?;
        prefix.pop();
    }
    prefix.truncate(depth_before);
    Ok(())
}
