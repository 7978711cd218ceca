use crate::cell::{Cell, CellRef};
use crate::error::{Error, Result};

/// Sequential reader over a cell's bits and references.
///
/// Used by the snake decoder, the dictionary reader and round-trip tests;
/// the encoding side never needs it except for [`store_slice`]
/// (`CellBuilder::store_slice`).
///
/// [`store_slice`]: crate::CellBuilder::store_slice
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    /// Starts reading at the beginning of the cell.
    pub fn new(cell: &'a Cell) -> Self {
        CellSlice {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Bits left to read.
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    /// References left to read.
    pub fn remaining_refs(&self) -> &[CellRef] {
        &self.cell.refs()[self.ref_pos..]
    }

    /// Looks at the bit `offset` positions ahead without consuming it.
    /// Panics if out of range.
    pub(crate) fn peek_bit(&self, offset: usize) -> bool {
        self.cell.bit(self.bit_pos + offset)
    }

    fn underrun(&self, what: &str) -> Error {
        Error::InvalidBoc(format!("slice underrun reading {what}"))
    }

    /// Reads one bit.
    pub fn load_bit(&mut self) -> Result<bool> {
        if self.remaining_bits() == 0 {
            return Err(self.underrun("bit"));
        }
        let bit = self.cell.bit(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Reads a big-endian unsigned integer of `bits` bits (`bits <= 128`).
    pub fn load_uint(&mut self, bits: usize) -> Result<u128> {
        if bits > 128 {
            return Err(Error::InvalidBoc(format!("load_uint of {bits} bits")));
        }
        if self.remaining_bits() < bits {
            return Err(self.underrun("uint"));
        }
        let mut value = 0u128;
        for _ in 0..bits {
            value = value << 1 | self.load_bit()? as u128;
        }
        Ok(value)
    }

    /// Reads `count` bytes (works at any bit alignment).
    pub fn load_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        if self.remaining_bits() < count * 8 {
            return Err(self.underrun("bytes"));
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.load_uint(8)? as u8);
        }
        Ok(out)
    }

    /// Reads every remaining full byte; fails if the slice position is not
    /// byte aligned with the end of data.
    pub fn load_remaining_bytes(&mut self) -> Result<Vec<u8>> {
        if self.remaining_bits() % 8 != 0 {
            return Err(Error::InvalidBoc(format!(
                "{} remaining bits are not byte aligned",
                self.remaining_bits()
            )));
        }
        self.load_bytes(self.remaining_bits() / 8)
    }

    /// Reads the next child reference.
    pub fn load_ref(&mut self) -> Result<&'a CellRef> {
        let refs: &'a [CellRef] = self.cell.refs();
        match refs.get(self.ref_pos) {
            Some(r) => {
                self.ref_pos += 1;
                Ok(r)
            }
            None => Err(self.underrun("ref")),
        }
    }
}
