use std::sync::Arc;

use crate::address::Address;
use crate::cell::{Cell, CellRef, MAX_BITS, MAX_DEPTH, MAX_REFS};
use crate::error::{Error, Result};
use crate::slice::CellSlice;

/// Accumulates bits and child references for one cell.
///
/// Every `store_*` method consumes the builder and returns it, so calls
/// chain fluently and a finalized builder cannot be touched again:
/// [`build`](CellBuilder::build) takes the builder by value, making
/// mutation-after-finalize a compile error rather than a runtime one.
///
/// ```
/// use toncast_core::CellBuilder;
///
/// let cell = CellBuilder::new()
///     .store_uint(3, 32)?
///     .store_bit(true)?
///     .build();
/// assert_eq!(cell.bit_len(), 33);
/// # Ok::<(), toncast_core::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<CellRef>,
}

impl CellBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits stored so far.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    fn ensure_bits(&self, requested: usize) -> Result<()> {
        if self.bit_len + requested > MAX_BITS {
            return Err(Error::CapacityExceeded {
                used: self.bit_len,
                requested,
                max: MAX_BITS,
                unit: "bits",
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.bit_len / 8] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Appends a single bit.
    pub fn store_bit(mut self, bit: bool) -> Result<Self> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Appends `value` as a big-endian unsigned integer of `bits` bits.
    ///
    /// Fails with [`Error::FieldOutOfRange`] when `value` does not fit the
    /// declared width, [`Error::CapacityExceeded`] past the 1023-bit budget.
    pub fn store_uint(mut self, value: u128, bits: usize) -> Result<Self> {
        if bits > 128 || (bits < 128 && value >> bits != 0) {
            return Err(Error::FieldOutOfRange { value, bits });
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit(value >> i & 1 == 1);
        }
        Ok(self)
    }

    /// Appends `8 * bytes.len()` bits. Works at any bit alignment.
    pub fn store_bytes(mut self, bytes: &[u8]) -> Result<Self> {
        self.ensure_bits(bytes.len() * 8)?;
        for &byte in bytes {
            for i in (0..8).rev() {
                self.push_bit(byte >> i & 1 == 1);
            }
        }
        Ok(self)
    }

    /// Appends a coin amount as VarUInteger 16: a 4-bit byte-count nibble
    /// followed by that many big-endian bytes. Zero is the nibble `0` with
    /// no bytes. Amounts needing more than 15 bytes are out of range.
    pub fn store_coins(self, amount: u128) -> Result<Self> {
        let len = ((128 - amount.leading_zeros() as usize) + 7) / 8;
        if len > 15 {
            return Err(Error::FieldOutOfRange {
                value: amount,
                bits: 120,
            });
        }
        self.store_uint(len as u128, 4)?.store_uint(amount, len * 8)
    }

    /// Appends an address: `addr_std` (tag `10`, anycast `0`, 8-bit
    /// workchain, 256-bit hash) for `Some`, the 2-bit `addr_none` marker
    /// for `None`.
    pub fn store_address(self, address: Option<&Address>) -> Result<Self> {
        match address {
            None => self.store_uint(0b00, 2),
            Some(addr) => self
                .store_uint(0b100, 3)
                .and_then(|b| b.store_uint(addr.workchain as u8 as u128, 8))
                .and_then(|b| b.store_bytes(&addr.hash)),
        }
    }

    /// Attaches a child reference. Fails when 4 children are already
    /// attached, or when the child would put the finished cell past the
    /// maximum tree depth.
    pub fn store_ref(mut self, cell: CellRef) -> Result<Self> {
        if self.refs.len() >= MAX_REFS {
            return Err(Error::CapacityExceeded {
                used: self.refs.len(),
                requested: 1,
                max: MAX_REFS,
                unit: "refs",
            });
        }
        if cell.depth() as usize >= MAX_DEPTH {
            return Err(Error::CapacityExceeded {
                used: cell.depth() as usize,
                requested: 1,
                max: MAX_DEPTH,
                unit: "depth",
            });
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Appends the remaining bits and references of a slice.
    pub fn store_slice(mut self, slice: &CellSlice<'_>) -> Result<Self> {
        self.ensure_bits(slice.remaining_bits())?;
        for i in 0..slice.remaining_bits() {
            self.push_bit(slice.peek_bit(i));
        }
        for r in slice.remaining_refs() {
            self = self.store_ref(r.clone())?;
        }
        Ok(self)
    }

    /// Finalizes the builder into an immutable cell.
    pub fn build(self) -> Cell {
        Cell::from_parts(self.data, self.bit_len, self.refs)
    }

    /// Finalizes into a shared [`CellRef`].
    pub fn build_ref(self) -> CellRef {
        Arc::new(self.build())
    }
}
