//! Fixed-layout NFT message bodies and deployment state.
//!
//! Field layouts follow the collection/item contracts: a 32-bit operation
//! code and 64-bit query id first, then type-specific fields, numeric
//! fields big-endian.

use crate::address::Address;
use crate::builder::CellBuilder;
use crate::cell::CellRef;
use crate::error::Result;
use crate::metadata::Metadata;

/// Operation code of a collection mint message.
pub const OP_MINT: u32 = 1;
/// Operation code of an item ownership transfer.
pub const OP_TRANSFER: u32 = 0x5fcc3d14;
/// Operation code of a collection owner change.
pub const OP_CHANGE_OWNER: u32 = 3;

/// Compiled contract code cells, injected by the caller (typically loaded
/// from build artifacts by the CLI). The library never touches the
/// filesystem itself.
#[derive(Clone)]
pub struct NftCodes {
    pub collection: CellRef,
    pub item: CellRef,
}

/// Builds a mint body: op, query id, item index, forward amount, then a
/// reference to the item's init payload (owner address plus a reference
/// to its on-chain content).
///
/// `item_index` is declared 64 bits wide; values at or above 2^64 fail
/// with [`Error::FieldOutOfRange`](crate::Error::FieldOutOfRange).
pub fn mint_body(
    query_id: u64,
    item_index: u128,
    forward_amount: u128,
    item_owner: &Address,
    item_content: CellRef,
) -> Result<CellRef> {
    let init = CellBuilder::new()
        .store_address(Some(item_owner))?
        .store_ref(item_content)?
        .build_ref();
    Ok(CellBuilder::new()
        .store_uint(OP_MINT as u128, 32)?
        .store_uint(query_id as u128, 64)?
        .store_uint(item_index, 64)?
        .store_coins(forward_amount)?
        .store_ref(init)?
        .build_ref())
}

/// Builds an item transfer body. After the fixed fields comes the forward
/// payload: its bytes when present, a single padding bit when absent but
/// `forward_amount > 0` (the item contract requires at least one bit
/// there), nothing otherwise.
pub fn transfer_body(
    query_id: u64,
    new_owner: Option<&Address>,
    response_destination: Option<&Address>,
    forward_amount: u128,
    forward_payload: Option<&[u8]>,
) -> Result<CellRef> {
    let builder = CellBuilder::new()
        .store_uint(OP_TRANSFER as u128, 32)?
        .store_uint(query_id as u128, 64)?
        .store_address(new_owner)?
        .store_address(response_destination)?
        .store_bit(false)? // no custom payload
        .store_coins(forward_amount)?;
    let builder = match forward_payload {
        Some(payload) if !payload.is_empty() => builder.store_bytes(payload)?,
        _ if forward_amount > 0 => builder.store_bit(false)?,
        _ => builder,
    };
    Ok(builder.build_ref())
}

/// Builds a collection owner change body.
pub fn change_owner_body(query_id: u64, new_owner: &Address) -> Result<CellRef> {
    Ok(CellBuilder::new()
        .store_uint(OP_CHANGE_OWNER as u128, 32)?
        .store_uint(query_id as u128, 64)?
        .store_address(Some(new_owner))?
        .build_ref())
}

/// Builds the initial storage of a collection contract: owner, next item
/// index 0, a content container (collection content dictionary plus an
/// empty common-content cell), and the item code.
pub fn collection_data(
    owner: &Address,
    metadata: &Metadata,
    item_code: CellRef,
) -> Result<CellRef> {
    let content = CellBuilder::new()
        .store_ref(metadata.to_cell()?)?
        .store_ref(CellBuilder::new().build_ref())?
        .build_ref();
    Ok(CellBuilder::new()
        .store_address(Some(owner))?
        .store_uint(0, 64)?
        .store_ref(content)?
        .store_ref(item_code)?
        .build_ref())
}

/// The code/data pair that deterministically derives a contract's address
/// and initializes it on first message.
#[derive(Clone)]
pub struct StateInit {
    pub code: CellRef,
    pub data: CellRef,
}

impl StateInit {
    pub fn new(code: CellRef, data: CellRef) -> Self {
        StateInit { code, data }
    }

    /// Serializes as: no split depth, not special, code present (by ref),
    /// data present (by ref), no libraries.
    pub fn to_cell(&self) -> Result<CellRef> {
        Ok(CellBuilder::new()
            .store_uint(0, 2)?
            .store_bit(true)?
            .store_ref(self.code.clone())?
            .store_bit(true)?
            .store_ref(self.data.clone())?
            .store_bit(false)?
            .build_ref())
    }
}

/// The address a contract will occupy once deployed with this state: the
/// representation hash of the StateInit cell, in the given workchain.
pub fn contract_address(workchain: i8, init: &StateInit) -> Result<Address> {
    Ok(Address::new(workchain, init.to_cell()?.hash()))
}
