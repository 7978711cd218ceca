//! Cell-tree construction and canonical serialization for TON NFT
//! payloads.
//!
//! Core concepts:
//! - **Cell**: the atomic tree unit of up to 1023 data bits and 4 child
//!   references, immutable once built, with a lazily cached hash
//! - **CellBuilder**: consuming fluent builder enforcing the per-cell
//!   bit and reference budgets
//! - **Snake encoding**: chaining oversized byte payloads across cells
//!   via single-child references
//! - **ContentDict**: TEP-64 on-chain metadata dictionary keyed by
//!   SHA-256 of the field name
//! - **Bag of cells**: the deduplicated, index-referenced flat byte
//!   encoding of a finished tree
//! - **DeepLink**: the `ton://transfer/...` URI wrapping a serialized
//!   payload for a wallet application
//!
//! # Example
//!
//! ```
//! use toncast_core::{message, Address, DeepLink};
//!
//! let nft = Address::parse("EQCQMcvQkJaukQkocQUG2dnTAk-s2_WzAx8JOnxI7LKDKdm8")?;
//! let body = message::transfer_body(0, None, None, 0, None)?;
//! let url = DeepLink::new(nft, 50_000_000).with_body(body).to_url()?;
//! assert!(url.starts_with("ton://transfer/"));
//! # Ok::<(), toncast_core::Error>(())
//! ```

mod address;
pub mod boc;
mod builder;
mod cell;
mod crc;
pub mod dict;
mod error;
mod link;
pub mod message;
mod metadata;
mod slice;
pub mod snake;

pub use address::Address;
pub use builder::CellBuilder;
pub use cell::{Cell, CellRef, MAX_BITS, MAX_DEPTH, MAX_REFS};
pub use dict::ContentDict;
pub use error::{Error, Result};
pub use link::DeepLink;
pub use message::{NftCodes, StateInit};
pub use metadata::Metadata;
pub use slice::CellSlice;
