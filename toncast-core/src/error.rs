use thiserror::Error;

/// Errors raised while building cells or serializing containers.
///
/// Every error is fatal to the current call: the in-progress structure
/// must be discarded by the caller. There is no retryable state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A cell's bit budget (1023), ref budget (4) or the tree depth
    /// budget (1024) would be exceeded.
    #[error("cell capacity exceeded: {used} + {requested} {unit} > {max}")]
    CapacityExceeded {
        /// Amount already stored in the builder
        used: usize,
        /// Amount the rejected call asked for
        requested: usize,
        /// The per-cell limit
        max: usize,
        /// "bits", "refs" or "depth"
        unit: &'static str,
    },

    /// A numeric value does not fit its declared bit width.
    #[error("value {value:#x} does not fit in {bits} bits")]
    FieldOutOfRange {
        /// The rejected value
        value: u128,
        /// Declared width in bits
        bits: usize,
    },

    /// A cell transitively references itself. Cannot be produced by
    /// `CellBuilder`, but the serializer guards against it anyway.
    #[error("cell tree contains a cycle")]
    CyclicStructure,

    /// A dictionary key is malformed (currently: empty).
    #[error("invalid dictionary key: {0}")]
    InvalidKey(String),

    /// A human-readable address string could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A bag-of-cells byte stream is malformed.
    #[error("invalid bag of cells: {0}")]
    InvalidBoc(String),
}

/// Convenient Result type alias for cell operations.
pub type Result<T> = std::result::Result<T, Error>;
