//! NDR error types

use thiserror::Error;

/// Largest byte buffer a single decoded value may allocate.
pub const MAX_NDR_ALLOCATION_SIZE: usize = 16 * 1024 * 1024;

/// Largest element count accepted for any decoded array.
pub const MAX_NDR_ARRAY_ELEMENTS: usize = 1024 * 1024;

/// NDR encoding/decoding errors
///
/// Every variant is fatal to the message being processed; the codec never
/// retries or resynchronizes.
#[derive(Debug, Error)]
pub enum NdrError {
    /// Source exhausted before the expected shape was satisfied
    #[error("truncated input: needed {needed} bytes, have {have}")]
    TruncatedInput { needed: usize, have: usize },

    /// Enum ordinal outside the declared set
    #[error("invalid discriminant {value} for {type_name}")]
    InvalidDiscriminant { type_name: &'static str, value: u32 },

    /// Deferred referents do not match the pointers written in the body.
    ///
    /// `expected` is the number of non-null pointers seen, `found` the number
    /// of referent bodies present.
    #[error("pointer/deferred mismatch: {expected} pointers, {found} referents")]
    PointerCountMismatch { expected: usize, found: usize },

    /// Bytes left over after a message without pointers was fully decoded
    #[error("{0} trailing bytes after message")]
    TrailingData(usize),

    /// A `ref` pointer or a required value was absent
    #[error("null reference: {0}")]
    NullReference(&'static str),

    /// Value does not fit the shape it is being encoded under
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid string - not null terminated or invalid header
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Array size mismatch
    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },

    /// Self-describing array carries a different element width than expected
    #[error("element width mismatch: expected {expected}, found {found}")]
    ElementWidthMismatch { expected: u32, found: u32 },

    /// Conformance mismatch
    #[error("conformance mismatch: max_count={max_count}, actual_count={actual_count}")]
    ConformanceMismatch { max_count: u32, actual_count: u32 },

    /// Declared size is larger than the decoder is willing to allocate
    #[error("allocation of {requested} exceeds limit {limit}")]
    AllocationLimitExceeded { requested: usize, limit: usize },

    /// Size arithmetic overflowed
    #[error("integer overflow in size computation")]
    IntegerOverflow,

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16Error(#[from] std::char::DecodeUtf16Error),
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
