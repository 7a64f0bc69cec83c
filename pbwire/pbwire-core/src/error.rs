//! Errors raised while reading raw wire-format input.

/// Malformed wire-format input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The input ended in the middle of a key, varint or fixed-width value.
    #[error("unexpected end of input")]
    Truncated,

    /// A varint ran past 10 bytes or carried bits beyond 64.
    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    /// The low three bits of a key named wire type 6 or 7.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),

    /// A key carried tag 0 or a tag of 2^29 or more.
    #[error("invalid field tag {0}")]
    InvalidTag(u64),

    /// A length prefix pointed past the end of the input.
    #[error("length {length} exceeds remaining input of {remaining} bytes")]
    LengthOutOfBounds { length: u64, remaining: usize },

    /// An end-group key did not close the innermost open group.
    #[error("unexpected end-group key for tag {found} (open group: {expected:?})")]
    UnexpectedEndGroup { expected: Option<u32>, found: u32 },

    /// The input ended before the end-group key of an open group.
    #[error("group {tag} is not terminated")]
    UnterminatedGroup { tag: u32 },

    /// Nested messages or groups exceeded the configured recursion limit.
    #[error("nesting exceeds the recursion limit")]
    RecursionLimitExceeded,
}
