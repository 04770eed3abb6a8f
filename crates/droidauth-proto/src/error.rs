//! Error types for the wire codec.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors raised by a single encode or decode call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    /// A value's runtime shape does not fit its declared field type.
    #[error("field {field}: expected {expected}, got {found}")]
    SchemaMismatch {
        field: u32,
        expected: &'static str,
        found: &'static str,
    },

    /// A message key is not a valid field number.
    #[error("invalid field key '{0}'")]
    InvalidFieldKey(String),

    /// A length prefix or fixed-width payload runs past the end of the buffer.
    #[error("field {field}: need {needed} bytes but only {available} remain")]
    TruncatedInput {
        field: u32,
        needed: u64,
        available: usize,
    },

    /// A varint did not terminate within the buffer or overflowed 64 bits.
    #[error("malformed varint at offset {offset}")]
    MalformedVarint { offset: usize },

    /// Group (3/4) or reserved (6/7) wire types.
    #[error("field {field}: unsupported wire type {wire_type}")]
    UnsupportedWireType { field: u32, wire_type: u8 },
}
