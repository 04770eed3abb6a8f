//! Wire-level primitives: varints, tags and wire types.

use crate::error::{ProtoError, Result};

/// Longest possible varint encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Largest field number the wire format allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// How a field's payload is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Bytes = 2,
    Fixed32 = 5,
}

impl WireType {
    /// Map the low three tag bits to a supported wire type.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::Bytes),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

/// Append `value` as an unsigned base-128 varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Append a `(field << 3) | wire_type` tag.
pub fn write_tag(buf: &mut Vec<u8>, field: u32, wire_type: WireType) {
    write_varint(buf, (u64::from(field) << 3) | wire_type as u64);
}

/// Append a length-delimited payload (length prefix followed by the bytes).
pub fn write_length_delimited(buf: &mut Vec<u8>, field: u32, payload: &[u8]) {
    write_tag(buf, field, WireType::Bytes);
    write_varint(buf, payload.len() as u64);
    buf.extend_from_slice(payload);
}

/// Read a varint starting at `offset`, returning the value and the offset
/// just past it.
pub fn read_varint(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = *data
            .get(offset + i)
            .ok_or(ProtoError::MalformedVarint { offset })?;
        // The tenth byte may only contribute the top bit.
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(ProtoError::MalformedVarint { offset });
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, offset + i + 1));
        }
    }
    Err(ProtoError::MalformedVarint { offset })
}
