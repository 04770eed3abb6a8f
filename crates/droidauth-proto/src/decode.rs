//! Schema-less decoder.

use crate::error::{ProtoError, Result};
use crate::value::{Message, Value};
use crate::wire::{WireType, read_varint};

/// Nesting depth past which length-delimited payloads are no longer probed
/// as messages.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Decode protobuf bytes without a schema.
///
/// Varints become [`Value::Int`], fixed64 [`Value::Fixed64`], fixed32
/// [`Value::Float32`]. Length-delimited payloads go through
/// [`classify_payload`]. Repeated field numbers accumulate into
/// [`Value::Repeated`].
pub fn decode(data: &[u8]) -> Result<Message> {
    decode_at_depth(data, 0)
}

fn decode_at_depth(data: &[u8], depth: usize) -> Result<Message> {
    let mut message = Message::new();
    let mut pos = 0;

    while pos < data.len() {
        let (tag, next) = read_varint(data, pos)?;
        pos = next;

        let field = u32::try_from(tag >> 3)
            .ok()
            .filter(|&n| n != 0)
            .ok_or_else(|| ProtoError::InvalidFieldKey((tag >> 3).to_string()))?;
        let wire_bits = (tag & 0x7) as u8;

        let value = match WireType::from_bits(wire_bits) {
            Some(WireType::Varint) => {
                let (raw, next) = read_varint(data, pos)?;
                pos = next;
                Value::Int(raw as i64)
            }
            Some(WireType::Fixed64) => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(take(data, pos, 8, field)?);
                pos += 8;
                Value::Fixed64(u64::from_le_bytes(raw))
            }
            Some(WireType::Fixed32) => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(take(data, pos, 4, field)?);
                pos += 4;
                Value::Float32(f32::from_bits(u32::from_le_bytes(raw)))
            }
            Some(WireType::Bytes) => {
                let (len, next) = read_varint(data, pos)?;
                pos = next;
                let payload = take(data, pos, len, field)?;
                pos += payload.len();
                classify_at_depth(payload, depth + 1)
            }
            None => {
                return Err(ProtoError::UnsupportedWireType {
                    field,
                    wire_type: wire_bits,
                });
            }
        };

        message.push(field, value);
    }

    Ok(message)
}

/// Slice `len` bytes at `pos`, or report how short the buffer is.
fn take(data: &[u8], pos: usize, len: u64, field: u32) -> Result<&[u8]> {
    let available = data.len().saturating_sub(pos);
    match usize::try_from(len) {
        Ok(n) if n <= available => Ok(&data[pos..pos + n]),
        _ => Err(ProtoError::TruncatedInput {
            field,
            needed: len,
            available,
        }),
    }
}

/// Guess what a length-delimited payload is.
///
/// Order: non-empty nested message, then UTF-8 text whose bytes are all
/// printable or tab/newline/carriage-return, then raw bytes. This is a
/// heuristic; without a schema the three cannot be told apart reliably.
pub fn classify_payload(payload: &[u8]) -> Value {
    classify_at_depth(payload, 1)
}

fn classify_at_depth(payload: &[u8], depth: usize) -> Value {
    if depth <= MAX_NESTING_DEPTH
        && let Ok(nested) = decode_at_depth(payload, depth)
        && !nested.is_empty()
    {
        return Value::Message(nested);
    }

    if is_likely_text(payload)
        && let Ok(text) = std::str::from_utf8(payload)
    {
        return Value::Text(text.to_string());
    }

    Value::Bytes(payload.to_vec())
}

/// Every byte is >= 0x20 or one of `\t`, `\n`, `\r`.
pub fn is_likely_text(data: &[u8]) -> bool {
    data.iter()
        .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r'))
}
