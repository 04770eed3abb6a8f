//! Schema-driven encoder.
//!
//! Output is deterministic: fields are written in ascending field-number
//! order regardless of map order.

use crate::error::{ProtoError, Result};
use crate::schema::{FieldDef, FieldType, Schema};
use crate::value::{Message, Value};
use crate::wire::{MAX_FIELD_NUMBER, WireType, write_length_delimited, write_tag, write_varint};

/// Encode `message` using `schema`.
///
/// Fields without a schema entry are framed from the value's shape.
pub fn encode(message: &Message, schema: &Schema) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_message(&mut buf, message, schema)?;
    Ok(buf)
}

/// Encode with every field auto-detected.
pub fn encode_schemaless(message: &Message) -> Result<Vec<u8>> {
    encode(message, &Schema::default())
}

/// Parse a message key into a field number.
///
/// Only the canonical decimal form is accepted, so `"7"` and `"07"` can never
/// both address field 7.
pub fn parse_field_key(key: &str) -> Result<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n) && n.to_string() == key)
        .ok_or_else(|| ProtoError::InvalidFieldKey(key.to_string()))
}

fn encode_message(buf: &mut Vec<u8>, message: &Message, schema: &Schema) -> Result<()> {
    let mut fields = message
        .iter()
        .map(|(key, value)| parse_field_key(key).map(|number| (number, value)))
        .collect::<Result<Vec<_>>>()?;
    fields.sort_by_key(|(number, _)| *number);

    for (number, value) in fields {
        match schema.get(number) {
            None => encode_auto(buf, number, value)?,
            Some(def) if def.repeated => {
                for item in value.as_slice() {
                    encode_typed(buf, number, item, def)?;
                }
            }
            Some(def) => encode_typed(buf, number, value, def)?,
        }
    }
    Ok(())
}

fn mismatch(field: u32, expected: FieldType, value: &Value) -> ProtoError {
    ProtoError::SchemaMismatch {
        field,
        expected: expected.name(),
        found: value.kind(),
    }
}

fn encode_typed(buf: &mut Vec<u8>, field: u32, value: &Value, def: &FieldDef) -> Result<()> {
    match (def.field_type, value) {
        (FieldType::Int, Value::Int(_) | Value::Fixed64(_) | Value::Bool(_)) => {
            let v = value
                .as_i64()
                .ok_or_else(|| mismatch(field, def.field_type, value))?;
            write_tag(buf, field, WireType::Varint);
            // Two's-complement bit pattern, not zig-zag.
            write_varint(buf, v as u64);
        }
        (FieldType::Bool, Value::Bool(b)) => {
            write_tag(buf, field, WireType::Varint);
            write_varint(buf, u64::from(*b));
        }
        (FieldType::Text, Value::Text(s)) => {
            write_length_delimited(buf, field, s.as_bytes());
        }
        (FieldType::Bytes, Value::Bytes(b)) => {
            write_length_delimited(buf, field, b);
        }
        (FieldType::Bytes, Value::Text(s)) => {
            write_length_delimited(buf, field, s.as_bytes());
        }
        (FieldType::Message, Value::Message(nested)) => {
            let empty = Schema::default();
            let nested_schema = def.nested.as_ref().unwrap_or(&empty);
            let mut sub = Vec::new();
            encode_message(&mut sub, nested, nested_schema)?;
            write_length_delimited(buf, field, &sub);
        }
        _ => return Err(mismatch(field, def.field_type, value)),
    }
    Ok(())
}

fn encode_auto(buf: &mut Vec<u8>, field: u32, value: &Value) -> Result<()> {
    match value {
        Value::Int(v) => {
            write_tag(buf, field, WireType::Varint);
            write_varint(buf, *v as u64);
        }
        Value::Bool(b) => {
            write_tag(buf, field, WireType::Varint);
            write_varint(buf, u64::from(*b));
        }
        Value::Fixed64(v) => {
            write_tag(buf, field, WireType::Fixed64);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Value::Float32(v) => {
            write_tag(buf, field, WireType::Fixed32);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Value::Text(s) => write_length_delimited(buf, field, s.as_bytes()),
        Value::Bytes(b) => write_length_delimited(buf, field, b),
        Value::Message(nested) => {
            let mut sub = Vec::new();
            encode_message(&mut sub, nested, &Schema::default())?;
            write_length_delimited(buf, field, &sub);
        }
        Value::Repeated(items) => {
            for item in items {
                if let Value::Repeated(_) = item {
                    return Err(ProtoError::SchemaMismatch {
                        field,
                        expected: "scalar element",
                        found: item.kind(),
                    });
                }
                encode_auto(buf, field, item)?;
            }
        }
    }
    Ok(())
}
