//! Dynamically-typed message values.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// A single field value.
///
/// Decoding produces `Int` (varint), `Fixed64`, `Float32`, `Text`, `Bytes`,
/// `Message` and `Repeated`. `Bool` only appears on the encode side; on the
/// wire it is a varint and decodes back as `Int`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Fixed64(u64),
    Float32(f32),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Message(Message),
    /// A field that occurred more than once, in encounter order.
    Repeated(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Fixed64(_) => "fixed64",
            Value::Float32(_) => "float32",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Message(_) => "message",
            Value::Repeated(_) => "repeated",
        }
    }

    /// Integer view. `Fixed64` is reinterpreted bit for bit.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Fixed64(v) => Some(*v as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Unsigned view of an integer field, accepting either signed or
    /// unsigned representations of the same 64-bit pattern.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => Some(*v as u64),
            Value::Fixed64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Elements of a repeated value; a scalar is a one-element slice.
    pub fn as_slice(&self) -> &[Value] {
        match self {
            Value::Repeated(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// First occurrence of the field.
    pub fn first(&self) -> Option<&Value> {
        self.as_slice().first()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Fixed64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Repeated(v)
    }
}

/// A message: field-number keys mapped to values.
///
/// Keys are decimal field numbers. Unknown fields are kept under their
/// numeric key like any other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    fields: BTreeMap<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert keyed by field number.
    pub fn with(mut self, field: u32, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Insert under a raw key, replacing any previous value.
    ///
    /// The key is validated at encode time, not here.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Record another occurrence of `field`.
    ///
    /// The first occurrence is stored as a scalar; the second turns it into
    /// a `Repeated` holding both, in order.
    pub fn push(&mut self, field: u32, value: Value) {
        match self.fields.entry(field.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Repeated(items) => items.push(value),
                existing => {
                    let first = std::mem::replace(existing, Value::Repeated(Vec::new()));
                    *existing = Value::Repeated(vec![first, value]);
                }
            },
        }
    }

    pub fn get(&self, field: u32) -> Option<&Value> {
        self.fields.get(&field.to_string())
    }

    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, field: u32) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate in key order (lexical, not numeric).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
