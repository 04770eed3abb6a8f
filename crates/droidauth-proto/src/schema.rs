//! Hand-written field maps that drive the encoder.

use std::collections::BTreeMap;

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Text,
    Bytes,
    Message,
    Bool,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Int => "integer",
            FieldType::Text => "text",
            FieldType::Bytes => "bytes",
            FieldType::Message => "message",
            FieldType::Bool => "boolean",
        }
    }
}

/// How one field is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub field_type: FieldType,
    pub repeated: bool,
    /// Schema for a `Message` field. `None` means every nested field is
    /// auto-detected.
    pub nested: Option<Schema>,
}

impl FieldDef {
    fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            repeated: false,
            nested: None,
        }
    }

    pub fn int() -> Self {
        Self::of(FieldType::Int)
    }

    pub fn text() -> Self {
        Self::of(FieldType::Text)
    }

    pub fn bytes() -> Self {
        Self::of(FieldType::Bytes)
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Bool)
    }

    pub fn message(schema: Schema) -> Self {
        Self {
            nested: Some(schema),
            ..Self::of(FieldType::Message)
        }
    }

    /// Mark the field as repeated: each element becomes its own tag+payload.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// A field-number → definition map for one message level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<u32, FieldDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field definition.
    ///
    /// # Panics
    ///
    /// Panics if `number` is already defined at this level. Schemas are
    /// static tables, so a duplicate is a programming error.
    pub fn field(mut self, number: u32, def: FieldDef) -> Self {
        let previous = self.fields.insert(number, def);
        assert!(previous.is_none(), "duplicate schema field {number}");
        self
    }

    pub fn get(&self, number: u32) -> Option<&FieldDef> {
        self.fields.get(&number)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
