//! Minimal protobuf wire codec driven by hand-written field maps.
//!
//! There is no `.proto` compiler here. Messages are [`Message`] maps from
//! field-number keys to tagged [`Value`]s, and a [`Schema`] tells the encoder
//! how to frame each field. Fields missing from the schema are framed from
//! the value's own shape.
//!
//! # Components
//!
//! - [`wire`]: varint and tag primitives
//! - [`value`]: `Value` / `Message` data model
//! - [`schema`]: `Schema` / `FieldDef` field maps
//! - [`encode`]: deterministic schema-driven encoder
//! - [`decode`]: schema-less decoder
//! - [`schemas`]: check-in request schema
//!
//! # Decoding is a guess
//!
//! The wire format does not say whether a length-delimited payload is a
//! nested message, a string or raw bytes. [`decode`] tries a nested message
//! first, then UTF-8 text made of printable bytes, then raw bytes. A binary
//! blob that happens to parse as a valid message comes back as
//! [`Value::Message`]; callers that know the real type must convert it
//! themselves.

pub mod decode;
pub mod encode;
pub mod error;
pub mod schema;
pub mod schemas;
pub mod value;
pub mod wire;

pub use decode::decode;
pub use encode::{encode, encode_schemaless};
pub use error::{ProtoError, Result};
pub use schema::{FieldDef, FieldType, Schema};
pub use schemas::checkin_request_schema;
pub use value::{Message, Value};
pub use wire::WireType;
