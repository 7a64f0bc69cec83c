//! Schema-driven protocol buffers messages.
//!
//! Message types are described at runtime with [`MessageDef`]s and
//! [`EnumDef`]s, resolved into a [`SchemaRegistry`], and instantiated as
//! [`Message`]s that can be built field by field, encoded to the binary wire
//! format, and decoded back. Fields the schema does not know are preserved
//! and re-emitted on encode.
//!
//! ```
//! use pbwire::{FieldDef, Message, MessageDef, ScalarType, SchemaRegistry};
//!
//! let registry = SchemaRegistry::builder()
//!     .message(MessageDef::new(
//!         "demo.Point",
//!         vec![
//!             FieldDef::required("x", 1, ScalarType::Int32),
//!             FieldDef::repeated("tags", 4, ScalarType::Int32).packed(),
//!         ],
//!     ))
//!     .build()?;
//! let point = registry.message("demo.Point").expect("registered");
//!
//! let mut msg = Message::new(point.clone());
//! msg.set("x", 150)?;
//! msg.set_repeated("tags", [3, 270, 86942])?;
//!
//! let bytes = msg.encode_to_vec()?;
//! assert_eq!(bytes, [0x08, 0x96, 0x01, 0x22, 0x06, 0x03, 0x8E, 0x02, 0x9E, 0xA7, 0x05]);
//! assert_eq!(Message::decode(point, bytes.as_slice())?, msg);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decode;
mod encode;
mod error;
mod format;
mod message;
mod options;
mod repeated;
pub mod schema;
mod validate;
mod value;

pub use error::{
    DecodeError, EncodeError, Error, FieldError, FieldErrorKind, InvalidField, SchemaError,
};
pub use message::{Message, MessageMut};
pub use options::DecodeOptions;
pub use pbwire_core::{UnknownField, UnknownFieldSet, WireError, WireType};
pub use repeated::{RepeatedField, RepeatedFieldMut};
pub use schema::{
    Cardinality, EnumDef, EnumDescriptor, FieldDef, FieldDescriptor, FieldType, Kind,
    MessageDef, MessageDescriptor, ScalarType, SchemaRegistry, SchemaRegistryBuilder,
};
pub use value::Value;
