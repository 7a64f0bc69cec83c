//! Schema input definitions, as produced by a schema compiler.
//!
//! These types name their nested message and enum types by full name; the
//! names are resolved when the definitions are registered with
//! [`SchemaRegistryBuilder`](super::SchemaRegistryBuilder).

use std::fmt;

use pbwire_core::WireType;

use crate::value::Value;

/// How many values a field holds and whether it must be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Repeated => "repeated",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fifteen scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    pub fn wire_type(self) -> WireType {
        match self {
            Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64
            | Self::Bool => WireType::Varint,
            Self::Fixed64 | Self::Sfixed64 | Self::Double => WireType::Fixed64,
            Self::Fixed32 | Self::Sfixed32 | Self::Float => WireType::Fixed32,
            Self::String | Self::Bytes => WireType::LengthDelimited,
        }
    }

    /// Whether repeated fields of this type may use packed encoding.
    pub fn is_packable(self) -> bool {
        !matches!(self, Self::String | Self::Bytes)
    }

    /// Zero value returned for unset fields without an explicit default.
    pub fn default_value(self) -> Value {
        match self {
            Self::Double => Value::F64(0.0),
            Self::Float => Value::F32(0.0),
            Self::Int32 | Self::Sint32 | Self::Sfixed32 => Value::I32(0),
            Self::Int64 | Self::Sint64 | Self::Sfixed64 => Value::I64(0),
            Self::Uint32 | Self::Fixed32 => Value::U32(0),
            Self::Uint64 | Self::Fixed64 => Value::U64(0),
            Self::Bool => Value::Bool(false),
            Self::String => Value::String(String::new()),
            Self::Bytes => Value::Bytes(bytes::Bytes::new()),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a field. Named types are fully-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    Message(String),
    /// Legacy group: a nested message framed by start/end keys.
    Group(String),
    Enum(String),
}

impl FieldType {
    pub fn message(name: impl Into<String>) -> Self {
        Self::Message(name.into())
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }
}

impl From<ScalarType> for FieldType {
    fn from(value: ScalarType) -> Self {
        Self::Scalar(value)
    }
}

/// One field of a [`MessageDef`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub tag: u32,
    pub cardinality: Cardinality,
    pub ty: FieldType,
    /// Explicit default for scalar and enum fields. Enum defaults may be
    /// given either as a number or as the constant's name.
    pub default: Option<Value>,
    pub packed: bool,
}

impl FieldDef {
    pub fn new(
        name: impl Into<String>,
        tag: u32,
        cardinality: Cardinality,
        ty: impl Into<FieldType>,
    ) -> Self {
        Self {
            name: name.into(),
            tag,
            cardinality,
            ty: ty.into(),
            default: None,
            packed: false,
        }
    }

    pub fn optional(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        Self::new(name, tag, Cardinality::Optional, ty)
    }

    pub fn required(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        Self::new(name, tag, Cardinality::Required, ty)
    }

    pub fn repeated(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        Self::new(name, tag, Cardinality::Repeated, ty)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }
}

/// A message type: its full name and fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl MessageDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// An enum type: named integer constants in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<(String, i32)>,
}

impl EnumDef {
    pub fn new<N: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (N, i32)>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }
}
