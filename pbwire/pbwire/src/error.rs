//! Error taxonomy of the message runtime.

use pbwire_core::WireError;

use crate::{schema::Cardinality, value::Value};

/// Broad class of a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A value of the wrong type, or the wrong accessor for a field.
    Type,
    /// A value of the right type that fails a range or membership check.
    Argument,
    /// A field name, tag or index that does not exist.
    Lookup,
}

/// Assignment or access that the field's descriptor does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("field '{field}' is {actual} and cannot be used as a {requested} field")]
    CardinalityMismatch {
        field: String,
        actual: Cardinality,
        requested: &'static str,
    },

    #[error("value {value} is out of range for {kind} field '{field}'")]
    OutOfRange {
        field: String,
        kind: &'static str,
        value: String,
    },

    #[error("{value} is not a constant of enum '{enum_name}' (field '{field}')")]
    UnknownEnumValue {
        field: String,
        enum_name: String,
        value: String,
    },

    #[error("message type '{message_type}' has no field named '{name}'")]
    NoSuchField { message_type: String, name: String },

    #[error("message type '{message_type}' has no field with tag {tag}")]
    NoSuchTag { message_type: String, tag: u32 },

    #[error("index {index} is out of bounds for field '{field}' of length {len}")]
    IndexOutOfBounds {
        field: String,
        index: usize,
        len: usize,
    },
}

impl FieldError {
    pub fn kind(&self) -> FieldErrorKind {
        match self {
            Self::TypeMismatch { .. } | Self::CardinalityMismatch { .. } => FieldErrorKind::Type,
            Self::OutOfRange { .. } | Self::UnknownEnumValue { .. } => FieldErrorKind::Argument,
            Self::NoSuchField { .. } | Self::NoSuchTag { .. } | Self::IndexOutOfBounds { .. } => {
                FieldErrorKind::Lookup
            }
        }
    }
}

/// A required field that is not set, with enough context to report it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("required field '{path}' (tag {tag}) is not set")]
pub struct InvalidField {
    /// Full name of the message type declaring the field.
    pub message_type: String,
    /// Dotted location from the validated root, e.g. `A.sub3.payload_type`.
    pub path: String,
    pub name: String,
    pub tag: u32,
    pub cardinality: Cardinality,
    /// `None` for message and group fields.
    pub default_value: Option<Value>,
}

/// Encoding refused because a required field is missing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot encode message: {invalid_field}")]
pub struct EncodeError {
    pub invalid_field: InvalidField,
}

/// Malformed or schema-incompatible input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A decoded value failed the same checks a setter applies.
    #[error("invalid value for field '{field}': {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: FieldError,
    },

    #[error("field '{field}' contains invalid UTF-8")]
    InvalidUtf8 { field: String },

    #[error("decoded message is incomplete: {0}")]
    MissingRequired(#[source] InvalidField),
}

/// Registry construction failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("type '{name}' is defined more than once")]
    DuplicateType { name: String },

    #[error("field name '{field}' is used more than once in '{message}'")]
    DuplicateFieldName { message: String, field: String },

    #[error("tag {tag} is used more than once in '{message}'")]
    DuplicateTag { message: String, tag: u32 },

    #[error("field '{message}.{field}' has invalid tag {tag}")]
    InvalidTag {
        message: String,
        field: String,
        tag: u32,
    },

    #[error("field '{message}.{field}' uses reserved tag {tag}")]
    ReservedTag {
        message: String,
        field: String,
        tag: u32,
    },

    #[error("field '{message}.{field}' refers to unknown type '{type_name}'")]
    UnresolvedType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("field '{message}.{field}' cannot be packed")]
    InvalidPacked { message: String, field: String },

    #[error("field '{message}.{field}' has an invalid default: {reason}")]
    InvalidDefault {
        message: String,
        field: String,
        reason: String,
    },

    #[error("enum '{enum_name}' declares '{value_name}' more than once")]
    DuplicateEnumValue {
        enum_name: String,
        value_name: String,
    },
}

/// Errors of the `std::io` stream adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
