//! Dynamically typed field values and the conversions applied when a value
//! is stored into a field.

use bytes::Bytes;

use crate::{
    error::FieldError,
    message::Message,
    schema::{EnumEntry, ScalarType},
};

/// A field value.
///
/// Integer variants follow the Rust type of the declared field once stored:
/// int32/sint32/sfixed32 hold [`Value::I32`], uint32/fixed32 hold
/// [`Value::U32`], and so on. Any integer variant may be *assigned* to any
/// integer field as long as the number fits.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    /// Number of an enum constant.
    EnumNumber(i32),
    Message(Box<Message>),
    /// Elements of a repeated field.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "int32",
            Self::I64(_) => "int64",
            Self::U32(_) => "uint32",
            Self::U64(_) => "uint64",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::EnumNumber(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_enum_number(&self) -> Option<i32> {
        match *self {
            Self::EnumNumber(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut Message> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Any integer variant, widened. Enum numbers count as integers.
    fn as_integer(&self) -> Option<i128> {
        match *self {
            Self::I32(v) | Self::EnumNumber(v) => Some(v.into()),
            Self::I64(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v.into()),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Bytes => Bytes,
    Vec<u8> => Bytes,
    Vec<Value> => List,
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Message> for Value {
    fn from(value: Message) -> Self {
        Self::Message(Box::new(value))
    }
}

fn mismatch(field: &str, expected: &str, found: &Value) -> FieldError {
    FieldError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.type_name(),
    }
}

fn integer<T: TryFrom<i128>>(ty: ScalarType, field: &str, value: &Value) -> Result<T, FieldError> {
    let number = value
        .as_integer()
        .ok_or_else(|| mismatch(field, ty.name(), value))?;
    T::try_from(number).map_err(|_| FieldError::OutOfRange {
        field: field.to_string(),
        kind: ty.name(),
        value: number.to_string(),
    })
}

/// Convert `value` into the canonical variant of scalar type `ty`.
///
/// Integers are range checked against the target type. Floating point
/// fields also accept integers; no other implicit conversions exist, apart
/// from strings being accepted as bytes.
pub(crate) fn coerce_scalar(ty: ScalarType, field: &str, value: Value) -> Result<Value, FieldError> {
    use ScalarType as S;

    Ok(match ty {
        S::Int32 | S::Sint32 | S::Sfixed32 => Value::I32(integer(ty, field, &value)?),
        S::Int64 | S::Sint64 | S::Sfixed64 => Value::I64(integer(ty, field, &value)?),
        S::Uint32 | S::Fixed32 => Value::U32(integer(ty, field, &value)?),
        S::Uint64 | S::Fixed64 => Value::U64(integer(ty, field, &value)?),
        S::Double => match value {
            Value::F64(v) => Value::F64(v),
            Value::F32(v) => Value::F64(v.into()),
            other => Value::F64(
                other
                    .as_integer()
                    .ok_or_else(|| mismatch(field, ty.name(), &other))? as f64,
            ),
        },
        S::Float => match value {
            Value::F32(v) => Value::F32(v),
            Value::F64(v) => Value::F32(v as f32),
            other => Value::F32(
                other
                    .as_integer()
                    .ok_or_else(|| mismatch(field, ty.name(), &other))? as f32,
            ),
        },
        S::Bool => match value {
            Value::Bool(v) => Value::Bool(v),
            other => return Err(mismatch(field, ty.name(), &other)),
        },
        S::String => match value {
            Value::String(s) => Value::String(s),
            other => return Err(mismatch(field, ty.name(), &other)),
        },
        S::Bytes => match value {
            Value::Bytes(b) => Value::Bytes(b),
            Value::String(s) => Value::Bytes(Bytes::from(s.into_bytes())),
            other => return Err(mismatch(field, ty.name(), &other)),
        },
    })
}

/// Accept an integer naming a declared constant of `enum_type`.
pub(crate) fn coerce_enum(
    enum_type: &EnumEntry,
    field: &str,
    value: Value,
) -> Result<Value, FieldError> {
    let number = value
        .as_integer()
        .ok_or_else(|| mismatch(field, &format!("enum '{}'", enum_type.name), &value))?;
    match i32::try_from(number) {
        Ok(n) if enum_type.contains(n) => Ok(Value::EnumNumber(n)),
        _ => Err(FieldError::UnknownEnumValue {
            field: field.to_string(),
            enum_name: enum_type.name.clone(),
            value: number.to_string(),
        }),
    }
}
