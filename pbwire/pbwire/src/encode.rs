//! Wire encoder.
//!
//! Fields are written in ascending tag order, followed by the message's
//! unknown fields in the order they were read. Unset fields produce no
//! output, so an empty message encodes to zero bytes. Nested message lengths
//! are computed up front with [`message_len`] instead of encoding into a
//! scratch buffer.

use bytes::BufMut;
use pbwire_core::{
    WireType, encode_key, encode_varint, encoded_len_varint, key_len, zigzag_encode,
};

use crate::{
    message::{FieldContents, Message},
    schema::{FieldDescriptor, ScalarType},
    value::Value,
};

/// Wire representation of one scalar or enum element, without its key.
enum Scalar<'a> {
    Varint(u64),
    Fixed32([u8; 4]),
    Fixed64([u8; 8]),
    Delimited(&'a [u8]),
}

impl Scalar<'_> {
    fn len(&self) -> usize {
        match self {
            Self::Varint(v) => encoded_len_varint(*v),
            Self::Fixed32(_) => 4,
            Self::Fixed64(_) => 8,
            Self::Delimited(data) => encoded_len_varint(data.len() as u64) + data.len(),
        }
    }

    fn write(&self, buf: &mut impl BufMut) {
        match self {
            Self::Varint(v) => encode_varint(*v, buf),
            Self::Fixed32(bytes) => buf.put_slice(bytes),
            Self::Fixed64(bytes) => buf.put_slice(bytes),
            Self::Delimited(data) => {
                encode_varint(data.len() as u64, buf);
                buf.put_slice(data);
            }
        }
    }
}

/// Map a stored value to its wire form.
///
/// Values reach the encoder only through the field setters, which store the
/// canonical variant for each field type, so any other pairing is a bug.
fn scalar<'a>(field: &FieldDescriptor, value: &'a Value) -> Scalar<'a> {
    use ScalarType as S;

    let Some(ty) = field.scalar_type() else {
        return match value {
            // Negative enum numbers are sign-extended like int32.
            Value::EnumNumber(n) => Scalar::Varint(i64::from(*n) as u64),
            other => unreachable!("enum field '{}' holds {other:?}", field.name()),
        };
    };
    match (ty, value) {
        (S::Int32, Value::I32(v)) => Scalar::Varint(i64::from(*v) as u64),
        (S::Int64, Value::I64(v)) => Scalar::Varint(*v as u64),
        (S::Uint32, Value::U32(v)) => Scalar::Varint(u64::from(*v)),
        (S::Uint64, Value::U64(v)) => Scalar::Varint(*v),
        (S::Sint32, Value::I32(v)) => Scalar::Varint(zigzag_encode(i64::from(*v))),
        (S::Sint64, Value::I64(v)) => Scalar::Varint(zigzag_encode(*v)),
        (S::Bool, Value::Bool(v)) => Scalar::Varint(u64::from(*v)),
        (S::Fixed32, Value::U32(v)) => Scalar::Fixed32(v.to_le_bytes()),
        (S::Sfixed32, Value::I32(v)) => Scalar::Fixed32(v.to_le_bytes()),
        (S::Float, Value::F32(v)) => Scalar::Fixed32(v.to_le_bytes()),
        (S::Fixed64, Value::U64(v)) => Scalar::Fixed64(v.to_le_bytes()),
        (S::Sfixed64, Value::I64(v)) => Scalar::Fixed64(v.to_le_bytes()),
        (S::Double, Value::F64(v)) => Scalar::Fixed64(v.to_le_bytes()),
        (S::String, Value::String(s)) => Scalar::Delimited(s.as_bytes()),
        (S::Bytes, Value::Bytes(b)) => Scalar::Delimited(b),
        (ty, other) => unreachable!("{ty} field '{}' holds {other:?}", field.name()),
    }
}

/// Encoded size of `message`, including unknown fields.
pub(crate) fn message_len(message: &Message) -> usize {
    let descriptor = message.descriptor();
    let fields: usize = descriptor
        .fields_in_tag_order()
        .map(|field| field_len(&field, message.contents(field.index())))
        .sum();
    fields + message.unknown_fields().encoded_len()
}

fn field_len(field: &FieldDescriptor, contents: FieldContents<'_>) -> usize {
    match contents {
        FieldContents::Unset => 0,
        FieldContents::Single(value) => element_len(field, value),
        FieldContents::Repeated([]) => 0,
        FieldContents::Repeated(values) if field.is_packed() => {
            let payload = packed_payload_len(field, values);
            key_len(field.tag()) + encoded_len_varint(payload as u64) + payload
        }
        FieldContents::Repeated(values) => values.iter().map(|v| element_len(field, v)).sum(),
    }
}

/// Size of one key+value unit.
fn element_len(field: &FieldDescriptor, value: &Value) -> usize {
    let key = key_len(field.tag());
    match (field.wire_type(), value) {
        (WireType::LengthDelimited, Value::Message(m)) => {
            let body = message_len(m);
            key + encoded_len_varint(body as u64) + body
        }
        (WireType::StartGroup, Value::Message(m)) => key + message_len(m) + key,
        _ => key + scalar(field, value).len(),
    }
}

fn packed_payload_len(field: &FieldDescriptor, values: &[Value]) -> usize {
    values.iter().map(|v| scalar(field, v).len()).sum()
}

/// Write every field of `message` without checking required fields.
pub(crate) fn write_message(message: &Message, buf: &mut impl BufMut) {
    for field in message.descriptor().fields_in_tag_order() {
        match message.contents(field.index()) {
            FieldContents::Unset => {}
            FieldContents::Single(value) => write_element(&field, value, buf),
            FieldContents::Repeated([]) => {}
            FieldContents::Repeated(values) if field.is_packed() => {
                encode_key(field.tag(), WireType::LengthDelimited, buf);
                encode_varint(packed_payload_len(&field, values) as u64, buf);
                for value in values {
                    scalar(&field, value).write(buf);
                }
            }
            FieldContents::Repeated(values) => {
                for value in values {
                    write_element(&field, value, buf);
                }
            }
        }
    }
    message.unknown_fields().encode(buf);
}

fn write_element(field: &FieldDescriptor, value: &Value, buf: &mut impl BufMut) {
    let tag = field.tag();
    match (field.wire_type(), value) {
        (WireType::LengthDelimited, Value::Message(m)) => {
            encode_key(tag, WireType::LengthDelimited, buf);
            encode_varint(message_len(m) as u64, buf);
            write_message(m, buf);
        }
        (WireType::StartGroup, Value::Message(m)) => {
            encode_key(tag, WireType::StartGroup, buf);
            write_message(m, buf);
            encode_key(tag, WireType::EndGroup, buf);
        }
        (wire_type, value) => {
            encode_key(tag, wire_type, buf);
            scalar(field, value).write(buf);
        }
    }
}
