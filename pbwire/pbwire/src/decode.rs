//! Wire decoder.
//!
//! Decoding merges fields into an existing [`Message`] as they appear on the
//! wire. Values go through the same conversion as the public setters, so a
//! value the setters would reject (an int32 field holding 2^33, say) is a
//! decode error too.
//!
//! Input the schema cannot interpret is kept rather than rejected. Unknown
//! tags, known tags carrying an unexpected wire type, and enum numbers the
//! enum does not declare all end up in the message's unknown fields and are
//! written back out by the encoder.

use bytes::{Buf, Bytes};
use pbwire_core::{
    UnknownField, WireError, WireType, decode_key, decode_varint,
    wire::{read_fixed32, read_fixed64, read_length_delimited, read_raw_payload},
    zigzag_decode,
};
use tracing::{debug, trace};

use crate::{
    error::{DecodeError, FieldError},
    message::Message,
    options::DecodeOptions,
    schema::{FieldDescriptor, Kind, MessageDescriptor, ScalarType},
    validate,
    value::Value,
};

pub(crate) fn merge_message(
    message: &mut Message,
    mut buf: Bytes,
    options: DecodeOptions,
) -> Result<(), DecodeError> {
    merge_fields(message, &mut buf, None, options.recursion_limit)?;
    if options.check_required {
        validate::check_required(message).map_err(|invalid| {
            debug!(
                message_type = message.descriptor().full_name(),
                path = %invalid.path,
                "decoded message is missing a required field"
            );
            DecodeError::MissingRequired(invalid)
        })?;
    }
    Ok(())
}

/// Read fields into `message` until the input ends or, inside a group, until
/// the group's end key.
fn merge_fields(
    message: &mut Message,
    buf: &mut Bytes,
    group: Option<u32>,
    budget: u32,
) -> Result<(), DecodeError> {
    loop {
        if !buf.has_remaining() {
            return match group {
                Some(tag) => Err(WireError::UnterminatedGroup { tag }.into()),
                None => Ok(()),
            };
        }
        let (tag, wire_type) = decode_key(buf)?;
        if wire_type == WireType::EndGroup {
            return match group {
                Some(open) if open == tag => Ok(()),
                expected => Err(WireError::UnexpectedEndGroup {
                    expected,
                    found: tag,
                }
                .into()),
            };
        }
        match message.descriptor().field_by_tag(tag) {
            Some(field) => merge_field(message, &field, wire_type, buf, budget)?,
            None => {
                let data = read_raw_payload(tag, wire_type, buf, budget)?;
                trace!(
                    message_type = message.descriptor().full_name(),
                    tag,
                    %wire_type,
                    len = data.len(),
                    "preserving unknown field"
                );
                message
                    .unknown_fields_mut()
                    .push(UnknownField::new(tag, wire_type, data));
            }
        }
    }
}

fn merge_field(
    message: &mut Message,
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut Bytes,
    budget: u32,
) -> Result<(), DecodeError> {
    if wire_type == WireType::LengthDelimited && field.is_packable() {
        let mut payload = read_length_delimited(buf)?;
        trace!(
            field = field.name(),
            len = payload.len(),
            "reading packed run"
        );
        while payload.has_remaining() {
            merge_scalar(message, field, &mut payload)?;
        }
        return Ok(());
    }

    let expected = field.wire_type();
    if wire_type != expected {
        let data = read_raw_payload(field.tag(), wire_type, buf, budget)?;
        debug!(
            field = field.name(),
            %expected,
            found = %wire_type,
            "wire type mismatch, keeping field as unknown"
        );
        message
            .unknown_fields_mut()
            .push(UnknownField::new(field.tag(), wire_type, data));
        return Ok(());
    }

    match field.kind() {
        Kind::Message(message_type) => {
            let mut payload = read_length_delimited(buf)?;
            merge_nested(message, field, message_type, &mut payload, None, budget)
        }
        Kind::Group(message_type) => {
            merge_nested(message, field, message_type, buf, Some(field.tag()), budget)
        }
        Kind::Scalar(_) | Kind::Enum(_) => merge_scalar(message, field, buf),
    }
}

/// Decode a sub-message or group body into `field`: merged into the current
/// value of a singular field, appended as a new element of a repeated one.
fn merge_nested(
    message: &mut Message,
    field: &FieldDescriptor,
    message_type: MessageDescriptor,
    buf: &mut Bytes,
    group: Option<u32>,
    budget: u32,
) -> Result<(), DecodeError> {
    let budget = budget
        .checked_sub(1)
        .ok_or(WireError::RecursionLimitExceeded)?;
    let index = field.index();

    if field.is_repeated() {
        let mut child = Message::new(message_type);
        merge_fields(&mut child, buf, group, budget)?;
        message
            .repeated_at_mut(index)
            .map_err(|source| invalid_value(field, source))?
            .push_unchecked(Value::Message(Box::new(child)));
    } else {
        let child = message
            .message_at_mut(index)
            .map_err(|source| invalid_value(field, source))?;
        merge_fields(child, buf, group, budget)?;
        message.mark_assigned(index);
    }
    Ok(())
}

/// Decode one scalar or enum element and store it.
fn merge_scalar(
    message: &mut Message,
    field: &FieldDescriptor,
    buf: &mut Bytes,
) -> Result<(), DecodeError> {
    let value = match field.kind() {
        Kind::Enum(enum_type) => {
            let raw = decode_varint(buf)?;
            match i32::try_from(raw as i64) {
                Ok(number) if enum_type.contains(number) => Value::EnumNumber(number),
                _ => {
                    debug!(
                        field = field.name(),
                        value = raw as i64,
                        enum_type = enum_type.full_name(),
                        "unknown enum value, keeping field as unknown"
                    );
                    message
                        .unknown_fields_mut()
                        .push(UnknownField::varint(field.tag(), raw));
                    return Ok(());
                }
            }
        }
        Kind::Scalar(ty) => read_scalar(ty, field, buf)?,
        Kind::Message(_) | Kind::Group(_) => {
            unreachable!("message field '{}' decoded as a scalar", field.name())
        }
    };

    let index = field.index();
    if field.is_repeated() {
        message
            .repeated_at_mut(index)
            .and_then(|r| r.push(value).map(|_| ()))
            .map_err(|source| invalid_value(field, source))
    } else {
        message
            .set_index(index, value)
            .map_err(|source| invalid_value(field, source))
    }
}

/// Read one value in its widest form; range checks happen on assignment.
fn read_scalar(ty: ScalarType, field: &FieldDescriptor, buf: &mut Bytes) -> Result<Value, DecodeError> {
    use ScalarType as S;

    Ok(match ty {
        S::Int32 | S::Int64 => Value::I64(decode_varint(buf)? as i64),
        S::Uint32 | S::Uint64 => Value::U64(decode_varint(buf)?),
        S::Sint32 | S::Sint64 => Value::I64(zigzag_decode(decode_varint(buf)?)),
        S::Bool => Value::Bool(decode_varint(buf)? != 0),
        S::Fixed32 => Value::U32(read_fixed32(buf)?),
        S::Sfixed32 => Value::I32(read_fixed32(buf)? as i32),
        S::Float => Value::F32(f32::from_bits(read_fixed32(buf)?)),
        S::Fixed64 => Value::U64(read_fixed64(buf)?),
        S::Sfixed64 => Value::I64(read_fixed64(buf)? as i64),
        S::Double => Value::F64(f64::from_bits(read_fixed64(buf)?)),
        S::String => {
            let data = read_length_delimited(buf)?;
            let s = String::from_utf8(data.to_vec()).map_err(|_| DecodeError::InvalidUtf8 {
                field: field.name().to_string(),
            })?;
            Value::String(s)
        }
        S::Bytes => Value::Bytes(read_length_delimited(buf)?),
    })
}

fn invalid_value(field: &FieldDescriptor, source: FieldError) -> DecodeError {
    DecodeError::InvalidValue {
        field: field.name().to_string(),
        source,
    }
}
