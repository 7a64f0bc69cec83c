//! Schema-driven message instances.

use std::{
    borrow::Cow,
    fmt,
    io::{Read, Write},
    ops::Deref,
};

use bytes::{Buf, BufMut, Bytes};
use pbwire_core::UnknownFieldSet;
use tracing::debug;

use crate::{
    decode::merge_message,
    encode,
    error::{DecodeError, EncodeError, Error, FieldError, InvalidField},
    options::DecodeOptions,
    repeated::{RepeatedField, RepeatedFieldMut},
    schema::{FieldDescriptor, MessageDescriptor},
    validate,
    value::Value,
};

#[derive(Debug, Clone)]
enum Slot {
    /// A singular value. `assigned` is false for a sub-message that was only
    /// materialized by [`Message::message_mut`].
    Single { value: Value, assigned: bool },
    Repeated(RepeatedField),
}

/// What a field currently holds, as seen by the encoder and validator.
pub(crate) enum FieldContents<'a> {
    Unset,
    Single(&'a Value),
    Repeated(&'a [Value]),
}

/// An instance of a message type.
///
/// Fields are addressed by name (or tag) and checked against the message's
/// [`MessageDescriptor`] on every access. A field is *present* once it has
/// been assigned or mutated. Reading never changes presence; getters of
/// unset fields return the field's default.
///
/// Sub-messages are created on demand. [`message_mut`](Self::message_mut)
/// hands out an empty instance without marking the field present; the field
/// becomes present as soon as anything inside it is mutated, at any depth,
/// and stays present even if that change is later undone.
#[derive(Clone)]
pub struct Message {
    descriptor: MessageDescriptor,
    slots: Vec<Option<Slot>>,
    unknown: UnknownFieldSet,
    /// Set by the first successful field mutation and never reset.
    touched: bool,
}

impl Message {
    pub fn new(descriptor: MessageDescriptor) -> Self {
        let slots = vec![None; descriptor.field_count()];
        Self {
            descriptor,
            slots,
            unknown: UnknownFieldSet::new(),
            touched: false,
        }
    }

    /// Create a message and assign each `(name, value)` pair in turn.
    pub fn from_fields<I, N, V>(descriptor: MessageDescriptor, fields: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Value>,
    {
        let mut message = Self::new(descriptor);
        for (name, value) in fields {
            message.set(name.as_ref(), value)?;
        }
        Ok(message)
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    // ── lookup ───────────────────────────────────────────────────────────────

    fn index_of(&self, name: &str) -> Result<usize, FieldError> {
        self.descriptor
            .entry()
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| FieldError::NoSuchField {
                message_type: self.descriptor.full_name().to_string(),
                name: name.to_string(),
            })
    }

    fn index_of_tag(&self, tag: u32) -> Result<usize, FieldError> {
        self.descriptor
            .entry()
            .by_tag
            .get(&tag)
            .copied()
            .ok_or_else(|| FieldError::NoSuchTag {
                message_type: self.descriptor.full_name().to_string(),
                tag,
            })
    }

    fn index_of_field(&self, field: &FieldDescriptor) -> Result<usize, FieldError> {
        if field.containing_message() != &self.descriptor {
            return Err(FieldError::NoSuchField {
                message_type: self.descriptor.full_name().to_string(),
                name: field.name().to_string(),
            });
        }
        Ok(field.index())
    }

    // ── getters ──────────────────────────────────────────────────────────────

    /// The value of field `name`, or its default when unset. Repeated fields
    /// yield a [`Value::List`].
    pub fn get(&self, name: &str) -> Result<Cow<'_, Value>, FieldError> {
        let index = self.index_of(name)?;
        Ok(self.value_at(index))
    }

    pub fn get_field(&self, field: &FieldDescriptor) -> Result<Cow<'_, Value>, FieldError> {
        let index = self.index_of_field(field)?;
        Ok(self.value_at(index))
    }

    pub fn value_for_tag(&self, tag: u32) -> Result<Cow<'_, Value>, FieldError> {
        let index = self.index_of_tag(tag)?;
        Ok(self.value_at(index))
    }

    /// Elements of repeated field `name`.
    pub fn repeated(&self, name: &str) -> Result<&[Value], FieldError> {
        let index = self.index_of(name)?;
        let field = self.descriptor.field(index);
        if !field.is_repeated() {
            return Err(cardinality_mismatch(&field, "repeated"));
        }
        Ok(match &self.slots[index] {
            Some(Slot::Repeated(r)) => r.values(),
            _ => &[],
        })
    }

    fn value_at(&self, index: usize) -> Cow<'_, Value> {
        match &self.slots[index] {
            Some(Slot::Single { value, .. }) => Cow::Borrowed(value),
            Some(Slot::Repeated(r)) => Cow::Owned(Value::List(r.values().to_vec())),
            None => Cow::Owned(self.descriptor.field(index).default_value()),
        }
    }

    // ── presence ─────────────────────────────────────────────────────────────

    /// Whether field `name` has been assigned or mutated. A sub-message field
    /// is also present when any of its own fields is.
    pub fn has(&self, name: &str) -> Result<bool, FieldError> {
        let index = self.index_of(name)?;
        Ok(self.has_index(index))
    }

    pub fn has_tag(&self, tag: u32) -> Result<bool, FieldError> {
        let index = self.index_of_tag(tag)?;
        Ok(self.has_index(index))
    }

    pub(crate) fn has_index(&self, index: usize) -> bool {
        match &self.slots[index] {
            None => false,
            Some(Slot::Repeated(r)) => r.is_modified(),
            Some(Slot::Single { assigned: true, .. }) => true,
            Some(Slot::Single {
                value: Value::Message(m),
                assigned: false,
            }) => m.is_touched(),
            Some(Slot::Single { .. }) => false,
        }
    }

    /// Whether any field of this message is present, recursively.
    pub fn has_any_field(&self) -> bool {
        (0..self.slots.len()).any(|index| self.has_index(index))
    }

    /// Whether any field of this message has ever been mutated, recursively.
    fn is_touched(&self) -> bool {
        self.touched || self.has_any_field()
    }

    pub(crate) fn contents(&self, index: usize) -> FieldContents<'_> {
        match &self.slots[index] {
            Some(Slot::Repeated(r)) => FieldContents::Repeated(r.values()),
            Some(Slot::Single { value, .. }) if self.has_index(index) => {
                FieldContents::Single(value)
            }
            _ => FieldContents::Unset,
        }
    }

    // ── setters ──────────────────────────────────────────────────────────────

    /// Assign field `name`. Repeated fields take a [`Value::List`], which
    /// replaces the current elements only if every element is accepted.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let index = self.index_of(name)?;
        self.set_index(index, value.into())
    }

    pub fn set_field(
        &mut self,
        field: &FieldDescriptor,
        value: impl Into<Value>,
    ) -> Result<(), FieldError> {
        let index = self.index_of_field(field)?;
        self.set_index(index, value.into())
    }

    pub fn set_tag(&mut self, tag: u32, value: impl Into<Value>) -> Result<(), FieldError> {
        let index = self.index_of_tag(tag)?;
        self.set_index(index, value.into())
    }

    /// Replace the elements of repeated field `name` with `values`.
    pub fn set_repeated<I, V>(&mut self, name: &str, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let index = self.index_of(name)?;
        self.repeated_at_mut(index)?.replace(values)?;
        self.touched = true;
        Ok(())
    }

    pub(crate) fn set_index(&mut self, index: usize, value: Value) -> Result<(), FieldError> {
        let field = self.descriptor.field(index);
        if field.is_repeated() {
            match value {
                Value::List(values) => self.repeated_at_mut(index)?.replace(values)?,
                other => {
                    return Err(FieldError::TypeMismatch {
                        field: field.name().to_string(),
                        expected: format!("list of {}", field.kind().type_name()),
                        found: other.type_name(),
                    });
                }
            }
        } else {
            let value = field.coerce(value)?;
            self.slots[index] = Some(Slot::Single {
                value,
                assigned: true,
            });
        }
        self.touched = true;
        Ok(())
    }

    /// Reset field `name` to unset.
    pub fn clear_field(&mut self, name: &str) -> Result<(), FieldError> {
        let index = self.index_of(name)?;
        self.slots[index] = None;
        self.touched = true;
        Ok(())
    }

    /// Reset every field and drop all unknown fields.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.unknown.clear();
        self.touched = true;
    }

    // ── nested access ────────────────────────────────────────────────────────

    /// Mutable access to singular message or group field `name`.
    ///
    /// An unset field is materialized as an empty message. That alone does
    /// not make the field present; mutating anything inside it does.
    /// Materializing is a mutation of `self`, so it needs exclusive access
    /// and cannot overlap reads of this message without outside
    /// synchronization.
    pub fn message_mut(&mut self, name: &str) -> Result<MessageMut<'_>, FieldError> {
        let index = self.index_of(name)?;
        self.message_at_mut(index).map(MessageMut::new)
    }

    pub fn repeated_mut(&mut self, name: &str) -> Result<RepeatedFieldMut<'_>, FieldError> {
        let index = self.index_of(name)?;
        self.repeated_at_mut(index).map(RepeatedFieldMut::new)
    }

    pub(crate) fn message_at_mut(&mut self, index: usize) -> Result<&mut Message, FieldError> {
        let field = self.descriptor.field(index);
        if field.is_repeated() {
            return Err(cardinality_mismatch(&field, "singular"));
        }
        let Some(message_type) = field.message_type() else {
            return Err(FieldError::TypeMismatch {
                field: field.name().to_string(),
                expected: field.kind().type_name().to_string(),
                found: "message",
            });
        };
        let slot = self.slots[index].get_or_insert_with(|| Slot::Single {
            value: Value::Message(Box::new(Message::new(message_type))),
            assigned: false,
        });
        match slot {
            Slot::Single {
                value: Value::Message(m),
                ..
            } => Ok(m),
            _ => unreachable!("message field '{}' holds a non-message value", field.name()),
        }
    }

    pub(crate) fn repeated_at_mut(&mut self, index: usize) -> Result<&mut RepeatedField, FieldError> {
        let field = self.descriptor.field(index);
        if !field.is_repeated() {
            return Err(cardinality_mismatch(&field, "repeated"));
        }
        let slot = self.slots[index].get_or_insert_with(|| Slot::Repeated(RepeatedField::new(field)));
        match slot {
            Slot::Repeated(r) => Ok(r),
            Slot::Single { .. } => unreachable!("repeated field holds a singular value"),
        }
    }

    /// Mark a materialized sub-message as explicitly set.
    pub(crate) fn mark_assigned(&mut self, index: usize) {
        if let Some(Slot::Single { assigned, .. }) = &mut self.slots[index] {
            *assigned = true;
        }
    }

    // ── unknown fields ───────────────────────────────────────────────────────

    /// Fields read from the wire that this message type does not declare, or
    /// whose values it could not accept, in stream order.
    pub fn unknown_fields(&self) -> &UnknownFieldSet {
        &self.unknown
    }

    pub fn unknown_field_count(&self) -> usize {
        self.unknown.len()
    }

    pub fn clear_unknown_fields(&mut self) {
        self.unknown.clear();
    }

    pub(crate) fn unknown_fields_mut(&mut self) -> &mut UnknownFieldSet {
        &mut self.unknown
    }

    // ── validation ───────────────────────────────────────────────────────────

    /// Whether every required field is set, recursively.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The first required field that is not set, recursively.
    pub fn validate(&self) -> Result<(), InvalidField> {
        validate::check_required(self)
    }

    // ── encoding ─────────────────────────────────────────────────────────────

    /// Write the message in wire format. Fails without writing anything if a
    /// required field is missing.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        self.validate().map_err(|invalid_field| {
            debug!(
                message_type = self.descriptor.full_name(),
                path = %invalid_field.path,
                "refusing to encode message with missing required field"
            );
            EncodeError { invalid_field }
        })?;
        encode::write_message(self, buf);
        Ok(())
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Size of the wire encoding in bytes.
    pub fn encoded_len(&self) -> usize {
        encode::message_len(self)
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<(), Error> {
        let buf = self.encode_to_vec()?;
        writer.write_all(&buf)?;
        Ok(())
    }

    // ── decoding ─────────────────────────────────────────────────────────────

    pub fn decode(descriptor: MessageDescriptor, buf: impl Buf) -> Result<Self, DecodeError> {
        Self::decode_with_options(descriptor, buf, DecodeOptions::default())
    }

    pub fn decode_with_options(
        descriptor: MessageDescriptor,
        buf: impl Buf,
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let mut message = Self::new(descriptor);
        message.merge_with_options(buf, options)?;
        Ok(message)
    }

    /// Decode `buf` into this message. Singular fields read from `buf`
    /// overwrite current values, sub-messages are merged, and repeated
    /// fields are appended to.
    pub fn merge(&mut self, buf: impl Buf) -> Result<(), DecodeError> {
        self.merge_with_options(buf, DecodeOptions::default())
    }

    pub fn merge_with_options(
        &mut self,
        mut buf: impl Buf,
        options: DecodeOptions,
    ) -> Result<(), DecodeError> {
        let bytes: Bytes = buf.copy_to_bytes(buf.remaining());
        merge_message(self, bytes, options)
    }

    /// Read `reader` to its end and decode the bytes.
    pub fn read_from(descriptor: MessageDescriptor, mut reader: impl Read) -> Result<Self, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self::decode(descriptor, Bytes::from(buf))?)
    }

    // ── equality ─────────────────────────────────────────────────────────────

    fn slot_eq(&self, index: usize, a: Option<&Slot>, b: Option<&Slot>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(Slot::Repeated(x)), Some(Slot::Repeated(y))) => x.values() == y.values(),
            (Some(Slot::Repeated(x)), None) | (None, Some(Slot::Repeated(x))) => x.is_empty(),
            (Some(Slot::Single { value: x, .. }), Some(Slot::Single { value: y, .. })) => x == y,
            (Some(Slot::Single { value, .. }), None) | (None, Some(Slot::Single { value, .. })) => {
                match value {
                    Value::Message(m) => m.is_default(),
                    other => self.descriptor.field(index).declared_default() == Some(other),
                }
            }
            _ => false,
        }
    }

    /// Whether every field equals its default, without building defaults for
    /// sub-messages.
    fn is_default(&self) -> bool {
        self.slots
            .iter()
            .enumerate()
            .all(|(index, slot)| self.slot_eq(index, slot.as_ref(), None))
    }
}

/// Mutable access to a sub-message held by a field.
///
/// Reads go through `Deref<Target = Message>`. Writes are limited to the
/// checked field setters, so the sub-message can be changed but never
/// replaced by an instance of another type.
///
/// ```compile_fail
/// # fn swap(mut outer: pbwire::Message, other: pbwire::Message) {
/// *outer.message_mut("foo").unwrap() = other;
/// # }
/// ```
pub struct MessageMut<'a>(&'a mut Message);

impl<'a> MessageMut<'a> {
    pub(crate) fn new(message: &'a mut Message) -> Self {
        Self(message)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.0.set(name, value)
    }

    pub fn set_field(
        &mut self,
        field: &FieldDescriptor,
        value: impl Into<Value>,
    ) -> Result<(), FieldError> {
        self.0.set_field(field, value)
    }

    pub fn set_tag(&mut self, tag: u32, value: impl Into<Value>) -> Result<(), FieldError> {
        self.0.set_tag(tag, value)
    }

    pub fn set_repeated<I, V>(&mut self, name: &str, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.0.set_repeated(name, values)
    }

    pub fn clear_field(&mut self, name: &str) -> Result<(), FieldError> {
        self.0.clear_field(name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn message_mut(&mut self, name: &str) -> Result<MessageMut<'_>, FieldError> {
        self.0.message_mut(name)
    }

    pub fn repeated_mut(&mut self, name: &str) -> Result<RepeatedFieldMut<'_>, FieldError> {
        self.0.repeated_mut(name)
    }

    pub fn clear_unknown_fields(&mut self) {
        self.0.clear_unknown_fields();
    }

    pub fn merge(&mut self, buf: impl Buf) -> Result<(), DecodeError> {
        self.0.merge(buf)
    }

    pub fn merge_with_options(
        &mut self,
        buf: impl Buf,
        options: DecodeOptions,
    ) -> Result<(), DecodeError> {
        self.0.merge_with_options(buf, options)
    }
}

impl Deref for MessageMut<'_> {
    type Target = Message;

    fn deref(&self) -> &Message {
        self.0
    }
}

impl fmt::Debug for MessageMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

fn cardinality_mismatch(field: &FieldDescriptor, requested: &'static str) -> FieldError {
    FieldError::CardinalityMismatch {
        field: field.name().to_string(),
        actual: field.cardinality(),
        requested,
    }
}

/// Messages are equal when they have the same type and every field has the
/// same value as seen through the getters. Presence and unknown fields are
/// not compared.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .enumerate()
                .all(|(index, (a, b))| self.slot_eq(index, a.as_ref(), b.as_ref()))
    }
}
