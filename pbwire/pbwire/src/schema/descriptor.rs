//! Cheap handles onto resolved schema entries.

use std::fmt;

use pbwire_core::WireType;

use super::{
    registry::{EnumEntry, FieldEntry, MessageEntry, SchemaRegistry, TypeRef},
    types::{Cardinality, ScalarType},
};
use crate::{
    error::FieldError,
    message::Message,
    value::{Value, coerce_enum, coerce_scalar},
};

/// A message type within a [`SchemaRegistry`].
#[derive(Clone)]
pub struct MessageDescriptor {
    registry: SchemaRegistry,
    index: usize,
}

impl MessageDescriptor {
    pub(crate) fn new(registry: SchemaRegistry, index: usize) -> Self {
        Self { registry, index }
    }

    pub(crate) fn entry(&self) -> &MessageEntry {
        &self.registry.inner.messages[self.index]
    }

    pub fn full_name(&self) -> &str {
        &self.entry().name
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDescriptor> + '_ {
        (0..self.field_count()).map(|index| self.field(index))
    }

    /// Fields in ascending tag order, the order the encoder writes them.
    pub fn fields_in_tag_order(&self) -> impl ExactSizeIterator<Item = FieldDescriptor> + '_ {
        self.entry()
            .tag_order
            .iter()
            .map(|&index| self.field(index))
    }

    pub fn field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        self.entry()
            .by_name
            .get(name)
            .map(|&index| self.field(index))
    }

    pub fn field_by_tag(&self, tag: u32) -> Option<FieldDescriptor> {
        self.entry()
            .by_tag
            .get(&tag)
            .map(|&index| self.field(index))
    }

    pub(crate) fn field_count(&self) -> usize {
        self.entry().fields.len()
    }

    pub(crate) fn field(&self, index: usize) -> FieldDescriptor {
        FieldDescriptor {
            message: self.clone(),
            index,
        }
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.registry.same_registry(&other.registry)
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor")
            .field(&self.full_name())
            .finish()
    }
}

/// One field of a message type.
#[derive(Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    message: MessageDescriptor,
    index: usize,
}

impl FieldDescriptor {
    fn entry(&self) -> &FieldEntry {
        &self.message.entry().fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.entry().name
    }

    pub fn tag(&self) -> u32 {
        self.entry().tag
    }

    pub fn cardinality(&self) -> Cardinality {
        self.entry().cardinality
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality() == Cardinality::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.cardinality() == Cardinality::Required
    }

    pub fn is_packed(&self) -> bool {
        self.entry().packed
    }

    /// Whether occurrences of this field may arrive packed, regardless of
    /// how the field is declared.
    pub fn is_packable(&self) -> bool {
        self.is_repeated() && self.entry().ty.is_packable()
    }

    pub fn kind(&self) -> Kind {
        let registry = &self.message.registry;
        match self.entry().ty {
            TypeRef::Scalar(s) => Kind::Scalar(s),
            TypeRef::Message(i) => Kind::Message(MessageDescriptor::new(registry.clone(), i)),
            TypeRef::Group(i) => Kind::Group(MessageDescriptor::new(registry.clone(), i)),
            TypeRef::Enum(i) => Kind::Enum(EnumDescriptor::new(registry.clone(), i)),
        }
    }

    /// Wire type of a single, unpacked occurrence.
    pub fn wire_type(&self) -> WireType {
        match self.entry().ty {
            TypeRef::Scalar(s) => s.wire_type(),
            TypeRef::Message(_) => WireType::LengthDelimited,
            TypeRef::Group(_) => WireType::StartGroup,
            TypeRef::Enum(_) => WireType::Varint,
        }
    }

    pub fn containing_message(&self) -> &MessageDescriptor {
        &self.message
    }

    /// Nested type of a message or group field.
    pub fn message_type(&self) -> Option<MessageDescriptor> {
        match self.entry().ty {
            TypeRef::Message(i) | TypeRef::Group(i) => {
                Some(MessageDescriptor::new(self.message.registry.clone(), i))
            }
            _ => None,
        }
    }

    pub fn enum_type(&self) -> Option<EnumDescriptor> {
        match self.entry().ty {
            TypeRef::Enum(i) => Some(EnumDescriptor::new(self.message.registry.clone(), i)),
            _ => None,
        }
    }

    /// The value a getter returns while the field is unset.
    pub fn default_value(&self) -> Value {
        if self.is_repeated() {
            return Value::List(Vec::new());
        }
        match (self.declared_default(), self.message_type()) {
            (Some(value), _) => value.clone(),
            (None, Some(message_type)) => Value::Message(Box::new(Message::new(message_type))),
            (None, None) => unreachable!("singular scalar field without a resolved default"),
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn scalar_type(&self) -> Option<ScalarType> {
        match self.entry().ty {
            TypeRef::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Resolved default of a singular scalar or enum field.
    pub(crate) fn declared_default(&self) -> Option<&Value> {
        self.entry().default.as_ref()
    }

    /// Check and convert one element for this field.
    pub(crate) fn coerce(&self, value: Value) -> Result<Value, FieldError> {
        let inner = &self.message.registry.inner;
        match self.entry().ty {
            TypeRef::Scalar(s) => coerce_scalar(s, self.name(), value),
            TypeRef::Enum(i) => coerce_enum(&inner.enums[i], self.name(), value),
            TypeRef::Message(i) | TypeRef::Group(i) => match value {
                Value::Message(m) if m.descriptor().index == i
                    && m.descriptor().registry.same_registry(&self.message.registry) =>
                {
                    Ok(Value::Message(m))
                }
                other => Err(FieldError::TypeMismatch {
                    field: self.name().to_string(),
                    expected: format!("message '{}'", inner.messages[i].name),
                    found: other.type_name(),
                }),
            },
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("message", &self.message.full_name())
            .field("name", &self.name())
            .field("tag", &self.tag())
            .field("cardinality", &self.cardinality())
            .finish()
    }
}

/// Resolved type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Scalar(ScalarType),
    Message(MessageDescriptor),
    Group(MessageDescriptor),
    Enum(EnumDescriptor),
}

impl Kind {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Scalar(s) => s.wire_type(),
            Self::Message(_) => WireType::LengthDelimited,
            Self::Group(_) => WireType::StartGroup,
            Self::Enum(_) => WireType::Varint,
        }
    }

    pub fn is_packable(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_packable(),
            Self::Enum(_) => true,
            Self::Message(_) | Self::Group(_) => false,
        }
    }

    /// Scalar type name, or the full name of the nested type.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.name(),
            Self::Message(m) | Self::Group(m) => m.full_name(),
            Self::Enum(e) => e.full_name(),
        }
    }
}

/// An enum type within a [`SchemaRegistry`].
#[derive(Clone)]
pub struct EnumDescriptor {
    registry: SchemaRegistry,
    index: usize,
}

impl EnumDescriptor {
    pub(crate) fn new(registry: SchemaRegistry, index: usize) -> Self {
        Self { registry, index }
    }

    pub(crate) fn entry(&self) -> &EnumEntry {
        &self.registry.inner.enums[self.index]
    }

    pub fn full_name(&self) -> &str {
        &self.entry().name
    }

    /// `(name, number)` pairs in declaration order.
    pub fn values(&self) -> &[(String, i32)] {
        &self.entry().values
    }

    pub fn value_by_name(&self, name: &str) -> Option<i32> {
        self.entry().number_of(name)
    }

    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.entry().name_of(number)
    }

    pub fn contains(&self, number: i32) -> bool {
        self.entry().contains(number)
    }

    /// Number of an unset field of this type.
    pub fn default_number(&self) -> i32 {
        self.entry().default_number()
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.registry.same_registry(&other.registry)
    }
}

impl Eq for EnumDescriptor {}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnumDescriptor")
            .field(&self.full_name())
            .finish()
    }
}
