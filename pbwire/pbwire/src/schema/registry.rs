//! Name resolution: turns [`MessageDef`]/[`EnumDef`] input into a shared
//! [`SchemaRegistry`].
//!
//! Every named type reference is replaced by an index into the registry's
//! message or enum table. Self references and mutual references between
//! message types are therefore plain indices, and a schema may describe
//! recursive types without the registry itself being cyclic.

use std::{collections::HashMap, fmt, sync::Arc};

use pbwire_core::wire::{RESERVED_TAGS, is_valid_tag};

use super::{
    descriptor::{EnumDescriptor, MessageDescriptor},
    types::{Cardinality, EnumDef, FieldDef, FieldType, MessageDef, ScalarType},
};
use crate::{
    error::SchemaError,
    value::{Value, coerce_enum, coerce_scalar},
};

/// Resolved field type; named types are indices into [`RegistryInner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeRef {
    Scalar(ScalarType),
    Message(usize),
    Group(usize),
    Enum(usize),
}

impl TypeRef {
    pub(crate) fn is_packable(self) -> bool {
        match self {
            Self::Scalar(s) => s.is_packable(),
            Self::Enum(_) => true,
            Self::Message(_) | Self::Group(_) => false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FieldEntry {
    pub(crate) name: String,
    pub(crate) tag: u32,
    pub(crate) cardinality: Cardinality,
    pub(crate) ty: TypeRef,
    /// Resolved default of singular scalar and enum fields.
    pub(crate) default: Option<Value>,
    pub(crate) packed: bool,
}

#[derive(Debug)]
pub(crate) struct MessageEntry {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldEntry>,
    /// Field indices sorted by tag.
    pub(crate) tag_order: Vec<usize>,
    pub(crate) by_name: HashMap<String, usize>,
    pub(crate) by_tag: HashMap<u32, usize>,
}

#[derive(Debug)]
pub(crate) struct EnumEntry {
    pub(crate) name: String,
    pub(crate) values: Vec<(String, i32)>,
}

impl EnumEntry {
    pub(crate) fn contains(&self, number: i32) -> bool {
        self.values.iter().any(|(_, v)| *v == number)
    }

    pub(crate) fn number_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub(crate) fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| *v == number)
            .map(|(n, _)| n.as_str())
    }

    /// The first declared constant, or 0 for an empty enum.
    pub(crate) fn default_number(&self) -> i32 {
        self.values.first().map(|(_, v)| *v).unwrap_or(0)
    }
}

#[derive(Debug)]
pub(crate) struct RegistryInner {
    pub(crate) messages: Vec<MessageEntry>,
    pub(crate) enums: Vec<EnumEntry>,
    message_index: HashMap<String, usize>,
    enum_index: HashMap<String, usize>,
}

/// Resolved message and enum types, shared by every descriptor and message
/// created from it. Cloning is cheap.
#[derive(Clone)]
pub struct SchemaRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Look up a message type by full name.
    pub fn message(&self, name: &str) -> Option<MessageDescriptor> {
        self.inner
            .message_index
            .get(name)
            .map(|&index| MessageDescriptor::new(self.clone(), index))
    }

    /// Look up an enum type by full name.
    pub fn enumeration(&self, name: &str) -> Option<EnumDescriptor> {
        self.inner
            .enum_index
            .get(name)
            .map(|&index| EnumDescriptor::new(self.clone(), index))
    }

    /// Message types in registration order.
    pub fn messages(&self) -> impl ExactSizeIterator<Item = MessageDescriptor> + '_ {
        (0..self.inner.messages.len()).map(|index| MessageDescriptor::new(self.clone(), index))
    }

    /// Enum types in registration order.
    pub fn enumerations(&self) -> impl ExactSizeIterator<Item = EnumDescriptor> + '_ {
        (0..self.inner.enums.len()).map(|index| EnumDescriptor::new(self.clone(), index))
    }

    pub(crate) fn same_registry(&self, other: &SchemaRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field(
                "messages",
                &self.inner.messages.iter().map(|m| &m.name).collect::<Vec<_>>(),
            )
            .field(
                "enums",
                &self.inner.enums.iter().map(|e| &e.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Collects definitions and resolves them into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    messages: Vec<MessageDef>,
    enums: Vec<EnumDef>,
}

impl SchemaRegistryBuilder {
    pub fn message(mut self, def: MessageDef) -> Self {
        self.messages.push(def);
        self
    }

    pub fn enumeration(mut self, def: EnumDef) -> Self {
        self.enums.push(def);
        self
    }

    /// Resolve all type references and validate every definition.
    ///
    /// Definitions may refer to each other in any order, including a message
    /// referring to itself.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let mut message_index = HashMap::with_capacity(self.messages.len());
        for (index, def) in self.messages.iter().enumerate() {
            if message_index.insert(def.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateType {
                    name: def.name.clone(),
                });
            }
        }
        let mut enum_index = HashMap::with_capacity(self.enums.len());
        for (index, def) in self.enums.iter().enumerate() {
            if message_index.contains_key(&def.name)
                || enum_index.insert(def.name.clone(), index).is_some()
            {
                return Err(SchemaError::DuplicateType {
                    name: def.name.clone(),
                });
            }
        }

        let enums = self
            .enums
            .into_iter()
            .map(resolve_enum)
            .collect::<Result<Vec<_>, _>>()?;
        let messages = self
            .messages
            .iter()
            .map(|def| resolve_message(def, &message_index, &enum_index, &enums))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SchemaRegistry {
            inner: Arc::new(RegistryInner {
                messages,
                enums,
                message_index,
                enum_index,
            }),
        })
    }
}

fn resolve_enum(def: EnumDef) -> Result<EnumEntry, SchemaError> {
    for (i, (name, _)) in def.values.iter().enumerate() {
        if def.values[..i].iter().any(|(other, _)| other == name) {
            return Err(SchemaError::DuplicateEnumValue {
                enum_name: def.name.clone(),
                value_name: name.clone(),
            });
        }
    }
    Ok(EnumEntry {
        name: def.name,
        values: def.values,
    })
}

fn resolve_message(
    def: &MessageDef,
    message_index: &HashMap<String, usize>,
    enum_index: &HashMap<String, usize>,
    enums: &[EnumEntry],
) -> Result<MessageEntry, SchemaError> {
    let mut fields = Vec::with_capacity(def.fields.len());
    let mut by_name = HashMap::with_capacity(def.fields.len());
    let mut by_tag = HashMap::with_capacity(def.fields.len());

    for (index, field) in def.fields.iter().enumerate() {
        if !is_valid_tag(field.tag) {
            return Err(SchemaError::InvalidTag {
                message: def.name.clone(),
                field: field.name.clone(),
                tag: field.tag,
            });
        }
        if RESERVED_TAGS.contains(&field.tag) {
            return Err(SchemaError::ReservedTag {
                message: def.name.clone(),
                field: field.name.clone(),
                tag: field.tag,
            });
        }
        if by_tag.insert(field.tag, index).is_some() {
            return Err(SchemaError::DuplicateTag {
                message: def.name.clone(),
                tag: field.tag,
            });
        }
        if by_name.insert(field.name.clone(), index).is_some() {
            return Err(SchemaError::DuplicateFieldName {
                message: def.name.clone(),
                field: field.name.clone(),
            });
        }

        let ty = resolve_type(def, field, message_index, enum_index)?;
        if field.packed && !(field.cardinality == Cardinality::Repeated && ty.is_packable()) {
            return Err(SchemaError::InvalidPacked {
                message: def.name.clone(),
                field: field.name.clone(),
            });
        }
        let default = resolve_default(def, field, ty, enums)?;

        fields.push(FieldEntry {
            name: field.name.clone(),
            tag: field.tag,
            cardinality: field.cardinality,
            ty,
            default,
            packed: field.packed,
        });
    }

    let mut tag_order: Vec<usize> = (0..fields.len()).collect();
    tag_order.sort_by_key(|&i| fields[i].tag);

    Ok(MessageEntry {
        name: def.name.clone(),
        fields,
        tag_order,
        by_name,
        by_tag,
    })
}

fn resolve_type(
    def: &MessageDef,
    field: &FieldDef,
    message_index: &HashMap<String, usize>,
    enum_index: &HashMap<String, usize>,
) -> Result<TypeRef, SchemaError> {
    let (resolved, type_name) = match &field.ty {
        FieldType::Scalar(s) => return Ok(TypeRef::Scalar(*s)),
        FieldType::Message(name) => (message_index.get(name).map(|&i| TypeRef::Message(i)), name),
        FieldType::Group(name) => (message_index.get(name).map(|&i| TypeRef::Group(i)), name),
        FieldType::Enum(name) => (enum_index.get(name).map(|&i| TypeRef::Enum(i)), name),
    };
    resolved.ok_or_else(|| SchemaError::UnresolvedType {
        message: def.name.clone(),
        field: field.name.clone(),
        type_name: type_name.clone(),
    })
}

fn resolve_default(
    def: &MessageDef,
    field: &FieldDef,
    ty: TypeRef,
    enums: &[EnumEntry],
) -> Result<Option<Value>, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidDefault {
        message: def.name.clone(),
        field: field.name.clone(),
        reason,
    };

    if field.cardinality == Cardinality::Repeated {
        return match field.default {
            Some(_) => Err(invalid("repeated fields cannot declare a default".into())),
            None => Ok(None),
        };
    }

    match (ty, &field.default) {
        (TypeRef::Scalar(s), None) => Ok(Some(s.default_value())),
        (TypeRef::Scalar(s), Some(value)) => coerce_scalar(s, &field.name, value.clone())
            .map(Some)
            .map_err(|e| invalid(e.to_string())),
        (TypeRef::Enum(i), None) => Ok(Some(Value::EnumNumber(enums[i].default_number()))),
        (TypeRef::Enum(i), Some(Value::String(name))) => enums[i]
            .number_of(name)
            .map(|n| Some(Value::EnumNumber(n)))
            .ok_or_else(|| invalid(format!("'{name}' is not a constant of '{}'", enums[i].name))),
        (TypeRef::Enum(i), Some(value)) => coerce_enum(&enums[i], &field.name, value.clone())
            .map(Some)
            .map_err(|e| invalid(e.to_string())),
        (TypeRef::Message(_) | TypeRef::Group(_), None) => Ok(None),
        (TypeRef::Message(_) | TypeRef::Group(_), Some(_)) => {
            Err(invalid("message fields cannot declare a default".into()))
        }
    }
}
