//! Message and enum schemas: input definitions and resolved descriptors.

mod descriptor;
mod registry;
mod types;

pub use descriptor::{EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor};
pub(crate) use registry::EnumEntry;
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use types::{Cardinality, EnumDef, FieldDef, FieldType, MessageDef, ScalarType};
