//! Human-readable rendering of messages.
//!
//! `Display` gives a one-line summary in declaration order, e.g.
//! `#<demo.Bar id=7 name="x" tags=[1, 2] sub=#<demo.Foo> note=<unset>>`.
//! Sub-messages are shown by type name only. `Debug` shows present fields
//! in full, recursively.

use std::fmt::{self, Write as _};

use crate::{
    message::{FieldContents, Message},
    schema::FieldDescriptor,
    value::Value,
};

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}", self.descriptor().full_name())?;
        for field in self.descriptor().fields() {
            write!(f, " {}=", field.name())?;
            match self.contents(field.index()) {
                FieldContents::Repeated(values) if self.has_index(field.index()) => {
                    f.write_char('[')?;
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        format_value(&field, value, f)?;
                    }
                    f.write_char(']')?;
                }
                FieldContents::Single(value) => format_value(&field, value, f)?,
                _ => f.write_str("<unset>")?,
            }
        }
        f.write_char('>')
    }
}

fn format_value(field: &FieldDescriptor, value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Bool(v) => write!(f, "{v}"),
        Value::I32(v) => write!(f, "{v}"),
        Value::I64(v) => write!(f, "{v}"),
        Value::U32(v) => write!(f, "{v}"),
        Value::U64(v) => write!(f, "{v}"),
        Value::F32(v) => write!(f, "{v}"),
        Value::F64(v) => write!(f, "{v}"),
        Value::String(s) => write!(f, "{s:?}"),
        Value::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
        Value::EnumNumber(n) => match field.enum_type().as_ref().and_then(|e| e.name_of(*n)) {
            Some(name) => f.write_str(name),
            None => write!(f, "{n}"),
        },
        Value::Message(m) => write!(f, "#<{}>", m.descriptor().full_name()),
        Value::List(values) => write!(f, "[{} elements]", values.len()),
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.descriptor().full_name());
        for field in self.descriptor().fields() {
            match self.contents(field.index()) {
                FieldContents::Single(value) => {
                    s.field(field.name(), value);
                }
                FieldContents::Repeated(values) if self.has_index(field.index()) => {
                    s.field(field.name(), &values);
                }
                _ => {}
            }
        }
        if !self.unknown_fields().is_empty() {
            s.field("unknown_fields", self.unknown_fields());
        }
        s.finish()
    }
}
