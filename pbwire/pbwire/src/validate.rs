//! Required-field checks.

use crate::{
    error::InvalidField,
    message::{FieldContents, Message},
    value::Value,
};

/// Find the first required field that is not set.
///
/// Fields of `message` itself are checked in declaration order before any
/// sub-message is entered. Only present singular sub-messages and the
/// elements of repeated message fields are searched.
pub(crate) fn check_required(message: &Message) -> Result<(), InvalidField> {
    check(message, message.descriptor().full_name())
}

fn check(message: &Message, path: &str) -> Result<(), InvalidField> {
    let descriptor = message.descriptor();

    for field in descriptor.fields() {
        if field.is_required() && !message.has_index(field.index()) {
            return Err(InvalidField {
                message_type: descriptor.full_name().to_string(),
                path: format!("{path}.{}", field.name()),
                name: field.name().to_string(),
                tag: field.tag(),
                cardinality: field.cardinality(),
                default_value: field.declared_default().cloned(),
            });
        }
    }

    for field in descriptor.fields() {
        if field.message_type().is_none() {
            continue;
        }
        match message.contents(field.index()) {
            FieldContents::Single(Value::Message(child)) => {
                check(child, &format!("{path}.{}", field.name()))?;
            }
            FieldContents::Repeated(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    if let Value::Message(child) = element {
                        check(child, &format!("{path}.{}[{i}]", field.name()))?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}
