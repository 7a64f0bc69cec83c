//! Container for the elements of a repeated field.

use std::{fmt, ops::Deref};

use crate::{
    error::FieldError,
    message::MessageMut,
    schema::FieldDescriptor,
    value::Value,
};

/// Ordered elements of one repeated field.
///
/// Every element is checked against the field's type on the way in, by the
/// same conversion a singular setter applies. Single-element operations
/// commit one element at a time, so in `r.push(a)?.push(b)?` a failure on
/// `b` leaves `a` appended. Bulk operations ([`extend`](Self::extend),
/// [`replace`](Self::replace), [`map_in_place`](Self::map_in_place)) check
/// every element first and leave the container untouched on failure.
///
/// Read access goes through `Deref<Target = [Value]>`.
#[derive(Debug, Clone)]
pub struct RepeatedField {
    field: FieldDescriptor,
    values: Vec<Value>,
    modified: bool,
}

impl RepeatedField {
    pub(crate) fn new(field: FieldDescriptor) -> Self {
        Self {
            field,
            values: Vec::new(),
            modified: false,
        }
    }

    pub fn field(&self) -> &FieldDescriptor {
        &self.field
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether the container has been mutated since it was created.
    pub(crate) fn is_modified(&self) -> bool {
        self.modified
    }

    fn coerce_all<I, V>(&self, values: I) -> Result<Vec<Value>, FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|v| self.field.coerce(v.into()))
            .collect()
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), FieldError> {
        if index < len {
            return Ok(());
        }
        Err(FieldError::IndexOutOfBounds {
            field: self.field.name().to_string(),
            index,
            len: self.values.len(),
        })
    }

    /// Append one element.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<&mut Self, FieldError> {
        let value = self.field.coerce(value.into())?;
        self.values.push(value);
        self.modified = true;
        Ok(self)
    }

    /// Append an element that the decoder has already converted.
    pub(crate) fn push_unchecked(&mut self, value: Value) {
        self.values.push(value);
        self.modified = true;
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), FieldError> {
        self.check_index(index, self.values.len())?;
        self.values[index] = self.field.coerce(value.into())?;
        self.modified = true;
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<(), FieldError> {
        self.check_index(index, self.values.len() + 1)?;
        let value = self.field.coerce(value.into())?;
        self.values.insert(index, value);
        self.modified = true;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Value, FieldError> {
        self.check_index(index, self.values.len())?;
        self.modified = true;
        Ok(self.values.remove(index))
    }

    pub fn pop(&mut self) -> Option<Value> {
        let value = self.values.pop()?;
        self.modified = true;
        Some(value)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.modified = true;
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
        self.modified = true;
    }

    /// Append every element of `values`, or none of them.
    pub fn extend<I, V>(&mut self, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = self.coerce_all(values)?;
        self.values.extend(values);
        self.modified = true;
        Ok(())
    }

    /// Replace the contents with `values`, or leave them unchanged.
    pub fn replace<I, V>(&mut self, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = self.coerce_all(values)?;
        self.modified = true;
        Ok(())
    }

    /// A new container holding these elements followed by `values`.
    pub fn concat<I, V>(&self, values: I) -> Result<RepeatedField, FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut out = self.clone();
        out.extend(values)?;
        Ok(out)
    }

    /// Distinct elements of `self` that also occur in `other`, in the order
    /// of `self`.
    pub fn intersection(&self, other: &[Value]) -> RepeatedField {
        let mut values: Vec<Value> = Vec::new();
        for value in &self.values {
            if other.contains(value) && !values.contains(value) {
                values.push(value.clone());
            }
        }
        self.derived(values)
    }

    /// Elements of `self` that do not occur in `other`.
    pub fn difference(&self, other: &[Value]) -> RepeatedField {
        let values = self
            .values
            .iter()
            .filter(|value| !other.contains(value))
            .cloned()
            .collect();
        self.derived(values)
    }

    fn derived(&self, values: Vec<Value>) -> RepeatedField {
        RepeatedField {
            field: self.field.clone(),
            values,
            modified: true,
        }
    }

    /// Replace each element with `f(element)`. If any result fails the
    /// field's type check, no element is replaced.
    pub fn map_in_place<F, V>(&mut self, f: F) -> Result<(), FieldError>
    where
        F: FnMut(&Value) -> V,
        V: Into<Value>,
    {
        let mapped: Vec<V> = self.values.iter().map(f).collect();
        self.replace(mapped)
    }

    /// Mutable access to one element of a repeated message field.
    pub fn message_mut(&mut self, index: usize) -> Option<MessageMut<'_>> {
        let message = self.values.get_mut(index)?.as_message_mut()?;
        self.modified = true;
        Some(MessageMut::new(message))
    }
}

/// Mutable access to a repeated field held by a message.
///
/// Reads go through `Deref<Target = RepeatedField>`. Writes are limited to
/// the element-checked operations, so the container cannot be swapped for
/// one that belongs to another field.
///
/// ```compile_fail
/// # fn swap(mut a: pbwire::Message, other: pbwire::RepeatedField) {
/// *a.repeated_mut("i1").unwrap() = other;
/// # }
/// ```
pub struct RepeatedFieldMut<'a>(&'a mut RepeatedField);

impl<'a> RepeatedFieldMut<'a> {
    pub(crate) fn new(field: &'a mut RepeatedField) -> Self {
        Self(field)
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<&mut Self, FieldError> {
        self.0.push(value)?;
        Ok(self)
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), FieldError> {
        self.0.set(index, value)
    }

    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<(), FieldError> {
        self.0.insert(index, value)
    }

    pub fn remove(&mut self, index: usize) -> Result<Value, FieldError> {
        self.0.remove(index)
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn extend<I, V>(&mut self, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.0.extend(values)
    }

    pub fn replace<I, V>(&mut self, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.0.replace(values)
    }

    pub fn map_in_place<F, V>(&mut self, f: F) -> Result<(), FieldError>
    where
        F: FnMut(&Value) -> V,
        V: Into<Value>,
    {
        self.0.map_in_place(f)
    }

    pub fn message_mut(&mut self, index: usize) -> Option<MessageMut<'_>> {
        self.0.message_mut(index)
    }
}

impl Deref for RepeatedFieldMut<'_> {
    type Target = RepeatedField;

    fn deref(&self) -> &RepeatedField {
        self.0
    }
}

impl fmt::Debug for RepeatedFieldMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl Deref for RepeatedField {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<'a> IntoIterator for &'a RepeatedField {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl PartialEq for RepeatedField {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.values == other.values
    }
}

impl PartialEq<[Value]> for RepeatedField {
    fn eq(&self, other: &[Value]) -> bool {
        self.values == other
    }
}

impl PartialEq<Vec<Value>> for RepeatedField {
    fn eq(&self, other: &Vec<Value>) -> bool {
        &self.values == other
    }
}
