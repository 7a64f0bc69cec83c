//! Verbatim storage for fields a schema does not declare.

use bytes::{BufMut, Bytes};

use crate::{
    varint::{decode_varint, encode_varint, encoded_len_varint},
    wire::{WireType, encode_key, key_len},
};

/// One undeclared field exactly as it appeared on the wire.
///
/// `data` holds the payload without framing: the varint bytes, the 4 or 8
/// fixed bytes, the body of a length-delimited field without its length
/// prefix, or the body of a group without its end key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    tag: u32,
    wire_type: WireType,
    data: Bytes,
}

impl UnknownField {
    pub fn new(tag: u32, wire_type: WireType, data: Bytes) -> Self {
        Self {
            tag,
            wire_type,
            data,
        }
    }

    /// Build a varint record from an already decoded value.
    pub fn varint(tag: u32, value: u64) -> Self {
        let mut data = Vec::with_capacity(encoded_len_varint(value));
        encode_varint(value, &mut data);
        Self::new(tag, WireType::Varint, Bytes::from(data))
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The decoded value of a varint record.
    pub fn as_varint(&self) -> Option<u64> {
        match self.wire_type {
            WireType::Varint => decode_varint(&mut self.data.as_ref()).ok(),
            _ => None,
        }
    }

    pub fn encoded_len(&self) -> usize {
        let body = self.data.len();
        key_len(self.tag)
            + match self.wire_type {
                WireType::LengthDelimited => encoded_len_varint(body as u64) + body,
                WireType::StartGroup => body + key_len(self.tag),
                _ => body,
            }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        encode_key(self.tag, self.wire_type, buf);
        match self.wire_type {
            WireType::LengthDelimited => {
                encode_varint(self.data.len() as u64, buf);
                buf.put_slice(&self.data);
            }
            WireType::StartGroup => {
                buf.put_slice(&self.data);
                encode_key(self.tag, WireType::EndGroup, buf);
            }
            _ => buf.put_slice(&self.data),
        }
    }
}

/// Undeclared fields of one message, in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownFieldSet {
    fields: Vec<UnknownField>,
}

impl UnknownFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: UnknownField) {
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &UnknownField> {
        self.fields.iter()
    }

    /// Records carrying `tag`, in stream order.
    pub fn with_tag(&self, tag: u32) -> impl Iterator<Item = &UnknownField> {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn encoded_len(&self) -> usize {
        self.fields.iter().map(UnknownField::encoded_len).sum()
    }

    /// Re-emit every record verbatim, in stream order.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for field in &self.fields {
            field.encode(buf);
        }
    }
}

impl<'a> IntoIterator for &'a UnknownFieldSet {
    type Item = &'a UnknownField;
    type IntoIter = std::slice::Iter<'a, UnknownField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Extend<UnknownField> for UnknownFieldSet {
    fn extend<T: IntoIterator<Item = UnknownField>>(&mut self, iter: T) {
        self.fields.extend(iter);
    }
}
