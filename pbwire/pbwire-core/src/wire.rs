//! Field keys and payload framing.
//!
//! Every field on the wire starts with a key, the varint
//! `(tag << 3) | wire_type`. The wire type alone determines how many bytes
//! follow, which is what lets a reader skip fields it does not understand:
//!
//! | Wire type         | Payload                                        |
//! |-------------------|------------------------------------------------|
//! | `Varint`          | one base-128 varint                            |
//! | `Fixed64`         | 8 little-endian bytes                          |
//! | `LengthDelimited` | varint length, then that many bytes            |
//! | `StartGroup`      | nested fields up to an `EndGroup` key, same tag |
//! | `Fixed32`         | 4 little-endian bytes                          |

use std::{fmt, ops::RangeInclusive};

use bytes::{Buf, BufMut, Bytes};

use crate::{
    error::WireError,
    varint::{decode_varint, encode_varint, encoded_len_varint},
};

/// Smallest valid field tag.
pub const MIN_TAG: u32 = 1;
/// Largest valid field tag (2^29 - 1).
pub const MAX_TAG: u32 = (1 << 29) - 1;
/// Tags set aside for the protocol implementation itself.
pub const RESERVED_TAGS: RangeInclusive<u32> = 19000..=19999;

/// Three-bit framing code carried in every field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::LengthDelimited => "length-delimited",
            Self::StartGroup => "start-group",
            Self::EndGroup => "end-group",
            Self::Fixed32 => "fixed32",
        }
    }
}

impl TryFrom<u64> for WireType {
    type Error = WireError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::InvalidWireType(other as u8)),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `tag` may be declared by a schema.
pub fn is_valid_tag(tag: u32) -> bool {
    (MIN_TAG..=MAX_TAG).contains(&tag)
}

pub fn encode_key(tag: u32, wire_type: WireType, buf: &mut impl BufMut) {
    encode_varint((u64::from(tag) << 3) | u64::from(wire_type.as_u8()), buf);
}

/// Encoded size of a key for `tag`; independent of the wire type.
pub fn key_len(tag: u32) -> usize {
    encoded_len_varint(u64::from(tag) << 3)
}

/// Read a key and split it into `(tag, wire_type)`.
pub fn decode_key(buf: &mut impl Buf) -> Result<(u32, WireType), WireError> {
    let key = decode_varint(buf)?;
    let wire_type = WireType::try_from(key & 0x07)?;
    let tag = key >> 3;
    if tag < u64::from(MIN_TAG) || tag > u64::from(MAX_TAG) {
        return Err(WireError::InvalidTag(tag));
    }
    Ok((tag as u32, wire_type))
}

pub fn read_fixed32(buf: &mut impl Buf) -> Result<u32, WireError> {
    buf.try_get_u32_le().map_err(|_| WireError::Truncated)
}

pub fn read_fixed64(buf: &mut impl Buf) -> Result<u64, WireError> {
    buf.try_get_u64_le().map_err(|_| WireError::Truncated)
}

/// Read a varint length prefix and split off that many bytes.
pub fn read_length_delimited(buf: &mut Bytes) -> Result<Bytes, WireError> {
    let length = decode_varint(buf)?;
    if length > buf.remaining() as u64 {
        return Err(WireError::LengthOutOfBounds {
            length,
            remaining: buf.remaining(),
        });
    }
    Ok(buf.split_to(length as usize))
}

/// Write `data` with its varint length prefix.
pub fn encode_length_delimited(data: &[u8], buf: &mut impl BufMut) {
    encode_varint(data.len() as u64, buf);
    buf.put_slice(data);
}

/// Consume the payload of one field and return its bytes verbatim.
///
/// The returned span excludes the key that was already read, the length
/// prefix of a length-delimited field, and the end-group key of a group, so
/// that the field can be re-emitted later by writing a fresh key and framing
/// around it. `recursion_budget` bounds how deeply nested groups may go.
pub fn read_raw_payload(
    tag: u32,
    wire_type: WireType,
    buf: &mut Bytes,
    recursion_budget: u32,
) -> Result<Bytes, WireError> {
    match wire_type {
        WireType::Varint => {
            let start = buf.clone();
            decode_varint(buf)?;
            Ok(start.slice(..start.len() - buf.len()))
        }
        WireType::Fixed64 => take(buf, 8),
        WireType::Fixed32 => take(buf, 4),
        WireType::LengthDelimited => read_length_delimited(buf),
        WireType::StartGroup => {
            let start = buf.clone();
            let body_len = skip_group(tag, buf, recursion_budget)?;
            Ok(start.slice(..body_len))
        }
        WireType::EndGroup => Err(WireError::UnexpectedEndGroup {
            expected: None,
            found: tag,
        }),
    }
}

/// Skip the body of group `tag`, including its end key. Returns the length
/// of the body alone.
fn skip_group(tag: u32, buf: &mut Bytes, recursion_budget: u32) -> Result<usize, WireError> {
    let Some(budget) = recursion_budget.checked_sub(1) else {
        return Err(WireError::RecursionLimitExceeded);
    };
    let start_len = buf.len();
    loop {
        if !buf.has_remaining() {
            return Err(WireError::UnterminatedGroup { tag });
        }
        let body_len = start_len - buf.len();
        let (field_tag, wire_type) = decode_key(buf)?;
        if wire_type == WireType::EndGroup {
            if field_tag == tag {
                return Ok(body_len);
            }
            return Err(WireError::UnexpectedEndGroup {
                expected: Some(tag),
                found: field_tag,
            });
        }
        read_raw_payload(field_tag, wire_type, buf, budget)?;
    }
}

fn take(buf: &mut Bytes, n: usize) -> Result<Bytes, WireError> {
    if buf.len() < n {
        return Err(WireError::Truncated);
    }
    Ok(buf.split_to(n))
}
