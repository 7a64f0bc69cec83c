//! Base-128 varints and the zigzag mapping for signed integers.

use bytes::{Buf, BufMut};

use crate::error::WireError;

/// Longest valid varint encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` as a base-128 varint, least significant group first.
pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes [`encode_varint`] writes for `value`.
pub fn encoded_len_varint(value: u64) -> usize {
    // Significant bits rounded up to 7-bit groups, with 0 taking one byte.
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// Read one varint from the front of `buf`.
pub fn decode_varint(buf: &mut impl Buf) -> Result<u64, WireError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(WireError::Truncated);
        }
        let byte = buf.get_u8();
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(WireError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7F) << (i * 7);
        if byte < 0x80 {
            return Ok(value);
        }
    }
    Err(WireError::VarintOverflow)
}

/// Map a signed integer so that values of small magnitude stay small.
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}
