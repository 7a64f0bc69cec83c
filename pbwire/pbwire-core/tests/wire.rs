use bytes::Bytes;
use pbwire_core::{
    UnknownField, UnknownFieldSet, WireError, WireType, decode_key, encode_key, key_len,
    wire::{read_fixed32, read_fixed64, read_length_delimited, read_raw_payload},
};

// ── keys ─────────────────────────────────────────────────────────────────────

#[test]
fn encodes_key_as_tag_and_wire_type() {
    let mut buf = Vec::new();
    encode_key(4, WireType::LengthDelimited, &mut buf);
    assert_eq!(buf, vec![0x22]);

    let mut buf = Vec::new();
    encode_key(16, WireType::Varint, &mut buf);
    assert_eq!(buf, vec![0x80, 0x01]);
    assert_eq!(key_len(16), 2);
}

#[test]
fn decodes_key() {
    let mut buf: &[u8] = &[0x08];
    assert_eq!(decode_key(&mut buf), Ok((1, WireType::Varint)));

    let mut buf: &[u8] = &[0x1B];
    assert_eq!(decode_key(&mut buf), Ok((3, WireType::StartGroup)));
}

#[test]
fn rejects_wire_types_six_and_seven() {
    let mut buf: &[u8] = &[0x0E];
    assert_eq!(decode_key(&mut buf), Err(WireError::InvalidWireType(6)));

    let mut buf: &[u8] = &[0x0F];
    assert_eq!(decode_key(&mut buf), Err(WireError::InvalidWireType(7)));
}

#[test]
fn rejects_tag_zero() {
    let mut buf: &[u8] = &[0x00];
    assert_eq!(decode_key(&mut buf), Err(WireError::InvalidTag(0)));
}

// ── payloads ─────────────────────────────────────────────────────────────────

#[test]
fn reads_fixed_width_little_endian() {
    let mut buf: &[u8] = &[0x01, 0x02, 0x03, 0x04];
    assert_eq!(read_fixed32(&mut buf), Ok(0x0403_0201));

    let mut buf: &[u8] = &[1, 0, 0, 0, 0, 0, 0, 0x80];
    assert_eq!(read_fixed64(&mut buf), Ok(0x8000_0000_0000_0001));

    let mut short: &[u8] = &[1, 2, 3];
    assert_eq!(read_fixed32(&mut short), Err(WireError::Truncated));
}

#[test]
fn reads_length_delimited_payload() {
    let mut buf = Bytes::from_static(&[0x03, b'a', b'b', b'c', 0x7F]);
    let payload = read_length_delimited(&mut buf).expect("payload should be read");
    assert_eq!(payload.as_ref(), b"abc");
    assert_eq!(buf.as_ref(), &[0x7F]);
}

#[test]
fn length_past_end_of_input_fails() {
    let mut buf = Bytes::from_static(&[0x05, b'a']);
    assert_eq!(
        read_length_delimited(&mut buf),
        Err(WireError::LengthOutOfBounds {
            length: 5,
            remaining: 1
        })
    );
}

#[test]
fn raw_varint_payload_keeps_original_bytes() {
    // Over-long encoding of 1 is preserved as written.
    let mut buf = Bytes::from_static(&[0x81, 0x80, 0x00, 0x42]);
    let raw = read_raw_payload(1, WireType::Varint, &mut buf, 10).expect("varint");
    assert_eq!(raw.as_ref(), &[0x81, 0x80, 0x00]);
    assert_eq!(buf.as_ref(), &[0x42]);
}

#[test]
fn raw_group_payload_excludes_end_key() {
    // group 2 { field 1 varint 5; group 3 { } }
    let mut buf = Bytes::from_static(&[0x08, 0x05, 0x1B, 0x1C, 0x14, 0xFF]);
    let raw = read_raw_payload(2, WireType::StartGroup, &mut buf, 10).expect("group");
    assert_eq!(raw.as_ref(), &[0x08, 0x05, 0x1B, 0x1C]);
    assert_eq!(buf.as_ref(), &[0xFF]);
}

#[test]
fn group_closed_by_wrong_tag_fails() {
    let mut buf = Bytes::from_static(&[0x08, 0x05, 0x1C]);
    assert_eq!(
        read_raw_payload(2, WireType::StartGroup, &mut buf, 10),
        Err(WireError::UnexpectedEndGroup {
            expected: Some(2),
            found: 3
        })
    );
}

#[test]
fn unterminated_group_fails() {
    let mut buf = Bytes::from_static(&[0x08, 0x05]);
    assert_eq!(
        read_raw_payload(2, WireType::StartGroup, &mut buf, 10),
        Err(WireError::UnterminatedGroup { tag: 2 })
    );
}

#[test]
fn deeply_nested_groups_hit_recursion_limit() {
    let mut data = Vec::new();
    for _ in 0..5 {
        encode_key(1, WireType::StartGroup, &mut data);
    }
    for _ in 0..5 {
        encode_key(1, WireType::EndGroup, &mut data);
    }
    let mut buf = Bytes::from(data);
    // The first start key has already been consumed by the caller.
    let _ = decode_key(&mut buf).expect("key");
    assert_eq!(
        read_raw_payload(1, WireType::StartGroup, &mut buf.clone(), 2),
        Err(WireError::RecursionLimitExceeded)
    );
    assert!(read_raw_payload(1, WireType::StartGroup, &mut buf, 5).is_ok());
}

// ── unknown fields ───────────────────────────────────────────────────────────

#[test]
fn unknown_fields_reencode_with_original_framing() {
    let mut set = UnknownFieldSet::new();
    set.push(UnknownField::varint(2, 0xFFFE));
    set.push(UnknownField::new(
        5,
        WireType::LengthDelimited,
        Bytes::from_static(b"hi"),
    ));
    set.push(UnknownField::new(
        7,
        WireType::StartGroup,
        Bytes::from_static(&[0x08, 0x01]),
    ));
    set.push(UnknownField::new(
        9,
        WireType::Fixed32,
        Bytes::from_static(&[1, 2, 3, 4]),
    ));

    let mut buf = Vec::new();
    set.encode(&mut buf);
    assert_eq!(
        buf,
        vec![
            0x10, 0xFE, 0xFF, 0x03, // tag 2 varint
            0x2A, 0x02, b'h', b'i', // tag 5 length-delimited
            0x3B, 0x08, 0x01, 0x3C, // tag 7 group
            0x4D, 1, 2, 3, 4, // tag 9 fixed32
        ]
    );
    assert_eq!(set.encoded_len(), buf.len());
    assert_eq!(set.len(), 4);
}

#[test]
fn unknown_varint_exposes_decoded_value() {
    let field = UnknownField::varint(3, 86942);
    assert_eq!(field.as_varint(), Some(86942));
    assert_eq!(field.data().as_ref(), &[0x9E, 0xA7, 0x05]);

    let fixed = UnknownField::new(3, WireType::Fixed32, Bytes::from_static(&[0; 4]));
    assert_eq!(fixed.as_varint(), None);
}

#[test]
fn with_tag_preserves_stream_order() {
    let mut set = UnknownFieldSet::new();
    set.push(UnknownField::varint(2, 1));
    set.push(UnknownField::varint(4, 2));
    set.push(UnknownField::varint(2, 3));

    let values: Vec<u64> = set.with_tag(2).filter_map(UnknownField::as_varint).collect();
    assert_eq!(values, vec![1, 3]);
}
