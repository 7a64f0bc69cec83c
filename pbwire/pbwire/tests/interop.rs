//! Byte-level agreement with prost-generated message types.


use pbwire::{EnumDef, FieldDef, FieldType, MessageDef, ScalarType, SchemaRegistry, Value};
use prost::Message as _;
use test_helpers::*;

#[derive(Clone, PartialEq, prost::Message)]
struct Scalars {
    #[prost(int32, tag = "1")]
    int32: i32,
    #[prost(sint64, tag = "2")]
    sint64: i64,
    #[prost(fixed32, tag = "3")]
    fixed32: u32,
    #[prost(double, tag = "4")]
    double: f64,
    #[prost(string, tag = "5")]
    string: String,
    #[prost(bytes = "vec", tag = "6")]
    bytes: Vec<u8>,
    #[prost(bool, tag = "7")]
    flag: bool,
    #[prost(uint64, tag = "8")]
    uint64: u64,
    #[prost(float, tag = "9")]
    float: f32,
    #[prost(sfixed64, tag = "10")]
    sfixed64: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Lists {
    #[prost(int32, repeated, packed = "true", tag = "1")]
    packed: Vec<i32>,
    #[prost(sint32, repeated, packed = "false", tag = "2")]
    unpacked: Vec<i32>,
    #[prost(string, repeated, tag = "3")]
    names: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Leaf {
    #[prost(string, optional, tag = "1")]
    label: Option<String>,
    #[prost(enumeration = "Color", optional, tag = "2")]
    color: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Tree {
    #[prost(message, optional, tag = "1")]
    leaf: Option<Leaf>,
    #[prost(message, repeated, tag = "2")]
    leaves: Vec<Leaf>,
    #[prost(int32, optional, tag = "3")]
    depth: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
}

fn schema() -> SchemaRegistry {
    registry(
        vec![
            MessageDef::new(
                "interop.Scalars",
                vec![
                    FieldDef::optional("int32", 1, ScalarType::Int32),
                    FieldDef::optional("sint64", 2, ScalarType::Sint64),
                    FieldDef::optional("fixed32", 3, ScalarType::Fixed32),
                    FieldDef::optional("double", 4, ScalarType::Double),
                    FieldDef::optional("string", 5, ScalarType::String),
                    FieldDef::optional("bytes", 6, ScalarType::Bytes),
                    FieldDef::optional("flag", 7, ScalarType::Bool),
                    FieldDef::optional("uint64", 8, ScalarType::Uint64),
                    FieldDef::optional("float", 9, ScalarType::Float),
                    FieldDef::optional("sfixed64", 10, ScalarType::Sfixed64),
                ],
            ),
            MessageDef::new(
                "interop.Lists",
                vec![
                    FieldDef::repeated("packed", 1, ScalarType::Int32).packed(),
                    FieldDef::repeated("unpacked", 2, ScalarType::Sint32),
                    FieldDef::repeated("names", 3, ScalarType::String),
                ],
            ),
            MessageDef::new(
                "interop.Leaf",
                vec![
                    FieldDef::optional("label", 1, ScalarType::String),
                    FieldDef::optional("color", 2, FieldType::enumeration("interop.Color")),
                ],
            ),
            MessageDef::new(
                "interop.Tree",
                vec![
                    FieldDef::optional("leaf", 1, FieldType::message("interop.Leaf")),
                    FieldDef::repeated("leaves", 2, FieldType::message("interop.Leaf")),
                    FieldDef::optional("depth", 3, ScalarType::Int32),
                ],
            ),
        ],
        vec![EnumDef::new(
            "interop.Color",
            [("RED", 0), ("GREEN", 1), ("BLUE", 2)],
        )],
    )
}

fn prost_scalars() -> Scalars {
    Scalars {
        int32: -42,
        sint64: -9_000_000_000,
        fixed32: 0xDEAD_BEEF,
        double: 2.5,
        string: "héllo".into(),
        bytes: vec![0, 1, 0xFF],
        flag: true,
        uint64: u64::MAX,
        float: -0.75,
        sfixed64: i64::MIN,
    }
}

// ── scalars ──────────────────────────────────────────────────────────────────

#[test]
fn scalars_match_prost_in_both_directions() {
    let reg = schema();
    let expected = prost_scalars();
    let prost_bytes = expected.encode_to_vec();

    let mut msg = new_message(&reg, "interop.Scalars");
    msg.set("int32", -42).unwrap();
    msg.set("sint64", -9_000_000_000i64).unwrap();
    msg.set("fixed32", 0xDEAD_BEEFu32).unwrap();
    msg.set("double", 2.5).unwrap();
    msg.set("string", "héllo").unwrap();
    msg.set("bytes", vec![0u8, 1, 0xFF]).unwrap();
    msg.set("flag", true).unwrap();
    msg.set("uint64", u64::MAX).unwrap();
    msg.set("float", -0.75f32).unwrap();
    msg.set("sfixed64", i64::MIN).unwrap();

    let ours = msg.encode_to_vec().unwrap();
    assert_eq!(ours, prost_bytes);
    assert_eq!(Scalars::decode(ours.as_slice()).unwrap(), expected);

    let decoded =
        pbwire::Message::decode(descriptor(&reg, "interop.Scalars"), prost_bytes.as_slice())
            .unwrap();
    assert_eq!(decoded, msg);
    assert_eq!(*decoded.get("sint64").unwrap(), Value::I64(-9_000_000_000));
    assert_eq!(*decoded.get("uint64").unwrap(), Value::U64(u64::MAX));
}

#[test]
fn negative_int32_uses_ten_bytes_like_prost() {
    let reg = schema();
    let mut msg = new_message(&reg, "interop.Scalars");
    msg.set("int32", i32::MIN).unwrap();
    let expected = Scalars {
        int32: i32::MIN,
        ..Default::default()
    };
    assert_eq!(msg.encode_to_vec().unwrap(), expected.encode_to_vec());
    assert_eq!(msg.encoded_len(), expected.encoded_len());
}

// ── repeated fields ──────────────────────────────────────────────────────────

#[test]
fn packed_and_unpacked_lists_match_prost() {
    let reg = schema();
    let expected = Lists {
        packed: vec![3, 270, 86942, -1],
        unpacked: vec![-2, 0, 2],
        names: vec!["a".into(), String::new(), "c".into()],
    };
    let prost_bytes = expected.encode_to_vec();

    let mut msg = new_message(&reg, "interop.Lists");
    msg.set_repeated("packed", [3, 270, 86942, -1]).unwrap();
    msg.set_repeated("unpacked", [-2, 0, 2]).unwrap();
    msg.set_repeated("names", ["a", "", "c"]).unwrap();

    let ours = msg.encode_to_vec().unwrap();
    assert_eq!(ours, prost_bytes);
    assert_eq!(Lists::decode(ours.as_slice()).unwrap(), expected);

    let decoded =
        pbwire::Message::decode(descriptor(&reg, "interop.Lists"), prost_bytes.as_slice())
            .unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn prost_reads_packed_runs_for_unpacked_fields() {
    let reg = schema();
    let packed_schema = registry(
        vec![MessageDef::new(
            "interop.Lists",
            vec![FieldDef::repeated("unpacked", 2, ScalarType::Sint32).packed()],
        )],
        vec![],
    );
    let mut msg = new_message(&packed_schema, "interop.Lists");
    msg.set_repeated("unpacked", [5, -5]).unwrap();
    let bytes = msg.encode_to_vec().unwrap();

    assert_eq!(Lists::decode(bytes.as_slice()).unwrap().unpacked, vec![5, -5]);
    let decoded =
        pbwire::Message::decode(descriptor(&reg, "interop.Lists"), bytes.as_slice()).unwrap();
    assert_eq!(
        decoded.repeated("unpacked").unwrap(),
        &[Value::I32(5), Value::I32(-5)]
    );
}

// ── nested messages and enums ────────────────────────────────────────────────

#[test]
fn nested_messages_match_prost() {
    let reg = schema();
    let expected = Tree {
        leaf: Some(Leaf {
            label: Some("root".into()),
            color: Some(Color::Blue as i32),
        }),
        leaves: vec![
            Leaf {
                label: None,
                color: Some(Color::Red as i32),
            },
            Leaf::default(),
        ],
        depth: Some(0),
    };
    let prost_bytes = expected.encode_to_vec();

    let leaf = descriptor(&reg, "interop.Leaf");
    let mut msg = new_message(&reg, "interop.Tree");
    let mut root = msg.message_mut("leaf").unwrap();
    root.set("label", "root").unwrap();
    root.set("color", 2).unwrap();
    msg.repeated_mut("leaves")
        .unwrap()
        .push(pbwire::Message::from_fields(leaf.clone(), [("color", 0)]).unwrap())
        .unwrap()
        .push(pbwire::Message::new(leaf))
        .unwrap();
    msg.set("depth", 0).unwrap();

    let ours = msg.encode_to_vec().unwrap();
    assert_eq!(ours, prost_bytes);
    assert_eq!(Tree::decode(ours.as_slice()).unwrap(), expected);

    let decoded =
        pbwire::Message::decode(descriptor(&reg, "interop.Tree"), prost_bytes.as_slice())
            .unwrap();
    assert_eq!(decoded, msg);
    assert!(decoded.has("depth").unwrap());
    let leaves = decoded.repeated("leaves").unwrap();
    assert_eq!(leaves.len(), 2);
    let first = leaves[0].as_message().unwrap();
    assert!(first.has("color").unwrap());
    assert!(!first.has("label").unwrap());
}

#[test]
fn prost_enum_numbers_outside_the_schema_are_kept() {
    let reg = registry(
        vec![MessageDef::new(
            "interop.Leaf",
            vec![FieldDef::optional("color", 2, FieldType::enumeration("interop.Color"))],
        )],
        vec![EnumDef::new("interop.Color", [("RED", 0), ("GREEN", 1)])],
    );
    let leaf = Leaf {
        label: None,
        color: Some(Color::Blue as i32),
    };
    let bytes = leaf.encode_to_vec();

    let decoded =
        pbwire::Message::decode(descriptor(&reg, "interop.Leaf"), bytes.as_slice()).unwrap();
    assert!(!decoded.has("color").unwrap());
    let passed_on = decoded.encode_to_vec().unwrap();
    assert_eq!(Leaf::decode(passed_on.as_slice()).unwrap(), leaf);
}
