use super::*;
use alloc::{format, string::ToString, vec};

fn sample() -> Value {
    Value::Map(vec![
        ("name".into(), "tessera".into()),
        ("count".into(), 3u8.into()),
        (
            "items".into(),
            Value::Array(vec![(-1).into(), 1.5f64.into(), Value::Null]),
        ),
        (
            Value::tagged(Tag::EPOCH_BASED_DATE_TIME, 1u8.into()),
            Value::ByteString(vec![0xde, 0xad]),
        ),
    ])
}

#[test]
fn round_trip() {
    let values = [
        sample(),
        Value::UnsignedInt(u64::MAX),
        Value::NegativeInt(u64::MAX),
        Value::NegativeInt(0),
        Value::Simple(0),
        Value::Simple(19),
        Value::Simple(32),
        Value::Simple(255),
        Value::Undefined,
        Value::Half(half::f16::from_f32(-2.5)),
        Value::Float(f32::NAN),
        Value::Double(-0.0),
        Value::TextString("\u{10151} and more".into()),
        Value::tagged(Tag(12345678901), Value::tagged(Tag::UUID, vec![0u8; 16].into())),
        Value::Array(vec![Value::Array(vec![Value::Map(vec![])])]),
    ];
    for v in values {
        assert_eq!(decode::decode(&encode::encode(&v)).unwrap(), v, "{v}");
    }
}

#[test]
fn structural_equality() {
    assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    assert_ne!(Value::Double(0.0), Value::Double(-0.0));
    assert_ne!(Value::Float(1.0), Value::Double(1.0));
    assert_ne!(Value::UnsignedInt(0), Value::NegativeInt(0));
    assert_ne!(
        Value::tagged(Tag::URI, "a".into()),
        Value::tagged(Tag::BASE64, "a".into())
    );

    let mut keys = hashbrown::HashSet::new();
    assert!(keys.insert(Value::Double(f64::NAN)));
    assert!(!keys.insert(Value::Double(f64::NAN)));
    assert!(keys.insert(Value::from(1u8)));
    assert!(!keys.insert(Value::from(1u64)));
}

#[test]
fn accessors_see_through_tags() {
    let v = Value::tagged(Tag(1), Value::tagged(Tag(2), "text".into()));
    assert_eq!(v.as_text(), Some("text"));
    assert_eq!(v.untagged(), &Value::from("text"));
    assert_eq!(v.tag(), Some(Tag(1)));
    assert_eq!(v.as_tagged().map(|(t, _)| t), Some(Tag(1)));
    assert_eq!(v.as_bytes(), None);
    assert_eq!(Value::from("x").tag(), None);

    assert_eq!(Value::tagged(Tag(9), true.into()).as_bool(), Some(true));
    assert!(Value::tagged(Tag(9), Value::Null).is_null());
    assert_eq!(Value::from(7u8).as_unsigned_int(), Some(7));
    assert_eq!(Value::from(-7).as_negative_int(), Some(6));
    assert_eq!(Value::from(-7).as_integer(), Some(-7));
    assert_eq!(Value::NegativeInt(u64::MAX).as_integer(), Some(-18446744073709551616));
    assert_eq!(Value::Simple(3).as_simple(), Some(3));
    assert_eq!(Value::Float(1.0).as_double(), None);
}

#[test]
fn number_value() {
    assert_eq!(Value::from(3u8).number_value(), Some(3.0));
    assert_eq!(Value::from(-3).number_value(), Some(-3.0));
    assert_eq!(Value::Half(half::f16::from_f32(0.5)).number_value(), Some(0.5));
    assert_eq!(Value::Float(0.25).number_value(), Some(0.25));
    assert_eq!(
        Value::tagged(Tag::EPOCH_BASED_DATE_TIME, Value::Double(1.5)).number_value(),
        Some(1.5)
    );
    assert_eq!(Value::from(1u64 << 53).number_value(), Some(9007199254740992.0));
    assert_eq!(Value::from((1u64 << 53) + 1).number_value(), None);
    assert_eq!(Value::UnsignedInt(u64::MAX).number_value(), None);
    assert_eq!(
        Value::NegativeInt((1u64 << 53) - 1).number_value(),
        Some(-9007199254740992.0)
    );
    assert_eq!(Value::NegativeInt(1u64 << 53).number_value(), None);
    assert_eq!(
        Value::NegativeInt(u64::MAX).number_value(),
        Some(-18446744073709551616.0)
    );
    assert_eq!(Value::from("1").number_value(), None);
    assert!(Value::Half(half::f16::ONE).is_number());
    assert!(!Value::Null.is_number());
}

#[test]
fn subscripting() {
    let mut v = sample();
    assert_eq!(v.get_str("count"), Some(&Value::from(3u8)));
    assert_eq!(v.get(&"name".into()), Some(&Value::from("tessera")));
    assert_eq!(
        v.get(&Value::tagged(Tag::EPOCH_BASED_DATE_TIME, 1u8.into())),
        Some(&Value::ByteString(vec![0xde, 0xad]))
    );
    assert_eq!(v.get_str("missing"), None);
    assert_eq!(v.index(0), None);

    let items = v.get_str("items").unwrap();
    assert_eq!(items.index(2), Some(&Value::Null));
    assert_eq!(items.index(3), None);

    assert_eq!(v.insert("count".into(), 4u8.into()), Some(Value::from(3u8)));
    assert_eq!(v.insert("extra".into(), true.into()), None);
    assert_eq!(v.as_map().map(|m| m.len()), Some(5));
    assert_eq!(v.get_str("count"), Some(&Value::from(4u8)));

    let items = v.get_mut(&"items".into()).unwrap();
    assert_eq!(items.set_index(0, "first".into()), Some(Value::from(-1)));
    assert_eq!(items.set_index(5, Value::Null), None);
    assert_eq!(items.index(0), Some(&Value::from("first")));

    let mut scalar = Value::from(1u8);
    assert_eq!(scalar.insert("k".into(), Value::Null), None);
    assert_eq!(scalar, Value::from(1u8));
}

#[test]
fn conversions() {
    assert_eq!(Value::from(0i8), Value::UnsignedInt(0));
    assert_eq!(Value::from(i64::MIN), Value::NegativeInt(i64::MAX as u64));
    assert_eq!(Value::from(-1isize), Value::NegativeInt(0));
    assert_eq!(Value::from(Some(1u8)), Value::UnsignedInt(1));
    assert_eq!(Value::from(None::<u8>), Value::Null);
    assert_eq!(Value::from(&b"ab"[..]), Value::ByteString(vec![b'a', b'b']));
    assert_eq!(Value::from("ab".to_string()), Value::TextString("ab".into()));
    assert_eq!(u64::from(Tag::UUID), 37);
    assert_eq!(Tag::from(55799), Tag::SELF_DESCRIBE_CBOR);
}

#[test]
fn diagnostic_notation() {
    assert_eq!(
        sample().to_string(),
        r#"{"name": "tessera", "count": 3, "items": [-1, 1.5, null], 1(1): h'dead'}"#
    );
    assert_eq!(Value::NegativeInt(u64::MAX).to_string(), "-18446744073709551616");
    assert_eq!(Value::Double(1.0).to_string(), "1.0");
    assert_eq!(Value::Float(f32::NAN).to_string(), "NaN");
    assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
    assert_eq!(Value::Half(half::f16::INFINITY).to_string(), "Infinity");
    assert_eq!(Value::Simple(16).to_string(), "simple(16)");
    assert_eq!(Value::Undefined.to_string(), "undefined");
    assert_eq!(Value::from("a\"b\n").to_string(), r#""a\"b\n""#);
    assert_eq!(format!("{}", Value::Array(vec![])), "[]");
}
