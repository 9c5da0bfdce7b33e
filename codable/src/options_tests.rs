use super::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, PartialEq)]
struct Contact {
    first_name: String,
    home_url: String,
}

impl Encode for Contact {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let mut c = encoder.keyed_container();
        c.encode("firstName", &self.first_name)?;
        c.encode("homeURL", &self.home_url)
    }
}

impl Decode for Contact {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut c = decoder.keyed_container()?;
        Ok(Self {
            first_name: c.decode("firstName")?,
            home_url: c.decode("homeURL")?,
        })
    }
}

fn contact() -> Contact {
    Contact {
        first_name: "Ann".into(),
        home_url: "https://example.com".into(),
    }
}

fn keys_of(value: &Value) -> Vec<String> {
    value
        .as_map()
        .unwrap()
        .iter()
        .map(|(k, _)| k.as_text().unwrap().to_string())
        .collect()
}

#[test]
fn snake_case_keys() {
    let options = Options {
        key_strategy: KeyStrategy::SnakeCase,
        ..Default::default()
    };
    let value = to_value(&contact(), &options).unwrap();
    assert_eq!(keys_of(&value), ["first_name", "home_url"]);

    assert_eq!(from_value::<Contact>(&value, &options).unwrap(), contact());

    // Without the strategy the converted keys are not found
    assert!(matches!(
        from_value::<Contact>(&value, &Options::default()),
        Err(Error::KeyNotFound { .. })
    ));
}

struct Account {
    user_id: u32,
    first_name: String,
}

impl Encode for Account {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let mut c = encoder.keyed_container();
        c.encode("userID", &self.user_id)?;
        c.encode("first_name", &self.first_name)
    }
}

impl Decode for Account {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut c = decoder.keyed_container()?;
        assert!(c.contains("userID"));
        Ok(Self {
            user_id: c.decode("userID")?,
            first_name: c.decode("first_name")?,
        })
    }
}

#[test]
fn keys_without_exact_inverse() {
    let account = Account {
        user_id: 9,
        first_name: "Ann".into(),
    };
    for key_strategy in [KeyStrategy::SnakeCase, KeyStrategy::CamelCase] {
        let options = Options {
            key_strategy,
            ..Default::default()
        };
        let data = encode_structured(&account, &options).unwrap();
        let back: Account = decode_structured(&data, &options).unwrap();
        assert_eq!((back.user_id, back.first_name.as_str()), (9, "Ann"));
    }

    let options = Options {
        key_strategy: KeyStrategy::SnakeCase,
        ..Default::default()
    };
    let value = to_value(&account, &options).unwrap();
    assert_eq!(keys_of(&value), ["user_id", "first_name"]);
}

struct SnakeFields {
    user_id: u32,
    _private_value: bool,
}

impl Encode for SnakeFields {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let mut c = encoder.keyed_container();
        c.encode("user_id", &self.user_id)?;
        c.encode("_private_value", &self._private_value)
    }
}

impl Decode for SnakeFields {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut c = decoder.keyed_container()?;
        Ok(Self {
            user_id: c.decode("user_id")?,
            _private_value: c.decode("_private_value")?,
        })
    }
}

#[test]
fn camel_case_keys() {
    let options = Options {
        key_strategy: KeyStrategy::CamelCase,
        ..Default::default()
    };
    let fields = SnakeFields {
        user_id: 5,
        _private_value: true,
    };
    let value = to_value(&fields, &options).unwrap();
    assert_eq!(keys_of(&value), ["userId", "_privateValue"]);

    let back = from_value::<SnakeFields>(&value, &options).unwrap();
    assert_eq!(back.user_id, 5);
    assert!(back._private_value);
}

#[test]
fn strategies_skip_collection_keys() {
    let options = Options {
        key_strategy: KeyStrategy::SnakeCase,
        ..Default::default()
    };
    let counts = BTreeMap::from([("someKey".to_string(), 1u8)]);
    let value = to_value(&counts, &options).unwrap();
    assert_eq!(keys_of(&value), ["someKey"]);
    assert_eq!(
        from_value::<BTreeMap<String, u8>>(&value, &options).unwrap(),
        counts
    );
}

struct Outer {
    inner: Inner,
}

struct Inner {
    value: u8,
}

impl Encode for Outer {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.keyed_container().encode("inner", &self.inner)
    }
}

impl Encode for Inner {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.keyed_container().encode("value", &self.value)
    }
}

impl Decode for Outer {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            inner: decoder.keyed_container()?.decode("inner")?,
        })
    }
}

impl Decode for Inner {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            value: decoder.keyed_container()?.decode("value")?,
        })
    }
}

#[test]
fn custom_key_strategy() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let encode_options = Options {
        key_strategy: KeyStrategy::custom(move |path| {
            log.lock().unwrap().push(CodingPath::from(path).to_string());
            let last = path.last().and_then(Key::as_str).unwrap_or_default();
            Key::Str(last.to_uppercase())
        }),
        ..Default::default()
    };
    let value = to_value(
        &Outer {
            inner: Inner { value: 3 },
        },
        &encode_options,
    )
    .unwrap();
    assert_eq!(keys_of(&value), ["INNER"]);
    assert_eq!(keys_of(value.get_str("INNER").unwrap()), ["VALUE"]);
    assert_eq!(*seen.lock().unwrap(), ["inner", "inner.value"]);

    // Decoding converts the requested field keys the same way
    seen.lock().unwrap().clear();
    let back = from_value::<Outer>(&value, &encode_options).unwrap();
    assert_eq!(back.inner.value, 3);
    assert_eq!(*seen.lock().unwrap(), ["inner", "inner.value"]);
}

struct IntKeyed {
    a: u8,
    b: u8,
}

impl Encode for IntKeyed {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let mut c = encoder.keyed_container();
        c.encode(Key::Int(1), &self.a)?;
        c.encode(Key::Int(-2), &self.b)
    }
}

impl Decode for IntKeyed {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut c = decoder.keyed_container()?;
        Ok(Self {
            a: c.decode(Key::Int(1))?,
            b: c.decode(Key::Int(-2))?,
        })
    }
}

#[test]
fn integer_keys() {
    let fields = IntKeyed { a: 10, b: 20 };
    let value = to_value(&fields, &Options::default()).unwrap();
    assert_eq!(
        value,
        Value::Map(vec![
            (Value::from(1), Value::from(10)),
            (Value::from(-2), Value::from(20)),
        ])
    );

    // Integer keys are never passed through the key strategy
    let options = Options {
        key_strategy: KeyStrategy::CamelCase,
        ..Default::default()
    };
    assert_eq!(to_value(&fields, &options).unwrap(), value);

    let options = Options {
        use_string_keys: true,
        ..Default::default()
    };
    let value = to_value(&fields, &options).unwrap();
    assert_eq!(keys_of(&value), ["1", "-2"]);
    let back = from_value::<IntKeyed>(&value, &options).unwrap();
    assert_eq!((back.a, back.b), (10, 20));
}

#[test]
fn string_map_keys() {
    let options = Options {
        use_string_keys: true,
        ..Default::default()
    };
    let scores = BTreeMap::from([(-1i32, true), (7, false)]);
    let value = to_value(&scores, &options).unwrap();
    assert_eq!(keys_of(&value), ["-1", "7"]);
    assert_eq!(
        from_value::<BTreeMap<i32, bool>>(&value, &options).unwrap(),
        scores
    );
}

#[test]
fn forbidden_map_keys() {
    let forbid = Options {
        forbid_non_string_map_keys: true,
        ..Default::default()
    };
    let scores = BTreeMap::from([(1u8, true)]);
    let Err(Error::NonStringKeyInMap { key, path }) = to_value(&scores, &forbid) else {
        panic!("Expected NonStringKeyInMap");
    };
    assert_eq!(key, "1");
    assert!(path.is_root());

    // Forbidding wins over stringifying
    let both = Options {
        use_string_keys: true,
        ..forbid.clone()
    };
    assert!(matches!(
        to_value(&scores, &both),
        Err(Error::NonStringKeyInMap { .. })
    ));
    assert!(matches!(
        to_value(&IntKeyed { a: 1, b: 2 }, &both),
        Err(Error::NonStringKeyInMap { .. })
    ));

    // Text keys are unaffected
    let names = BTreeMap::from([("a".to_string(), 1u8)]);
    assert!(to_value(&names, &forbid).is_ok());
}

struct Scaled(u32);

impl Encode for Scaled {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let scale = encoder.user_info().get::<u32>("scale").copied().unwrap_or(1);
        encoder.scalar_container().encode(&(self.0 * scale))
    }
}

impl Decode for Scaled {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let scale = decoder.user_info().get::<u32>("scale").copied().unwrap_or(1);
        let raw: u32 = decoder.scalar_container().decode()?;
        Ok(Scaled(raw / scale))
    }
}

#[test]
fn user_info() {
    let mut options = Options::default();
    options.user_info.insert("scale", 10u32);
    assert!(options.user_info.contains_key("scale"));
    assert!(options.user_info.get::<String>("scale").is_none());

    let value = to_value(&vec![Scaled(1), Scaled(2)], &options).unwrap();
    assert_eq!(value, Value::Array(vec![Value::from(10), Value::from(20)]));

    let back = from_value::<Vec<Scaled>>(&value, &options).unwrap();
    assert_eq!(back.iter().map(|s| s.0).collect::<Vec<_>>(), [1, 2]);

    let back = from_value::<Vec<Scaled>>(&value, &Options::default()).unwrap();
    assert_eq!(back[1].0, 20);
}

#[cfg(feature = "serde")]
#[test]
fn strategies_serialize() {
    assert_eq!(
        serde_json::to_string(&DateStrategy::AnnotatedMap).unwrap(),
        "\"annotated_map\""
    );
    assert_eq!(
        serde_json::from_str::<DateEncodingStrategy>("\"milliseconds_since1970\"").unwrap(),
        DateEncodingStrategy::MillisecondsSince1970
    );
}
