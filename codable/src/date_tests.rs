use super::*;
use time::{OffsetDateTime, macros::datetime};

fn options(date_strategy: DateStrategy, date_encoding: DateEncodingStrategy) -> Options {
    Options {
        date_strategy,
        date_encoding,
        ..Default::default()
    }
}

fn annotated(type_name: &str, value: Value) -> Value {
    Value::Map(vec![
        (Value::from("__type"), Value::from(type_name)),
        (Value::from("__value"), value),
    ])
}

#[test]
fn epoch_tag() {
    let date = datetime!(2021-01-01 0:00 UTC);
    let value = to_value(&date, &Options::default()).unwrap();
    assert_eq!(
        value,
        Value::tagged(Tag::EPOCH_BASED_DATE_TIME, Value::from(1609459200i64))
    );

    let date = datetime!(1970-01-01 0:00:01.5 UTC);
    assert_eq!(
        to_value(&date, &Options::default()).unwrap(),
        Value::tagged(Tag::EPOCH_BASED_DATE_TIME, Value::Double(1.5))
    );

    let date = datetime!(1969-12-31 23:59:59 UTC);
    assert_eq!(
        to_value(&date, &Options::default()).unwrap(),
        Value::tagged(Tag::EPOCH_BASED_DATE_TIME, Value::from(-1))
    );
}

#[test]
fn milliseconds() {
    let date = datetime!(1970-01-01 0:00:01.2345 UTC);
    let tagged = options(
        DateStrategy::EpochTimestampTag,
        DateEncodingStrategy::MillisecondsSince1970,
    );
    assert_eq!(
        to_value(&date, &tagged).unwrap(),
        Value::tagged(Tag::EPOCH_BASED_DATE_TIME, Value::Double(1.234))
    );

    let map = options(
        DateStrategy::AnnotatedMap,
        DateEncodingStrategy::MillisecondsSince1970,
    );
    let value = to_value(&date, &map).unwrap();
    assert_eq!(value, annotated("date_epoch_milliseconds", Value::from(1234)));
    assert_eq!(
        from_value::<OffsetDateTime>(&value, &map).unwrap(),
        datetime!(1970-01-01 0:00:01.234 UTC)
    );
}

#[test]
fn iso8601() {
    let date = datetime!(2021-06-15 12:30:45 UTC);
    let value = to_value(
        &date,
        &options(DateStrategy::EpochTimestampTag, DateEncodingStrategy::Iso8601),
    )
    .unwrap();
    assert_eq!(
        value,
        Value::tagged(
            Tag::STANDARD_DATE_TIME_STRING,
            Value::from("2021-06-15T12:30:45Z")
        )
    );

    let value = to_value(
        &date,
        &options(DateStrategy::AnnotatedMap, DateEncodingStrategy::Iso8601),
    )
    .unwrap();
    assert_eq!(
        value,
        annotated("date_iso8601", Value::from("2021-06-15T12:30:45Z"))
    );
}

#[test]
fn annotated_seconds() {
    let date = datetime!(2021-01-01 0:00 UTC);
    let value = to_value(
        &date,
        &options(
            DateStrategy::AnnotatedMap,
            DateEncodingStrategy::SecondsSince1970,
        ),
    )
    .unwrap();
    assert_eq!(
        value,
        annotated("date_epoch_timestamp", Value::from(1609459200i64))
    );

    // Annotation keys ignore the key strategy
    let camel = Options {
        key_strategy: KeyStrategy::CamelCase,
        ..options(
            DateStrategy::AnnotatedMap,
            DateEncodingStrategy::SecondsSince1970,
        )
    };
    assert_eq!(to_value(&date, &camel).unwrap(), value);
}

#[test]
fn round_trips() {
    let date = datetime!(2024-02-29 23:59:58.25 +02:00);
    for strategy in [DateStrategy::EpochTimestampTag, DateStrategy::AnnotatedMap] {
        for encoding in [
            DateEncodingStrategy::SecondsSince1970,
            DateEncodingStrategy::MillisecondsSince1970,
            DateEncodingStrategy::Iso8601,
        ] {
            let options = options(strategy, encoding);
            let data = encode_structured(&date, &options).unwrap();
            // Decoding ignores the strategies entirely
            let back: OffsetDateTime = decode_structured(&data, &Options::default()).unwrap();
            assert_eq!(back, date, "{strategy:?} {encoding:?}");
        }
    }
}

#[test]
fn lenient_decoding() {
    let date = datetime!(2021-01-01 0:00 UTC);
    let opts = Options::default();

    assert_eq!(
        from_value::<OffsetDateTime>(&Value::from(1609459200i64), &opts).unwrap(),
        date
    );
    assert_eq!(
        from_value::<OffsetDateTime>(&Value::Double(1609459200.0), &opts).unwrap(),
        date
    );
    assert_eq!(
        from_value::<OffsetDateTime>(&Value::from("2021-01-01T00:00:00Z"), &opts).unwrap(),
        date
    );
    assert_eq!(
        from_value::<OffsetDateTime>(
            &Value::tagged(Tag::EPOCH_BASED_DATE_TIME, Value::Float(0.5)),
            &opts
        )
        .unwrap(),
        datetime!(1970-01-01 0:00:00.5 UTC)
    );
}

#[test]
fn invalid_dates() {
    let opts = Options::default();
    assert!(matches!(
        from_value::<OffsetDateTime>(&Value::Null, &opts),
        Err(Error::UnexpectedNull {
            expected: "date",
            ..
        })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(&Value::Bool(true), &opts),
        Err(Error::TypeMismatch {
            expected: "date",
            found: "boolean",
            ..
        })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(
            &Value::tagged(Tag::STANDARD_DATE_TIME_STRING, Value::from(1)),
            &opts
        ),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(&Value::from("yesterday"), &opts),
        Err(Error::DataCorrupted { .. })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(&annotated("date_lunar", Value::from(1)), &opts),
        Err(Error::TypeMismatch {
            expected: "date",
            found: "map",
            ..
        })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(
            &Value::Map(vec![(Value::from("a"), Value::from(1))]),
            &opts
        ),
        Err(Error::TypeMismatch {
            expected: "date",
            found: "map",
            ..
        })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(
            &Value::Map(vec![(Value::from("__type"), Value::from("date_iso8601"))]),
            &opts
        ),
        Err(Error::TypeMismatch { found: "map", .. })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(&annotated("date_epoch_timestamp", Value::from("x")), &opts),
        Err(Error::TypeMismatch {
            found: "text string",
            ..
        })
    ));
    assert!(matches!(
        from_value::<OffsetDateTime>(&Value::UnsignedInt(u64::MAX), &opts),
        Err(Error::DataCorrupted { .. })
    ));
}
