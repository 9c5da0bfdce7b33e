/*!
Coding of [`time::OffsetDateTime`].

The payload is chosen by [`DateEncodingStrategy`] and wrapped according to
[`DateStrategy`]. Decoding accepts every form either strategy can produce,
as well as bare numbers and bare RFC 3339 text.
*/

use super::*;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const TYPE_KEY: &str = "__type";
const VALUE_KEY: &str = "__value";
const TYPE_SECONDS: &str = "date_epoch_timestamp";
const TYPE_MILLISECONDS: &str = "date_epoch_milliseconds";
const TYPE_ISO8601: &str = "date_iso8601";

/// Seconds since the epoch, as an integer when whole
fn seconds_value(nanos: i128) -> Value {
    let (secs, sub) = (nanos.div_euclid(1_000_000_000), nanos.rem_euclid(1_000_000_000));
    match i64::try_from(secs) {
        Ok(secs) if sub == 0 => Value::from(secs),
        // Exact while the nanosecond count fits the mantissa
        _ if nanos.unsigned_abs() <= 1 << 53 => Value::Double(nanos as f64 / 1e9),
        _ => Value::Double(secs as f64 + sub as f64 / 1e9),
    }
}

impl Encode for OffsetDateTime {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let nanos = self.unix_timestamp_nanos();
        let strategy = encoder.options().date_strategy;
        let (tag, type_name, payload) = match encoder.options().date_encoding {
            DateEncodingStrategy::SecondsSince1970 => {
                (Tag::EPOCH_BASED_DATE_TIME, TYPE_SECONDS, seconds_value(nanos))
            }
            DateEncodingStrategy::MillisecondsSince1970 => {
                let millis = nanos.div_euclid(1_000_000);
                let payload = match strategy {
                    // Tag 1 is defined in seconds
                    DateStrategy::EpochTimestampTag => seconds_value(millis * 1_000_000),
                    DateStrategy::AnnotatedMap => {
                        coerce::box_i128(millis, "milliseconds", &encoder.coding_path())?
                    }
                };
                (Tag::EPOCH_BASED_DATE_TIME, TYPE_MILLISECONDS, payload)
            }
            DateEncodingStrategy::Iso8601 => {
                let text = self
                    .format(&Rfc3339)
                    .map_err(|e| Error::custom(encoder.coding_path(), e))?;
                (Tag::STANDARD_DATE_TIME_STRING, TYPE_ISO8601, Value::TextString(text))
            }
        };

        match strategy {
            DateStrategy::EpochTimestampTag => {
                encoder
                    .scalar_container()
                    .encode_cbor(Value::tagged(tag, payload));
                Ok(())
            }
            DateStrategy::AnnotatedMap => {
                // Annotation keys are fixed, so bypass the key strategy
                let mut map = encoder.keyed_container();
                map.encode_entry(TYPE_KEY.into(), type_name)?;
                map.encode_entry(VALUE_KEY.into(), &payload)
            }
        }
    }
}

fn from_text(text: &str, path: &[Key]) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|e| Error::custom(path, e))
}

/// A timestamp from a number of `unit`s, where `unit` is in nanoseconds
fn from_number(value: &Value, unit: i128, path: &[Key]) -> Result<OffsetDateTime, Error> {
    let nanos = if let Some(n) = value.as_integer() {
        n.checked_mul(unit)
    } else {
        // Scale the whole and fractional parts apart to keep precision
        value.number_value().filter(|f| f.is_finite()).and_then(|f| {
            let whole = f.trunc();
            (whole as i128)
                .checked_mul(unit)
                .map(|n| n + ((f - whole) * unit as f64).round() as i128)
        })
    };
    nanos
        .and_then(|n| OffsetDateTime::from_unix_timestamp_nanos(n).ok())
        .ok_or_else(|| Error::custom(path, format!("Timestamp {value} is out of range")))
}

fn from_annotated(map: &Value, path: &[Key]) -> Result<OffsetDateTime, Error> {
    let type_name = map.get_str(TYPE_KEY).and_then(Value::as_text);
    match (type_name, map.get_str(VALUE_KEY)) {
        (Some(TYPE_SECONDS), Some(value)) if value.is_number() => {
            from_number(value, 1_000_000_000, path)
        }
        (Some(TYPE_MILLISECONDS), Some(value)) if value.is_number() => {
            from_number(value, 1_000_000, path)
        }
        (Some(TYPE_ISO8601), Some(value)) => match value.as_text() {
            Some(text) => from_text(text, path),
            None => Err(type_error(value, path)),
        },
        (Some(TYPE_SECONDS | TYPE_MILLISECONDS), Some(value)) => Err(type_error(value, path)),
        // Any other map is not a date
        _ => Err(type_error(map, path)),
    }
}

impl Decode for OffsetDateTime {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let path = decoder.path();
        let value = decoder.current();
        match value {
            Value::Tagged(tag, inner) if *tag == Tag::STANDARD_DATE_TIME_STRING => {
                match inner.as_text() {
                    Some(text) => from_text(text, path),
                    None => Err(type_error(inner, path)),
                }
            }
            Value::Tagged(tag, inner) if *tag == Tag::EPOCH_BASED_DATE_TIME => {
                if inner.is_number() {
                    from_number(inner, 1_000_000_000, path)
                } else {
                    Err(type_error(inner, path))
                }
            }
            Value::Map(_) => from_annotated(value, path),
            Value::TextString(text) => from_text(text, path),
            v if v.is_number() => from_number(v, 1_000_000_000, path),
            _ => Err(decoder.type_error("date")),
        }
    }
}

fn type_error(value: &Value, path: &[Key]) -> Error {
    Error::TypeMismatch {
        expected: "date",
        found: value.type_name(),
        path: path.into(),
    }
}
