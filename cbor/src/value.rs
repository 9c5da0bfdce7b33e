/*!
In-memory representation of a single CBOR data item.
*/

use super::*;
use core::hash::{Hash, Hasher};

/// A CBOR semantic tag number (major type 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u64);

impl Tag {
    pub const STANDARD_DATE_TIME_STRING: Tag = Tag(0);
    pub const EPOCH_BASED_DATE_TIME: Tag = Tag(1);
    pub const POSITIVE_BIGNUM: Tag = Tag(2);
    pub const NEGATIVE_BIGNUM: Tag = Tag(3);
    pub const DECIMAL_FRACTION: Tag = Tag(4);
    pub const BIGFLOAT: Tag = Tag(5);
    pub const EXPECTED_CONVERSION_TO_BASE64_URL_ENCODING: Tag = Tag(21);
    pub const EXPECTED_CONVERSION_TO_BASE64_ENCODING: Tag = Tag(22);
    pub const EXPECTED_CONVERSION_TO_BASE16_ENCODING: Tag = Tag(23);
    pub const ENCODED_CBOR_DATA_ITEM: Tag = Tag(24);
    pub const URI: Tag = Tag(32);
    pub const BASE64_URL: Tag = Tag(33);
    pub const BASE64: Tag = Tag(34);
    pub const REGULAR_EXPRESSION: Tag = Tag(35);
    pub const MIME_MESSAGE: Tag = Tag(36);
    pub const UUID: Tag = Tag(37);
    pub const SELF_DESCRIBE_CBOR: Tag = Tag(55799);
}

impl From<u64> for Tag {
    fn from(value: u64) -> Self {
        Tag(value)
    }
}

impl From<Tag> for u64 {
    fn from(value: Tag) -> Self {
        value.0
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded (or programmatically built) CBOR data item.
///
/// Floating point payloads compare and hash by bit pattern, so `NaN == NaN`
/// and `0.0 != -0.0`, which keeps `Value` usable as a map key.
#[derive(Debug, Clone)]
pub enum Value {
    UnsignedInt(u64),
    /// The integer `-1 - n`
    NegativeInt(u64),
    ByteString(Vec<u8>),
    TextString(String),
    Array(Vec<Value>),
    /// Key/value pairs in document order; keys are unique
    Map(Vec<(Value, Value)>),
    Tagged(Tag, Box<Value>),
    Simple(u8),
    Bool(bool),
    Null,
    Undefined,
    Half(half::f16),
    Float(f32),
    Double(f64),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::UnsignedInt(a), Value::UnsignedInt(b)) => a == b,
            (Value::NegativeInt(a), Value::NegativeInt(b)) => a == b,
            (Value::ByteString(a), Value::ByteString(b)) => a == b,
            (Value::TextString(a), Value::TextString(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Tagged(t1, a), Value::Tagged(t2, b)) => t1 == t2 && a == b,
            (Value::Simple(a), Value::Simple(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Half(a), Value::Half(b)) => a.to_bits() == b.to_bits(),
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::UnsignedInt(n) | Value::NegativeInt(n) => n.hash(state),
            Value::ByteString(b) => b.hash(state),
            Value::TextString(s) => s.hash(state),
            Value::Array(a) => a.hash(state),
            Value::Map(m) => m.hash(state),
            Value::Tagged(t, v) => {
                t.hash(state);
                v.hash(state)
            }
            Value::Simple(n) => n.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null | Value::Undefined => {}
            Value::Half(f) => f.to_bits().hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Double(f) => f.to_bits().hash(state),
        }
    }
}

/// `n as f64`, but only when the conversion is exact.
pub(crate) fn u64_to_f64_exact(n: u64) -> Option<f64> {
    let f = n as f64;
    // u64::MAX rounds up to 2^64, which saturates back to u64::MAX
    if f < 18446744073709551616.0 && f as u64 == n {
        Some(f)
    } else {
        None
    }
}

impl Value {
    /// A short human readable name for the kind of item, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::UnsignedInt(_) => "unsigned integer",
            Value::NegativeInt(_) => "negative integer",
            Value::ByteString(_) => "byte string",
            Value::TextString(_) => "text string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Tagged(..) => "tagged item",
            Value::Simple(_) => "simple value",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Half(_) => "half-precision float",
            Value::Float(_) => "single-precision float",
            Value::Double(_) => "double-precision float",
        }
    }

    /// Strip any number of tag layers
    pub fn untagged(&self) -> &Value {
        let mut v = self;
        while let Value::Tagged(_, inner) = v {
            v = inner;
        }
        v
    }

    pub fn untagged_mut(&mut self) -> &mut Value {
        match self {
            Value::Tagged(_, inner) => inner.untagged_mut(),
            v => v,
        }
    }

    /// The outermost tag, if any
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Value::Tagged(tag, _) => Some(*tag),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<(Tag, &Value)> {
        match self {
            Value::Tagged(tag, inner) => Some((*tag, inner)),
            _ => None,
        }
    }

    pub fn tagged(tag: Tag, value: Value) -> Self {
        Value::Tagged(tag, Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.untagged(), Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.untagged() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_unsigned_int(&self) -> Option<u64> {
        match self.untagged() {
            Value::UnsignedInt(n) => Some(*n),
            _ => None,
        }
    }

    /// The raw magnitude `n` of a negative integer `-1 - n`
    pub fn as_negative_int(&self) -> Option<u64> {
        match self.untagged() {
            Value::NegativeInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Any CBOR integer, widened so both major types fit
    pub fn as_integer(&self) -> Option<i128> {
        match self.untagged() {
            Value::UnsignedInt(n) => Some(*n as i128),
            Value::NegativeInt(n) => Some(-1 - *n as i128),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.untagged() {
            Value::ByteString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self.untagged() {
            Value::TextString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self.untagged() {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self.untagged_mut() {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self.untagged() {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Vec<(Value, Value)>> {
        match self.untagged_mut() {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_half(&self) -> Option<half::f16> {
        match self.untagged() {
            Value::Half(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self.untagged() {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self.untagged() {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_simple(&self) -> Option<u8> {
        match self.untagged() {
            Value::Simple(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self.untagged(),
            Value::UnsignedInt(_)
                | Value::NegativeInt(_)
                | Value::Half(_)
                | Value::Float(_)
                | Value::Double(_)
        )
    }

    /// Any numeric item as an `f64`.
    ///
    /// Returns `None` for non-numbers and for integers whose magnitude
    /// cannot be held exactly in a double. For `NegativeInt(n)` that
    /// magnitude is `n + 1`.
    pub fn number_value(&self) -> Option<f64> {
        match self.untagged() {
            Value::UnsignedInt(n) => u64_to_f64_exact(*n),
            Value::NegativeInt(n) => match n.checked_add(1) {
                Some(magnitude) => u64_to_f64_exact(magnitude).map(|f| -f),
                None => Some(-18446744073709551616.0),
            },
            Value::Half(f) => Some(f.to_f64()),
            Value::Float(f) => Some(*f as f64),
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Array element at `index`
    pub fn index(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    /// Map value stored under `key`
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    /// Map value stored under a text key
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.as_map()?.iter().find_map(|(k, v)| match k {
            Value::TextString(s) if s == key => Some(v),
            _ => None,
        })
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        self.as_map_mut()?
            .iter_mut()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    /// Replace an existing array element, returning the old one.
    ///
    /// Returns `None` and leaves `self` untouched if this is not an array
    /// or `index` is out of bounds.
    pub fn set_index(&mut self, index: usize, value: Value) -> Option<Value> {
        let slot = self.as_array_mut()?.get_mut(index)?;
        Some(core::mem::replace(slot, value))
    }

    /// Insert or overwrite a map entry, returning the previous value.
    ///
    /// Does nothing if this is not a map.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let map = self.as_map_mut()?;
        if let Some((_, v)) = map.iter_mut().find(|(k, _)| *k == key) {
            Some(core::mem::replace(v, value))
        } else {
            map.push((key, value));
            None
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_uint {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::UnsignedInt(value as u64)
                }
            }
        )*
    };
}

impl_from_uint!(u8, u16, u32, u64, usize);

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    let value = value as i64;
                    if value >= 0 {
                        Value::UnsignedInt(value as u64)
                    } else {
                        Value::NegativeInt(!(value as u64))
                    }
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize);

impl From<half::f16> for Value {
    fn from(value: half::f16) -> Self {
        Value::Half(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::TextString(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::TextString(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::ByteString(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::ByteString(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(value: Vec<(Value, Value)>) -> Self {
        Value::Map(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

fn write_float(f: &mut core::fmt::Formatter<'_>, v: f64) -> core::fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        if v.is_sign_positive() {
            f.write_str("Infinity")
        } else {
            f.write_str("-Infinity")
        }
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

fn write_text(f: &mut core::fmt::Formatter<'_>, s: &str) -> core::fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// CBOR diagnostic notation (RFC 8949, section 8)
impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::UnsignedInt(n) => write!(f, "{n}"),
            Value::NegativeInt(n) => write!(f, "{}", -1 - *n as i128),
            Value::ByteString(b) => write!(f, "h'{}'", hex::encode(b)),
            Value::TextString(s) => write_text(f, s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Tagged(tag, inner) => write!(f, "{tag}({inner})"),
            Value::Simple(n) => write!(f, "simple({n})"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Half(v) => write_float(f, v.to_f64()),
            Value::Float(v) => write_float(f, *v as f64),
            Value::Double(v) => write_float(f, *v),
        }
    }
}
