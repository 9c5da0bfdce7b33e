use super::*;
use std::collections::{BTreeMap, HashMap};

/// A byte sequence coded as a CBOR byte string, rather than as an array of
/// integers like `Vec<u8>`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ByteBuf(pub Vec<u8>);

impl From<Vec<u8>> for ByteBuf {
    fn from(value: Vec<u8>) -> Self {
        ByteBuf(value)
    }
}

impl From<ByteBuf> for Vec<u8> {
    fn from(value: ByteBuf) -> Self {
        value.0
    }
}

impl core::ops::Deref for ByteBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Encode for ByteBuf {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder
            .scalar_container()
            .encode_cbor(Value::ByteString(self.0.clone()));
        Ok(())
    }
}

impl Decode for ByteBuf {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        decoder
            .current()
            .as_bytes()
            .map(|b| ByteBuf(b.to_vec()))
            .ok_or_else(|| decoder.type_error("byte string"))
    }
}

/// A type usable as the key of a map-like collection.
///
/// Keys are written as CBOR values directly, so no key strategy applies.
pub trait MapKey: Sized {
    fn to_key(&self) -> Value;

    fn from_key(key: &Value) -> Option<Self>;
}

impl MapKey for String {
    fn to_key(&self) -> Value {
        Value::TextString(self.clone())
    }

    /// Integer keys are accepted in their decimal form
    fn from_key(key: &Value) -> Option<Self> {
        match key.untagged() {
            Value::TextString(s) => Some(s.clone()),
            Value::UnsignedInt(n) => Some(n.to_string()),
            Value::NegativeInt(n) => Some((-1 - *n as i128).to_string()),
            _ => None,
        }
    }
}

impl MapKey for bool {
    fn to_key(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_key(key: &Value) -> Option<Self> {
        match key.untagged() {
            Value::Bool(b) => Some(*b),
            Value::TextString(s) => s.parse().ok(),
            _ => None,
        }
    }
}

macro_rules! impl_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.scalar_container().encode_cbor(Value::from(*self));
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
                    coerce::unbox_number(decoder.current(), decoder.path())
                }
            }

            /// Text keys holding a decimal integer are accepted, so keys
            /// stringified by `use_string_keys` read back
            impl MapKey for $ty {
                fn to_key(&self) -> Value {
                    Value::from(*self)
                }

                fn from_key(key: &Value) -> Option<Self> {
                    match key.untagged() {
                        Value::TextString(s) => s.parse().ok(),
                        k => k.as_integer().and_then(|n| <$ty>::try_from(n).ok()),
                    }
                }
            }
        )*
    };
}

impl_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Encode for i128 {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let value = coerce::box_i128(*self, "i128", &encoder.coding_path())?;
        encoder.scalar_container().encode_cbor(value);
        Ok(())
    }
}

impl Decode for i128 {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        coerce::unbox_number(decoder.current(), decoder.path())
    }
}

impl Encode for u128 {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let value = u64::try_from(*self).map_err(|_| Error::Overflow {
            value: self.to_string(),
            target: "u128",
            path: encoder.coding_path(),
        })?;
        encoder.scalar_container().encode_cbor(Value::UnsignedInt(value));
        Ok(())
    }
}

impl Decode for u128 {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        coerce::unbox_number(decoder.current(), decoder.path())
    }
}

macro_rules! impl_float {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.scalar_container().encode_cbor(Value::from(*self));
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
                    coerce::unbox_number(decoder.current(), decoder.path())
                }
            }
        )*
    };
}

impl_float!(half::f16, f32, f64);

impl Encode for bool {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.scalar_container().encode_cbor(Value::Bool(*self));
        Ok(())
    }
}

impl Decode for bool {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        decoder
            .current()
            .as_bool()
            .ok_or_else(|| decoder.type_error("bool"))
    }
}

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder
            .scalar_container()
            .encode_cbor(Value::TextString(self.into()));
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        self.as_str().encode(encoder)
    }
}

impl Decode for String {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        decoder
            .current()
            .as_text()
            .map(Into::into)
            .ok_or_else(|| decoder.type_error("text string"))
    }
}

impl Encode for char {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder
            .scalar_container()
            .encode_cbor(Value::TextString(self.to_string()));
        Ok(())
    }
}

impl Decode for char {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let s = decoder
            .current()
            .as_text()
            .ok_or_else(|| decoder.type_error("char"))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::custom(
                decoder.path(),
                format!("Expected a single character, found {s:?}"),
            )),
        }
    }
}

impl Encode for Value {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.scalar_container().encode_cbor(self.clone());
        Ok(())
    }
}

impl Decode for Value {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        Ok(decoder.current().clone())
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        (**self).encode(encoder)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        (**self).encode(encoder)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        T::decode(decoder).map(Box::new)
    }
}

/// `None` is coded as null
impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        match self {
            Some(value) => value.encode(encoder),
            None => {
                encoder.scalar_container().encode_nil();
                Ok(())
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        if decoder.current().is_null() {
            Ok(None)
        } else {
            T::decode(decoder).map(Some)
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        let mut seq = encoder.unkeyed_container();
        for item in self {
            seq.append(item)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        self.as_slice().encode(encoder)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut seq = decoder.unkeyed_container()?;
        let mut v = Vec::with_capacity(seq.count());
        while !seq.is_at_end() {
            v.push(seq.decode_next()?);
        }
        Ok(v)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        self.as_slice().encode(encoder)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let v = Vec::<T>::decode(decoder)?;
        let len = v.len();
        v.try_into().map_err(|_| {
            Error::custom(
                decoder.path(),
                format!("Expected an array of {N} elements, found {len}"),
            )
        })
    }
}

macro_rules! impl_tuple {
    ($len:literal: $($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
                let ($($name,)+) = self;
                let mut seq = encoder.unkeyed_container();
                $(seq.append($name)?;)+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
                let mut seq = decoder.unkeyed_container()?;
                if seq.count() != $len {
                    return Err(Error::custom(
                        seq.coding_path(),
                        format!("Expected a tuple of {} elements, found {}", $len, seq.count()),
                    ));
                }
                Ok(($(seq.decode_next::<$name>()?,)+))
            }
        }
    };
}

impl_tuple!(1: A);
impl_tuple!(2: A, B);
impl_tuple!(3: A, B, C);
impl_tuple!(4: A, B, C, D);

fn encode_map<'a, K, V>(
    encoder: &mut Encoder,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Result<(), Error>
where
    K: MapKey + 'a,
    V: Encode + 'a,
{
    let mut map = encoder.keyed_container();
    for (k, v) in entries {
        map.encode_entry(k.to_key(), v)?;
    }
    Ok(())
}

/// Feed every entry to `insert`, which returns `false` if the key was
/// already present
fn decode_map<K, V>(
    decoder: &mut Decoder<'_>,
    mut insert: impl FnMut(K, V) -> bool,
) -> Result<(), Error>
where
    K: MapKey,
    V: Decode,
{
    let mut entries = decoder.map_container()?;
    while let Some((k, v)) = entries.next_entry()? {
        // Distinct CBOR keys such as 1 and "1" can convert to the same `K`
        if !insert(k, v) {
            return Err(entries.duplicate_entry());
        }
    }
    Ok(())
}

fn map_len(decoder: &Decoder<'_>) -> usize {
    decoder.current().as_map().map_or(0, <[_]>::len)
}

impl<K, V, S> Encode for HashMap<K, V, S>
where
    K: MapKey,
    V: Encode,
{
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encode_map(encoder, self.iter())
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: MapKey + Eq + core::hash::Hash,
    V: Decode,
    S: core::hash::BuildHasher + Default,
{
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut map =
            HashMap::<K, V, S>::with_capacity_and_hasher(map_len(decoder), S::default());
        decode_map(decoder, |k, v| map.insert(k, v).is_none())?;
        Ok(map)
    }
}

impl<K, V> Encode for BTreeMap<K, V>
where
    K: MapKey,
    V: Encode,
{
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encode_map(encoder, self.iter())
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Decode,
{
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut map = BTreeMap::new();
        decode_map(decoder, |k: K, v: V| map.insert(k, v).is_none())?;
        Ok(map)
    }
}

impl<K, V, S> Encode for hashbrown::HashMap<K, V, S>
where
    K: MapKey,
    V: Encode,
{
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encode_map(encoder, self.iter())
    }
}

impl<K, V, S> Decode for hashbrown::HashMap<K, V, S>
where
    K: MapKey + Eq + core::hash::Hash,
    V: Decode,
    S: core::hash::BuildHasher + Default,
{
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error> {
        let mut map =
            hashbrown::HashMap::<K, V, S>::with_capacity_and_hasher(map_len(decoder), S::default());
        decode_map(decoder, |k, v| map.insert(k, v).is_none())?;
        Ok(map)
    }
}
