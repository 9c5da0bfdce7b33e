/*!
The decoding half of the container framework.

A [`Decoder`] walks a borrowed CBOR [`Value`] tree. Containers handed out by
it borrow the decoder mutably, extending the coding path while they are
alive and restoring it when dropped.
*/

use super::*;
use encoder::entry_path_key;

static NULL: Value = Value::Null;

pub trait Decode: Sized {
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, Error>;
}

pub struct Decoder<'v> {
    options: &'v Options,
    path: Vec<Key>,
    value: &'v Value,
}

impl<'v> Decoder<'v> {
    pub(crate) fn new(value: &'v Value, options: &'v Options) -> Self {
        Self {
            options,
            path: Vec::new(),
            value,
        }
    }

    pub fn options(&self) -> &'v Options {
        self.options
    }

    pub fn user_info(&self) -> &'v UserInfo {
        &self.options.user_info
    }

    pub fn coding_path(&self) -> CodingPath {
        CodingPath(self.path.clone())
    }

    pub(crate) fn path(&self) -> &[Key] {
        &self.path
    }

    /// The value being decoded
    pub fn current(&self) -> &'v Value {
        self.value
    }

    /// Decode `value` as a `T`, at the current coding path
    pub fn decode_value<T: Decode>(&mut self, value: &'v Value) -> Result<T, Error> {
        let saved = core::mem::replace(&mut self.value, value);
        let r = T::decode(self);
        self.value = saved;
        r
    }

    /// The error for a current value that is not the `expected` shape
    pub fn type_error(&self, expected: &'static str) -> Error {
        type_error(self.value, expected, &self.path)
    }

    pub fn keyed_container(&mut self) -> Result<KeyedDecoder<'_, 'v>, Error> {
        let pairs = keyed_pairs(self.value, &self.path)?;
        Ok(KeyedDecoder::new(self, pairs, false))
    }

    pub fn unkeyed_container(&mut self) -> Result<UnkeyedDecoder<'_, 'v>, Error> {
        let items = unkeyed_items(self.value, &self.path)?;
        Ok(UnkeyedDecoder::new(self, items, false))
    }

    pub fn scalar_container(&mut self) -> ScalarDecoder<'_, 'v> {
        ScalarDecoder { decoder: self }
    }

    /// Iterate the entries of a map-like collection, with keys taken verbatim.
    pub fn map_container(&mut self) -> Result<MapDecoder<'_, 'v>, Error> {
        let pairs = keyed_pairs(self.value, &self.path)?;
        Ok(MapDecoder {
            decoder: self,
            pairs,
            index: 0,
        })
    }
}

fn type_error(value: &Value, expected: &'static str, path: &[Key]) -> Error {
    match value.untagged() {
        Value::Null => Error::UnexpectedNull {
            expected,
            path: path.into(),
        },
        other => Error::TypeMismatch {
            expected,
            found: other.type_name(),
            path: path.into(),
        },
    }
}

fn keyed_pairs<'v>(value: &'v Value, path: &[Key]) -> Result<&'v [(Value, Value)], Error> {
    value.as_map().ok_or_else(|| type_error(value, "map", path))
}

fn unkeyed_items<'v>(value: &'v Value, path: &[Key]) -> Result<&'v [Value], Error> {
    value.as_array().ok_or_else(|| type_error(value, "array", path))
}

pub struct KeyedDecoder<'d, 'v> {
    decoder: &'d mut Decoder<'v>,
    /// Values by the lookup name of their wire key
    entries: hashbrown::HashMap<String, &'v Value>,
    keys: Vec<Key>,
    pop_path: bool,
}

impl<'d, 'v> KeyedDecoder<'d, 'v> {
    fn new(decoder: &'d mut Decoder<'v>, pairs: &'v [(Value, Value)], pop_path: bool) -> Self {
        let mut entries = hashbrown::HashMap::with_capacity(pairs.len());
        let mut keys = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let (name, key) = match k.untagged() {
                Value::TextString(s) => (
                    s.clone(),
                    Key::Str(decoder.options.key_strategy.field_name(s)),
                ),
                Value::UnsignedInt(_) | Value::NegativeInt(_) => {
                    let key = entry_path_key(k);
                    (key.lookup_name(), key)
                }
                other => {
                    trace!(path = %decoder.coding_path(), "Ignoring {} map key", other.type_name());
                    continue;
                }
            };
            // Text "1" and integer 1 share a lookup name, the first wins
            if let hashbrown::hash_map::Entry::Vacant(e) = entries.entry(name) {
                e.insert(v);
                keys.push(key);
            }
        }
        Self {
            decoder,
            entries,
            keys,
            pop_path,
        }
    }

    pub fn coding_path(&self) -> CodingPath {
        self.decoder.coding_path()
    }

    /// Every decodable key, in data order, converted back through the key
    /// strategy where it has an inverse
    pub fn all_keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.lookup(&key.into()).is_some()
    }

    /// The value under field `key`, found by converting `key` to its wire
    /// form exactly as the encoder would
    fn lookup(&self, key: &Key) -> Option<&'v Value> {
        let wire = self
            .decoder
            .options
            .key_strategy
            .apply(&self.decoder.path, key);
        self.entries.get(&wire.lookup_name()).copied()
    }

    /// Push `key` onto the path and return its value, or fail with the
    /// path left unchanged
    fn enter(&mut self, key: Key) -> Result<&'v Value, Error> {
        match self.lookup(&key) {
            Some(value) => {
                self.decoder.path.push(key);
                Ok(value)
            }
            None => {
                let mut path = self.decoder.coding_path();
                path.0.push(key.clone());
                Err(Error::KeyNotFound { key, path })
            }
        }
    }

    pub fn decode<T: Decode>(&mut self, key: impl Into<Key>) -> Result<T, Error> {
        let value = self.enter(key.into())?;
        let r = self.decoder.decode_value(value);
        self.decoder.path.pop();
        r
    }

    /// `None` if `key` is absent or null
    pub fn decode_if_present<T: Decode>(&mut self, key: impl Into<Key>) -> Result<Option<T>, Error> {
        let key = key.into();
        match self.lookup(&key) {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(_) => self.decode(key).map(Some),
        }
    }

    /// Whether the value under `key` is null
    pub fn decode_nil(&mut self, key: impl Into<Key>) -> Result<bool, Error> {
        let value = self.enter(key.into())?;
        self.decoder.path.pop();
        Ok(value.is_null())
    }

    pub fn nested_keyed(&mut self, key: impl Into<Key>) -> Result<KeyedDecoder<'_, 'v>, Error> {
        let value = self.enter(key.into())?;
        match keyed_pairs(value, &self.decoder.path) {
            Ok(pairs) => Ok(KeyedDecoder::new(self.decoder, pairs, true)),
            Err(e) => {
                self.decoder.path.pop();
                Err(e)
            }
        }
    }

    pub fn nested_unkeyed(&mut self, key: impl Into<Key>) -> Result<UnkeyedDecoder<'_, 'v>, Error> {
        let value = self.enter(key.into())?;
        match unkeyed_items(value, &self.decoder.path) {
            Ok(items) => Ok(UnkeyedDecoder::new(self.decoder, items, true)),
            Err(e) => {
                self.decoder.path.pop();
                Err(e)
            }
        }
    }

    /// A decoder for the base representation stored under `"super"`
    pub fn super_decoder(&mut self) -> ReferencingDecoder<'_, 'v> {
        self.super_decoder_for("super")
    }

    /// A decoder for the value under `key`, or for null if it is absent
    pub fn super_decoder_for(&mut self, key: impl Into<Key>) -> ReferencingDecoder<'_, 'v> {
        let key = key.into();
        let value = self.lookup(&key).unwrap_or(&NULL);
        ReferencingDecoder::new(self.decoder, key, value)
    }
}

impl Drop for KeyedDecoder<'_, '_> {
    fn drop(&mut self) {
        if self.pop_path {
            self.decoder.path.pop();
        }
    }
}

pub struct UnkeyedDecoder<'d, 'v> {
    decoder: &'d mut Decoder<'v>,
    items: &'v [Value],
    index: usize,
    pop_path: bool,
}

impl<'d, 'v> UnkeyedDecoder<'d, 'v> {
    fn new(decoder: &'d mut Decoder<'v>, items: &'v [Value], pop_path: bool) -> Self {
        Self {
            decoder,
            items,
            index: 0,
            pop_path,
        }
    }

    pub fn coding_path(&self) -> CodingPath {
        self.decoder.coding_path()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Push the current index onto the path and return its element.
    /// Does not advance.
    fn enter(&mut self) -> Result<&'v Value, Error> {
        self.decoder.path.push(Key::index(self.index));
        match self.items.get(self.index) {
            Some(value) => Ok(value),
            None => {
                let path = self.decoder.coding_path();
                self.decoder.path.pop();
                Err(Error::UnexpectedEndOfContainer { path })
            }
        }
    }

    /// Decode the next element; the index only advances on success
    pub fn decode_next<T: Decode>(&mut self) -> Result<T, Error> {
        let value = self.enter()?;
        let r = self.decoder.decode_value(value);
        self.decoder.path.pop();
        if r.is_ok() {
            self.index += 1;
        }
        r
    }

    /// If the next element is null, consume it and return `true`
    pub fn decode_nil(&mut self) -> Result<bool, Error> {
        let value = self.enter()?;
        self.decoder.path.pop();
        if value.is_null() {
            self.index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn nested_keyed(&mut self) -> Result<KeyedDecoder<'_, 'v>, Error> {
        let value = self.enter()?;
        match keyed_pairs(value, &self.decoder.path) {
            Ok(pairs) => {
                self.index += 1;
                Ok(KeyedDecoder::new(self.decoder, pairs, true))
            }
            Err(e) => {
                self.decoder.path.pop();
                Err(e)
            }
        }
    }

    pub fn nested_unkeyed(&mut self) -> Result<UnkeyedDecoder<'_, 'v>, Error> {
        let value = self.enter()?;
        match unkeyed_items(value, &self.decoder.path) {
            Ok(items) => {
                self.index += 1;
                Ok(UnkeyedDecoder::new(self.decoder, items, true))
            }
            Err(e) => {
                self.decoder.path.pop();
                Err(e)
            }
        }
    }

    /// A decoder for the next element, which is consumed
    pub fn super_decoder(&mut self) -> Result<ReferencingDecoder<'_, 'v>, Error> {
        let value = self.enter()?;
        self.decoder.path.pop();
        let key = Key::index(self.index);
        self.index += 1;
        Ok(ReferencingDecoder::new(self.decoder, key, value))
    }
}

impl Drop for UnkeyedDecoder<'_, '_> {
    fn drop(&mut self) {
        if self.pop_path {
            self.decoder.path.pop();
        }
    }
}

pub struct ScalarDecoder<'d, 'v> {
    decoder: &'d mut Decoder<'v>,
}

impl<'v> ScalarDecoder<'_, 'v> {
    pub fn coding_path(&self) -> CodingPath {
        self.decoder.coding_path()
    }

    pub fn value(&self) -> &'v Value {
        self.decoder.value
    }

    pub fn decode_nil(&self) -> bool {
        self.decoder.value.is_null()
    }

    /// Decode the same value as another type
    pub fn decode<T: Decode>(&mut self) -> Result<T, Error> {
        let value = self.decoder.value;
        self.decoder.decode_value(value)
    }
}

/// Reads the entries of a map-like collection in data order.
pub struct MapDecoder<'d, 'v> {
    decoder: &'d mut Decoder<'v>,
    pairs: &'v [(Value, Value)],
    index: usize,
}

impl MapDecoder<'_, '_> {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn next_entry<K, V>(&mut self) -> Result<Option<(K, V)>, Error>
    where
        K: MapKey,
        V: Decode,
    {
        let Some((k, v)) = self.pairs.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;

        self.decoder.path.push(entry_path_key(k));
        let r = match K::from_key(k) {
            Some(key) => self.decoder.decode_value(v).map(|value| Some((key, value))),
            None => Err(Error::TypeMismatch {
                expected: core::any::type_name::<K>(),
                found: k.type_name(),
                path: self.decoder.coding_path(),
            }),
        };
        self.decoder.path.pop();
        r
    }

    /// The error for the entry just read converting to the same key as an
    /// earlier one
    pub fn duplicate_entry(&self) -> Error {
        let mut path = self.decoder.coding_path();
        let key = match self.index.checked_sub(1).and_then(|i| self.pairs.get(i)) {
            Some((k, _)) => {
                path.0.push(entry_path_key(k));
                k.to_string()
            }
            None => String::new(),
        };
        Error::DuplicateMapKey { key, path }
    }
}

/// A decoder positioned on a value stored inside a container, restoring the
/// parent's position when dropped.
pub struct ReferencingDecoder<'d, 'v> {
    decoder: &'d mut Decoder<'v>,
    saved: &'v Value,
}

impl<'d, 'v> ReferencingDecoder<'d, 'v> {
    fn new(decoder: &'d mut Decoder<'v>, key: Key, value: &'v Value) -> Self {
        decoder.path.push(key);
        let saved = core::mem::replace(&mut decoder.value, value);
        Self { decoder, saved }
    }
}

impl<'v> core::ops::Deref for ReferencingDecoder<'_, 'v> {
    type Target = Decoder<'v>;

    fn deref(&self) -> &Self::Target {
        self.decoder
    }
}

impl core::ops::DerefMut for ReferencingDecoder<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.decoder
    }
}

impl Drop for ReferencingDecoder<'_, '_> {
    fn drop(&mut self) {
        self.decoder.value = self.saved;
        self.decoder.path.pop();
    }
}
