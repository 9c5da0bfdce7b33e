/*!
The encoding half of the container framework.

An [`Encode`] implementation describes its shape by asking the [`Encoder`]
for exactly one container at its own depth: keyed (a record), unkeyed (a
sequence) or scalar (a single value). The encoder keeps a stack of partially
built containers; nested containers and referencing encoders push onto it
and write their finished value back into the parent when they are dropped.
*/

use super::*;

pub trait Encode {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), Error>;
}

/// A container under construction
#[derive(Debug)]
enum Slot {
    Unopened,
    Keyed(Vec<(Value, Value)>),
    Unkeyed(Vec<Value>),
    Scalar(Option<Value>),
}

impl Slot {
    /// A value that asked for no container, or wrote nothing, becomes an empty map
    fn finalize(self) -> Value {
        match self {
            Slot::Unopened | Slot::Scalar(None) => Value::Map(Vec::new()),
            Slot::Keyed(pairs) => Value::Map(pairs),
            Slot::Unkeyed(items) => Value::Array(items),
            Slot::Scalar(Some(value)) => value,
        }
    }
}

/// Where a finished nested container goes in its parent
#[derive(Debug)]
enum WriteBack {
    Key(Value),
    Index(usize),
}

pub struct Encoder {
    options: Options,
    path: Vec<Key>,
    stack: Vec<Slot>,
}

impl Encoder {
    pub(crate) fn new(options: Options) -> Self {
        Self {
            options,
            path: Vec::new(),
            stack: vec![Slot::Unopened],
        }
    }

    /// Consume the encoder, returning the top-level value
    pub(crate) fn into_value(mut self) -> Value {
        self.stack.pop().map_or(Value::Map(Vec::new()), Slot::finalize)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn user_info(&self) -> &UserInfo {
        &self.options.user_info
    }

    pub fn coding_path(&self) -> CodingPath {
        CodingPath(self.path.clone())
    }

    fn top(&self) -> usize {
        self.stack.len() - 1
    }

    /// Encode `value` in a fresh frame, returning the value it produced.
    pub fn encode_value<T>(&mut self, value: &T) -> Result<Value, Error>
    where
        T: Encode + ?Sized,
    {
        let depth = self.stack.len();
        self.stack.push(Slot::Unopened);
        let r = value.encode(self);
        self.stack.truncate(depth + 1);
        let slot = self.stack.pop();
        r?;
        Ok(slot.map_or(Value::Map(Vec::new()), Slot::finalize))
    }

    /// Request a keyed container for the value being encoded.
    ///
    /// # Panics
    ///
    /// If an unkeyed or scalar container was already requested at this depth.
    pub fn keyed_container(&mut self) -> KeyedEncoder<'_> {
        let index = self.top();
        match &mut self.stack[index] {
            slot @ Slot::Unopened => {
                trace!(path = %CodingPath(self.path.clone()), "Opened keyed container");
                *slot = Slot::Keyed(Vec::new())
            }
            Slot::Keyed(_) => {}
            _ => panic!(
                "Attempt to push new keyed encoding container when already previously encoded at this path"
            ),
        }
        KeyedEncoder {
            encoder: self,
            index,
            write_back: None,
        }
    }

    /// Request an unkeyed container for the value being encoded.
    ///
    /// # Panics
    ///
    /// If a keyed or scalar container was already requested at this depth.
    pub fn unkeyed_container(&mut self) -> UnkeyedEncoder<'_> {
        let index = self.top();
        match &mut self.stack[index] {
            slot @ Slot::Unopened => {
                trace!(path = %CodingPath(self.path.clone()), "Opened unkeyed container");
                *slot = Slot::Unkeyed(Vec::new())
            }
            Slot::Unkeyed(_) => {}
            _ => panic!(
                "Attempt to push new unkeyed encoding container when already previously encoded at this path"
            ),
        }
        UnkeyedEncoder {
            encoder: self,
            index,
            write_back: None,
        }
    }

    /// Request a single value container for the value being encoded.
    ///
    /// # Panics
    ///
    /// If a keyed or unkeyed container was already requested at this depth.
    pub fn scalar_container(&mut self) -> ScalarEncoder<'_> {
        let index = self.top();
        match &mut self.stack[index] {
            slot @ Slot::Unopened => *slot = Slot::Scalar(None),
            Slot::Scalar(_) => {}
            _ => panic!(
                "Attempt to request a single value container when a keyed or unkeyed container was already requested at this path"
            ),
        }
        ScalarEncoder {
            encoder: self,
            index,
        }
    }

    /// Convert a field key to the map key written on the wire
    fn field_key(&self, key: &Key) -> Result<Value, Error> {
        let key = self.options.key_strategy.apply(&self.path, key);
        self.map_key(match key {
            Key::Str(s) => Value::TextString(s),
            Key::Int(n) => Value::from(n),
        })
    }

    /// Apply the map key shape options to an encoded key
    fn map_key(&self, key: Value) -> Result<Value, Error> {
        match key {
            Value::TextString(_) => Ok(key),
            _ if self.options.forbid_non_string_map_keys => Err(Error::NonStringKeyInMap {
                key: key.to_string(),
                path: self.coding_path(),
            }),
            _ if self.options.use_string_keys => Ok(Value::TextString(stringify_key(&key))),
            _ => Ok(key),
        }
    }

    /// Pop a finished nested container and store it in its parent, which
    /// is always the slot directly beneath it
    fn write_back(&mut self, index: usize, write_back: WriteBack) {
        self.stack.truncate(index + 1);
        let value = self.stack.pop().map_or(Value::Map(Vec::new()), Slot::finalize);
        self.path.pop();
        match (write_back, self.stack.last_mut()) {
            (WriteBack::Key(key), Some(Slot::Keyed(pairs))) => insert_pair(pairs, key, value),
            (WriteBack::Index(i), Some(Slot::Unkeyed(items))) => {
                items.insert(i.min(items.len()), value)
            }
            (write_back, _) => panic!("Nested container {write_back:?} has no matching parent"),
        }
    }
}

/// The text form of a non-text map key
pub(crate) fn stringify_key(key: &Value) -> String {
    match key.untagged() {
        Value::TextString(s) => s.clone(),
        Value::UnsignedInt(n) => n.to_string(),
        Value::NegativeInt(n) => (-1 - *n as i128).to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// The coding path step for a map entry
pub(crate) fn entry_path_key(key: &Value) -> Key {
    match key.as_integer().map(i64::try_from) {
        Some(Ok(n)) => Key::Int(n),
        _ => Key::Str(stringify_key(key)),
    }
}

/// Insert or overwrite
fn insert_pair(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    if let Some(pair) = pairs.iter_mut().find(|(k, _)| *k == key) {
        pair.1 = value;
    } else {
        pairs.push((key, value));
    }
}

pub struct KeyedEncoder<'a> {
    encoder: &'a mut Encoder,
    index: usize,
    write_back: Option<WriteBack>,
}

impl KeyedEncoder<'_> {
    fn pairs(&mut self) -> &mut Vec<(Value, Value)> {
        match &mut self.encoder.stack[self.index] {
            Slot::Keyed(pairs) => pairs,
            slot => panic!("Keyed container slot holds {slot:?}"),
        }
    }

    pub fn coding_path(&self) -> CodingPath {
        self.encoder.coding_path()
    }

    pub fn encode<T>(&mut self, key: impl Into<Key>, value: &T) -> Result<(), Error>
    where
        T: Encode + ?Sized,
    {
        let key = key.into();
        let wire_key = self.encoder.field_key(&key)?;
        self.encoder.path.push(key);
        let value = self.encoder.encode_value(value);
        self.encoder.path.pop();
        insert_pair(self.pairs(), wire_key, value?);
        Ok(())
    }

    pub fn encode_nil(&mut self, key: impl Into<Key>) -> Result<(), Error> {
        self.encode(key, &Value::Null)
    }

    /// Encode `value` only if it is `Some`
    pub fn encode_if_present<T>(&mut self, key: impl Into<Key>, value: &Option<T>) -> Result<(), Error>
    where
        T: Encode,
    {
        match value {
            Some(value) => self.encode(key, value),
            None => Ok(()),
        }
    }

    /// Encode an entry of a map-like collection.
    ///
    /// The key is written as given, with no key strategy applied, subject
    /// to the `use_string_keys` and `forbid_non_string_map_keys` options.
    pub fn encode_entry<T>(&mut self, key: Value, value: &T) -> Result<(), Error>
    where
        T: Encode + ?Sized,
    {
        let path_key = entry_path_key(&key);
        let wire_key = self.encoder.map_key(key)?;
        self.encoder.path.push(path_key);
        let r = self.encoder.encode_value(value).and_then(|value| {
            if self.pairs().iter().any(|(k, _)| *k == wire_key) {
                Err(Error::DuplicateMapKey {
                    key: wire_key.to_string(),
                    path: self.encoder.coding_path(),
                })
            } else {
                self.pairs().push((wire_key, value));
                Ok(())
            }
        });
        self.encoder.path.pop();
        r
    }

    pub fn nested_keyed(&mut self, key: impl Into<Key>) -> Result<KeyedEncoder<'_>, Error> {
        let key = key.into();
        let wire_key = self.encoder.field_key(&key)?;
        self.encoder.path.push(key);
        self.encoder.stack.push(Slot::Keyed(Vec::new()));
        Ok(KeyedEncoder {
            index: self.encoder.top(),
            write_back: Some(WriteBack::Key(wire_key)),
            encoder: self.encoder,
        })
    }

    pub fn nested_unkeyed(&mut self, key: impl Into<Key>) -> Result<UnkeyedEncoder<'_>, Error> {
        let key = key.into();
        let wire_key = self.encoder.field_key(&key)?;
        self.encoder.path.push(key);
        self.encoder.stack.push(Slot::Unkeyed(Vec::new()));
        Ok(UnkeyedEncoder {
            index: self.encoder.top(),
            write_back: Some(WriteBack::Key(wire_key)),
            encoder: self.encoder,
        })
    }

    /// An encoder for a base representation, stored under the key `"super"`
    pub fn super_encoder(&mut self) -> Result<ReferencingEncoder<'_>, Error> {
        self.super_encoder_for("super")
    }

    pub fn super_encoder_for(&mut self, key: impl Into<Key>) -> Result<ReferencingEncoder<'_>, Error> {
        let key = key.into();
        let wire_key = self.encoder.field_key(&key)?;
        Ok(ReferencingEncoder::new(self.encoder, key, WriteBack::Key(wire_key)))
    }
}

impl Drop for KeyedEncoder<'_> {
    fn drop(&mut self) {
        if let Some(write_back) = self.write_back.take() {
            self.encoder.write_back(self.index, write_back)
        }
    }
}

pub struct UnkeyedEncoder<'a> {
    encoder: &'a mut Encoder,
    index: usize,
    write_back: Option<WriteBack>,
}

impl UnkeyedEncoder<'_> {
    fn items(&mut self) -> &mut Vec<Value> {
        match &mut self.encoder.stack[self.index] {
            Slot::Unkeyed(items) => items,
            slot => panic!("Unkeyed container slot holds {slot:?}"),
        }
    }

    pub fn coding_path(&self) -> CodingPath {
        self.encoder.coding_path()
    }

    /// The number of elements encoded so far
    pub fn count(&mut self) -> usize {
        self.items().len()
    }

    pub fn append<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Encode + ?Sized,
    {
        let index = self.count();
        self.encoder.path.push(Key::index(index));
        let value = self.encoder.encode_value(value);
        self.encoder.path.pop();
        self.items().push(value?);
        Ok(())
    }

    pub fn append_nil(&mut self) {
        self.items().push(Value::Null)
    }

    fn nested(&mut self, slot: Slot) -> (usize, WriteBack) {
        let index = self.count();
        self.encoder.path.push(Key::index(index));
        self.encoder.stack.push(slot);
        (self.encoder.top(), WriteBack::Index(index))
    }

    pub fn nested_keyed(&mut self) -> KeyedEncoder<'_> {
        let (index, write_back) = self.nested(Slot::Keyed(Vec::new()));
        KeyedEncoder {
            encoder: self.encoder,
            index,
            write_back: Some(write_back),
        }
    }

    pub fn nested_unkeyed(&mut self) -> UnkeyedEncoder<'_> {
        let (index, write_back) = self.nested(Slot::Unkeyed(Vec::new()));
        UnkeyedEncoder {
            encoder: self.encoder,
            index,
            write_back: Some(write_back),
        }
    }

    /// An encoder for a base representation, stored as the next element
    pub fn super_encoder(&mut self) -> ReferencingEncoder<'_> {
        let index = self.count();
        ReferencingEncoder::new(self.encoder, Key::index(index), WriteBack::Index(index))
    }
}

impl Drop for UnkeyedEncoder<'_> {
    fn drop(&mut self) {
        if let Some(write_back) = self.write_back.take() {
            self.encoder.write_back(self.index, write_back)
        }
    }
}

pub struct ScalarEncoder<'a> {
    encoder: &'a mut Encoder,
    index: usize,
}

impl ScalarEncoder<'_> {
    fn set(&mut self, value: Value) {
        match &mut self.encoder.stack[self.index] {
            Slot::Scalar(slot @ None) => *slot = Some(value),
            _ => panic!(
                "Attempt to encode value through single value container when previously value already encoded"
            ),
        }
    }

    pub fn coding_path(&self) -> CodingPath {
        self.encoder.coding_path()
    }

    pub fn options(&self) -> &Options {
        &self.encoder.options
    }

    pub fn encode<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Encode + ?Sized,
    {
        let value = self.encoder.encode_value(value)?;
        self.set(value);
        Ok(())
    }

    pub fn encode_nil(&mut self) {
        self.set(Value::Null)
    }

    /// Store a CBOR value directly
    pub fn encode_cbor(&mut self, value: Value) {
        self.set(value)
    }
}

/// An encoder whose result is written into a reserved slot of its parent
/// container, at most once, when it is finished or dropped.
///
/// Dereferences to an [`Encoder`] with a fresh frame, so the base shape can
/// request its own container. If it requests none the slot holds an empty map.
pub struct ReferencingEncoder<'a> {
    encoder: &'a mut Encoder,
    index: usize,
    write_back: Option<WriteBack>,
}

impl<'a> ReferencingEncoder<'a> {
    fn new(encoder: &'a mut Encoder, key: Key, write_back: WriteBack) -> Self {
        encoder.path.push(key);
        encoder.stack.push(Slot::Unopened);
        Self {
            index: encoder.top(),
            encoder,
            write_back: Some(write_back),
        }
    }

    /// Write the encoded value back into the parent container now
    pub fn finish(mut self) {
        self.complete()
    }

    fn complete(&mut self) {
        if let Some(write_back) = self.write_back.take() {
            trace!(path = %self.encoder.coding_path(), "Referencing encoder writing back");
            self.encoder.write_back(self.index, write_back)
        }
    }
}

impl core::ops::Deref for ReferencingEncoder<'_> {
    type Target = Encoder;

    fn deref(&self) -> &Self::Target {
        self.encoder
    }
}

impl core::ops::DerefMut for ReferencingEncoder<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.encoder
    }
}

impl Drop for ReferencingEncoder<'_> {
    fn drop(&mut self) {
        self.complete()
    }
}
