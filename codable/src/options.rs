use super::*;
use std::any::Any;
use std::sync::Arc;

/// Signature of a custom key strategy: given the coding path ending in the
/// key being converted, return the replacement key.
pub type KeyFn = dyn Fn(&[Key]) -> Key + Send + Sync;

/// How field keys are transformed when they cross between Rust and CBOR.
///
/// A field key is converted the same way whether it is being written or
/// looked up, so any key that encodes also decodes. Strategies only ever
/// apply to string keys of keyed containers. Integer keys, and the keys of
/// map-like collections, are used unchanged.
#[derive(Clone, Default)]
pub enum KeyStrategy {
    /// Keys are used verbatim
    #[default]
    Default,
    /// `camelCase` field keys become `snake_case` on the wire
    SnakeCase,
    /// `snake_case` field keys become `camelCase` on the wire
    CamelCase,
    /// The function is called with the field's full coding path, ending in
    /// the field key, and returns the wire key.
    Custom(Arc<KeyFn>),
}

impl KeyStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[Key]) -> Key + Send + Sync + 'static,
    {
        KeyStrategy::Custom(Arc::new(f))
    }

    /// The wire key for field `key` of the container at `path`
    pub(crate) fn apply(&self, path: &[Key], key: &Key) -> Key {
        let Key::Str(s) = key else {
            return key.clone();
        };
        match self {
            KeyStrategy::Default => key.clone(),
            KeyStrategy::SnakeCase => Key::Str(to_snake_case(s)),
            KeyStrategy::CamelCase => Key::Str(to_camel_case(s)),
            KeyStrategy::Custom(f) => {
                let mut path = path.to_vec();
                path.push(key.clone());
                f(&path)
            }
        }
    }

    /// A best guess at the field key behind wire key `key`, for listing keys.
    /// Custom strategies have no inverse, so report the wire key.
    pub(crate) fn field_name(&self, key: &str) -> String {
        match self {
            KeyStrategy::SnakeCase => to_camel_case(key),
            KeyStrategy::CamelCase => to_snake_case(key),
            KeyStrategy::Default | KeyStrategy::Custom(_) => key.into(),
        }
    }
}

impl core::fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyStrategy::Default => f.write_str("Default"),
            KeyStrategy::SnakeCase => f.write_str("SnakeCase"),
            KeyStrategy::CamelCase => f.write_str("CamelCase"),
            KeyStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How dates are wrapped on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DateStrategy {
    /// Tag 1 around a numeric timestamp, or tag 0 around RFC 3339 text
    #[default]
    EpochTimestampTag,
    /// A `{"__type": .., "__value": ..}` map
    AnnotatedMap,
}

/// The payload used for encoded dates. Decoding accepts any of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DateEncodingStrategy {
    #[default]
    SecondsSince1970,
    /// Truncated to whole milliseconds
    MillisecondsSince1970,
    /// RFC 3339 text
    Iso8601,
}

/// Caller supplied context, readable from any [`Encoder`] or [`Decoder`].
#[derive(Clone, Default)]
pub struct UserInfo(hashbrown::HashMap<String, Arc<dyn Any + Send + Sync>>);

impl UserInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.0.insert(key.into(), Arc::new(value));
    }

    /// The value stored under `key`, if present and of type `T`
    pub fn get<T>(&self, key: &str) -> Option<&T>
    where
        T: Any,
    {
        self.0.get(key)?.downcast_ref()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

impl core::fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Write every map key as a text string, stringifying other key types
    pub use_string_keys: bool,
    /// Fail with [`Error::NonStringKeyInMap`] rather than write a non-text map key.
    /// Takes precedence over `use_string_keys`.
    pub forbid_non_string_map_keys: bool,
    pub key_strategy: KeyStrategy,
    pub date_strategy: DateStrategy,
    /// Only used when encoding
    pub date_encoding: DateEncodingStrategy,
    pub user_info: UserInfo,
}
