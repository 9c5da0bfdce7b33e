/*!
Errors raised while converting between Rust types and CBOR values.

Every structural error records the [`CodingPath`] at which it occurred, so
a failure deep inside a nested type can be located.
*/

use super::*;
use thiserror::Error;

/// One step of a [`CodingPath`]: a field name or an integer key/index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(String),
    Int(i64),
}

impl Key {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Str(_) => None,
            Key::Int(n) => Some(*n),
        }
    }

    /// The string used to look the key up in a decoded map
    pub(crate) fn lookup_name(&self) -> String {
        match self {
            Key::Str(s) => s.clone(),
            Key::Int(n) => n.to_string(),
        }
    }

    /// The key under which an array element is coded
    pub(crate) fn index(index: usize) -> Self {
        Key::Int(index as i64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Key::Str(value.clone())
    }
}

macro_rules! impl_int_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::Int(value as i64)
                }
            }
        )*
    };
}

impl_int_key!(i8, i16, i32, i64, u8, u16, u32);

impl core::fmt::Display for Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s:?}"),
            Key::Int(n) => write!(f, "{n}"),
        }
    }
}

/// The sequence of keys leading from the top-level value to the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingPath(pub Vec<Key>);

impl CodingPath {
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::ops::Deref for CodingPath {
    type Target = [Key];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&[Key]> for CodingPath {
    fn from(value: &[Key]) -> Self {
        CodingPath(value.to_vec())
    }
}

/// Renders as e.g. `items[2].name`, or `<root>` for the top level
impl core::fmt::Display for CodingPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, key) in self.0.iter().enumerate() {
            match key {
                Key::Str(s) if i == 0 => f.write_str(s)?,
                Key::Str(s) => write!(f, ".{s}")?,
                Key::Int(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// A keyed container has no entry for a required key.
    ///
    /// `path` ends with the missing key.
    #[error("No value associated with key {key} at {path}")]
    KeyNotFound { key: Key, path: CodingPath },

    /// A non-optional value was null.
    #[error("Expected {expected} but found null at {path}")]
    UnexpectedNull {
        expected: &'static str,
        path: CodingPath,
    },

    /// The CBOR item has a different shape than the type being decoded.
    #[error("Expected {expected} but found {found} at {path}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        path: CodingPath,
    },

    /// A number cannot be represented exactly in the target type.
    #[error("{value} overflows {target} at {path}")]
    Overflow {
        value: String,
        target: &'static str,
        path: CodingPath,
    },

    /// A map key is not a text string, and non-string keys are forbidden.
    #[error("Map key {key} is not a text string at {path}")]
    NonStringKeyInMap { key: String, path: CodingPath },

    /// Two entries of one map were encoded under the same key.
    #[error("Map contains duplicate key {key} at {path}")]
    DuplicateMapKey { key: String, path: CodingPath },

    /// An unkeyed container was read past its last element.
    #[error("Unkeyed container is at end at {path}")]
    UnexpectedEndOfContainer { path: CodingPath },

    /// The value is well-formed CBOR of the right shape, but its content is invalid.
    #[error("{message} at {path}")]
    DataCorrupted { message: String, path: CodingPath },

    #[error(transparent)]
    InvalidCbor(#[from] cbor::decode::Error),
}

impl Error {
    /// An error raised by a hand-written [`Encode`] or [`Decode`] implementation
    pub fn custom(path: impl Into<CodingPath>, message: impl core::fmt::Display) -> Self {
        Error::DataCorrupted {
            message: message.to_string(),
            path: path.into(),
        }
    }

    /// Where the error occurred, unless it came from the byte level
    pub fn path(&self) -> Option<&CodingPath> {
        match self {
            Error::KeyNotFound { path, .. }
            | Error::UnexpectedNull { path, .. }
            | Error::TypeMismatch { path, .. }
            | Error::Overflow { path, .. }
            | Error::NonStringKeyInMap { path, .. }
            | Error::DuplicateMapKey { path, .. }
            | Error::UnexpectedEndOfContainer { path }
            | Error::DataCorrupted { path, .. } => Some(path),
            Error::InvalidCbor(_) => None,
        }
    }
}
