use super::*;
use io::{ByteSource, SliceSource};
use thiserror::Error;

/// Default limit on nested arrays, maps, tags and indefinite strings
pub const DEFAULT_MAX_RECURSION: usize = 512;

#[derive(Error, Debug)]
pub enum Error {
    /// The input ended in the middle of a data item
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    /// The initial byte does not describe a well-formed data item
    #[error("Invalid item type {0:#04x}")]
    InvalidItemType(u8),

    /// An indefinite-length string contains something other than a definite-length chunk of the same type
    #[error("Invalid chunk in indefinite-length string")]
    InvalidIndefiniteElement,

    /// A break stop code appeared where a data item is required
    #[error("Unexpected break")]
    InvalidBreak,

    /// A length or count too large for this platform
    #[error("Sequence length {0} is too long")]
    SequenceTooLong(u64),

    /// A text string is not valid UTF-8
    #[error("Invalid UTF-8 text string")]
    InvalidUTF8String,

    /// A map has two structurally identical keys
    #[error("Map contains duplicate keys")]
    DuplicateMapKey,

    /// The two byte simple value form carries a value below 32
    #[error("Invalid two byte simple value {0}")]
    InvalidSimpleValue(u8),

    #[error("Maximum recursion depth of {0} exceeded")]
    MaxRecursion(usize),

    /// Trailing bytes after a complete data item
    #[error("Additional items after the end of the data item")]
    AdditionalItems,

    /// An [`embedded_io`] reader failed for a reason other than end of input
    #[error("Read failed: {0:?}")]
    Read(embedded_io::ErrorKind),

    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(std::io::Error),
}

/// Decodes CBOR data items from a [`ByteSource`].
pub struct StreamDecoder<S> {
    source: S,
    depth: usize,
    max_recursion: usize,
}

impl<S> StreamDecoder<S>
where
    S: ByteSource,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            depth: 0,
            max_recursion: DEFAULT_MAX_RECURSION,
        }
    }

    pub fn with_max_recursion(mut self, max_recursion: usize) -> Self {
        self.max_recursion = max_recursion;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn nested<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Self) -> Result<T, Error>,
    {
        if self.depth >= self.max_recursion {
            return Err(Error::MaxRecursion(self.max_recursion));
        }
        self.depth += 1;
        let r = f(self);
        self.depth -= 1;
        r
    }

    /// Read the argument selected by the additional information in `initial`
    fn read_argument(&mut self, initial: u8) -> Result<u64, Error> {
        match initial & 0x1F {
            minor @ 0..24 => Ok(minor as u64),
            24 => Ok(self.source.read_int::<u8>()? as u64),
            25 => Ok(self.source.read_int::<u16>()? as u64),
            26 => Ok(self.source.read_int::<u32>()? as u64),
            27 => self.source.read_int::<u64>(),
            _ => Err(Error::InvalidItemType(initial)),
        }
    }

    /// `None` means indefinite length
    fn read_length(&mut self, initial: u8) -> Result<Option<usize>, Error> {
        if initial & 0x1F == 31 {
            return Ok(None);
        }
        let n = self.read_argument(initial)?;
        if n > isize::MAX as u64 {
            return Err(Error::SequenceTooLong(n));
        }
        usize::try_from(n)
            .map(Some)
            .map_err(|_| Error::SequenceTooLong(n))
    }

    fn read_text(&mut self, len: usize) -> Result<String, Error> {
        String::from_utf8(self.source.read_bytes(len)?).map_err(|_| Error::InvalidUTF8String)
    }

    /// Concatenate the chunks of an indefinite-length string of major type `major`
    fn read_chunks<F>(&mut self, major: u8, mut f: F) -> Result<(), Error>
    where
        F: FnMut(&mut Self, usize) -> Result<(), Error>,
    {
        self.nested(|d| {
            loop {
                let initial = d.source.read_byte()?;
                if initial == 0xFF {
                    return Ok(());
                }
                if initial >> 5 != major || initial & 0x1F == 31 {
                    return Err(Error::InvalidIndefiniteElement);
                }
                match d.read_length(initial)? {
                    Some(len) => f(d, len)?,
                    None => return Err(Error::InvalidIndefiniteElement),
                }
            }
        })
    }

    /// Decode one data item, returning `None` for a break stop code.
    pub fn decode_item(&mut self) -> Result<Option<Value>, Error> {
        let initial = self.source.read_byte()?;
        let value = match initial {
            0x00..=0x1B => Value::UnsignedInt(self.read_argument(initial)?),
            0x20..=0x3B => Value::NegativeInt(self.read_argument(initial)?),
            0x40..=0x5B | 0x5F => match self.read_length(initial)? {
                Some(len) => Value::ByteString(self.source.read_bytes(len)?),
                None => {
                    let mut bytes = Vec::new();
                    self.read_chunks(2, |d, len| {
                        bytes.extend(d.source.read_bytes(len)?);
                        Ok(())
                    })?;
                    Value::ByteString(bytes)
                }
            },
            0x60..=0x7B | 0x7F => match self.read_length(initial)? {
                Some(len) => Value::TextString(self.read_text(len)?),
                None => {
                    let mut text = String::new();
                    self.read_chunks(3, |d, len| {
                        // Each chunk must be valid UTF-8 on its own
                        text.push_str(&d.read_text(len)?);
                        Ok(())
                    })?;
                    Value::TextString(text)
                }
            },
            0x80..=0x9B | 0x9F => {
                let len = self.read_length(initial)?;
                self.nested(|d| match len {
                    Some(len) => d.decode_items(len),
                    None => d.decode_items_until_break(),
                })
                .map(Value::Array)?
            }
            0xA0..=0xBB | 0xBF => {
                let len = self.read_length(initial)?;
                self.nested(|d| match len {
                    Some(len) => d.decode_pairs(len),
                    None => d.decode_pairs_until_break(),
                })
                .map(Value::Map)?
            }
            0xC0..=0xDB => {
                let tag = Tag(self.read_argument(initial)?);
                let item = self.nested(|d| d.decode_required_item())?;
                Value::Tagged(tag, Box::new(item))
            }
            0xE0..=0xF3 => Value::Simple(initial & 0x1F),
            0xF4 => Value::Bool(false),
            0xF5 => Value::Bool(true),
            0xF6 => Value::Null,
            0xF7 => Value::Undefined,
            0xF8 => match self.source.read_byte()? {
                n @ 0..32 => return Err(Error::InvalidSimpleValue(n)),
                n => Value::Simple(n),
            },
            0xF9 => Value::Half(half::f16::from_bits(self.source.read_int::<u16>()?)),
            0xFA => Value::Float(f32::from_bits(self.source.read_int::<u32>()?)),
            0xFB => Value::Double(f64::from_bits(self.source.read_int::<u64>()?)),
            0xFF => return Ok(None),
            _ => return Err(Error::InvalidItemType(initial)),
        };
        Ok(Some(value))
    }

    /// Decode one data item, treating a break stop code as an error.
    pub fn decode_required_item(&mut self) -> Result<Value, Error> {
        self.decode_item()?.ok_or(Error::InvalidBreak)
    }

    pub fn decode_items(&mut self, count: usize) -> Result<Vec<Value>, Error> {
        // Counts come off the wire, so cap the preallocation
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(self.decode_required_item()?);
        }
        Ok(items)
    }

    pub fn decode_items_until_break(&mut self) -> Result<Vec<Value>, Error> {
        let mut items = Vec::new();
        while let Some(item) = self.decode_item()? {
            items.push(item);
        }
        Ok(items)
    }

    pub fn decode_pairs(&mut self, count: usize) -> Result<Vec<(Value, Value)>, Error> {
        let mut pairs = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let key = self.decode_required_item()?;
            let value = self.decode_required_item()?;
            pairs.push((key, value));
        }
        check_unique_keys(&pairs)?;
        Ok(pairs)
    }

    /// Decode map entries until a break appears in a key position.
    pub fn decode_pairs_until_break(&mut self) -> Result<Vec<(Value, Value)>, Error> {
        let mut pairs = Vec::new();
        while let Some(key) = self.decode_item()? {
            let value = self.decode_required_item()?;
            pairs.push((key, value));
        }
        check_unique_keys(&pairs)?;
        Ok(pairs)
    }
}

fn check_unique_keys(pairs: &[(Value, Value)]) -> Result<(), Error> {
    let mut keys = hashbrown::HashSet::with_capacity(pairs.len());
    for (k, _) in pairs {
        if !keys.insert(k) {
            return Err(Error::DuplicateMapKey);
        }
    }
    Ok(())
}

/// Decode exactly one data item occupying all of `data`.
pub fn decode(data: &[u8]) -> Result<Value, Error> {
    let (value, len) = decode_prefix(data)?;
    if len != data.len() {
        return Err(Error::AdditionalItems);
    }
    Ok(value)
}

/// Decode the first data item in `data`, returning it with the number of bytes consumed.
pub fn decode_prefix(data: &[u8]) -> Result<(Value, usize), Error> {
    let mut decoder = StreamDecoder::new(SliceSource::new(data));
    let value = decoder.decode_required_item()?;
    Ok((value, decoder.source().offset()))
}

/// Decode an RFC 8742 CBOR sequence: zero or more concatenated data items.
pub fn decode_sequence(data: &[u8]) -> Result<Vec<Value>, Error> {
    let mut decoder = StreamDecoder::new(SliceSource::new(data));
    let mut items = Vec::new();
    while !decoder.source().is_empty() {
        items.push(decoder.decode_required_item()?);
    }
    Ok(items)
}
