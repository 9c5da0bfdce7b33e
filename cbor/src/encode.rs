use super::*;
use io::ByteSink;

/// The kinds of item that may be written with an indefinite length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndefiniteKind {
    ByteString,
    TextString,
    Array,
    Map,
}

impl IndefiniteKind {
    fn major(self) -> u8 {
        match self {
            IndefiniteKind::ByteString => 2,
            IndefiniteKind::TextString => 3,
            IndefiniteKind::Array => 4,
            IndefiniteKind::Map => 5,
        }
    }
}

/// Writes CBOR data items to a [`ByteSink`].
///
/// Integers, lengths and tags always use the smallest encoding that fits.
/// Collections built from a [`Value`] are written with definite lengths;
/// indefinite lengths are only produced by the streaming methods.
pub struct StreamEncoder<S> {
    sink: S,
}

impl<S> StreamEncoder<S>
where
    S: ByteSink,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn emit_uint_minor(&mut self, major: u8, val: u64) -> Result<(), S::Error> {
        if val < 24 {
            self.sink.write_byte((major << 5) | (val as u8))
        } else if val <= u8::MAX as u64 {
            self.sink.write_byte((major << 5) | 24)?;
            self.sink.write_int(val as u8)
        } else if val <= u16::MAX as u64 {
            self.sink.write_byte((major << 5) | 25)?;
            self.sink.write_int(val as u16)
        } else if val <= u32::MAX as u64 {
            self.sink.write_byte((major << 5) | 26)?;
            self.sink.write_int(val as u32)
        } else {
            self.sink.write_byte((major << 5) | 27)?;
            self.sink.write_int(val)
        }
    }

    pub fn encode(&mut self, value: &Value) -> Result<(), S::Error> {
        match value {
            Value::UnsignedInt(n) => self.encode_uint(*n),
            Value::NegativeInt(n) => self.encode_negative_int(*n),
            Value::ByteString(b) => self.encode_bytes(b),
            Value::TextString(s) => self.encode_text(s),
            Value::Array(items) => {
                self.encode_array_header(items.len())?;
                self.encode_array_chunk(items)
            }
            Value::Map(pairs) => {
                self.encode_map_header(pairs.len())?;
                self.encode_map_chunk(pairs)
            }
            Value::Tagged(tag, inner) => {
                self.encode_tag(*tag)?;
                self.encode(inner)
            }
            Value::Simple(n) => self.encode_simple(*n),
            Value::Bool(b) => self.encode_bool(*b),
            Value::Null => self.encode_null(),
            Value::Undefined => self.encode_undefined(),
            Value::Half(f) => self.encode_half(*f),
            Value::Float(f) => self.encode_float(*f),
            Value::Double(f) => self.encode_double(*f),
        }
    }

    pub fn encode_uint(&mut self, n: u64) -> Result<(), S::Error> {
        self.emit_uint_minor(0, n)
    }

    /// Encode the integer `-1 - n`
    pub fn encode_negative_int(&mut self, n: u64) -> Result<(), S::Error> {
        self.emit_uint_minor(1, n)
    }

    pub fn encode_i64(&mut self, n: i64) -> Result<(), S::Error> {
        if n >= 0 {
            self.emit_uint_minor(0, n as u64)
        } else {
            self.emit_uint_minor(1, !(n as u64))
        }
    }

    pub fn encode_bytes(&mut self, bytes: &[u8]) -> Result<(), S::Error> {
        self.emit_uint_minor(2, bytes.len() as u64)?;
        self.sink.write_bytes(bytes)
    }

    pub fn encode_text(&mut self, text: &str) -> Result<(), S::Error> {
        self.emit_uint_minor(3, text.len() as u64)?;
        self.sink.write_bytes(text.as_bytes())
    }

    /// Write the header of a definite-length array; exactly `len` items must follow.
    pub fn encode_array_header(&mut self, len: usize) -> Result<(), S::Error> {
        self.emit_uint_minor(4, len as u64)
    }

    /// Write the header of a definite-length map; exactly `len` key/value pairs must follow.
    pub fn encode_map_header(&mut self, len: usize) -> Result<(), S::Error> {
        self.emit_uint_minor(5, len as u64)
    }

    /// Write a tag; exactly one data item must follow.
    pub fn encode_tag(&mut self, tag: Tag) -> Result<(), S::Error> {
        self.emit_uint_minor(6, tag.0)
    }

    /// Simple values 20 to 31 are reserved for `false`, `true`, `null`,
    /// `undefined`, floats and the break code, and cannot be written here.
    pub fn encode_simple(&mut self, n: u8) -> Result<(), S::Error> {
        match n {
            0..20 => self.sink.write_byte(0xE0 | n),
            20..32 => panic!("Invalid simple value {n}, use bool, null, undefined or a float"),
            _ => {
                self.sink.write_byte(0xF8)?;
                self.sink.write_byte(n)
            }
        }
    }

    pub fn encode_bool(&mut self, b: bool) -> Result<(), S::Error> {
        self.sink.write_byte(if b { 0xF5 } else { 0xF4 })
    }

    pub fn encode_null(&mut self) -> Result<(), S::Error> {
        self.sink.write_byte(0xF6)
    }

    pub fn encode_undefined(&mut self) -> Result<(), S::Error> {
        self.sink.write_byte(0xF7)
    }

    pub fn encode_half(&mut self, f: half::f16) -> Result<(), S::Error> {
        self.sink.write_byte(0xF9)?;
        self.sink.write_int(f.to_bits())
    }

    pub fn encode_float(&mut self, f: f32) -> Result<(), S::Error> {
        self.sink.write_byte(0xFA)?;
        self.sink.write_int(f.to_bits())
    }

    pub fn encode_double(&mut self, f: f64) -> Result<(), S::Error> {
        self.sink.write_byte(0xFB)?;
        self.sink.write_int(f.to_bits())
    }

    /// Open an indefinite-length item; close it with [`end_indefinite`](Self::end_indefinite).
    pub fn start_indefinite(&mut self, kind: IndefiniteKind) -> Result<(), S::Error> {
        self.sink.write_byte((kind.major() << 5) | 31)
    }

    pub fn end_indefinite(&mut self) -> Result<(), S::Error> {
        self.sink.write_byte(0xFF)
    }

    /// Write a run of array elements, without any header
    pub fn encode_array_chunk(&mut self, items: &[Value]) -> Result<(), S::Error> {
        for item in items {
            self.encode(item)?;
        }
        Ok(())
    }

    /// Write a run of map entries, without any header
    pub fn encode_map_chunk(&mut self, pairs: &[(Value, Value)]) -> Result<(), S::Error> {
        for (k, v) in pairs {
            self.encode(k)?;
            self.encode(v)?;
        }
        Ok(())
    }

    /// Write an indefinite-length array whose elements are written by `f`.
    pub fn encode_indefinite_array<F>(&mut self, f: F) -> Result<(), S::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), S::Error>,
    {
        self.start_indefinite(IndefiniteKind::Array)?;
        f(self)?;
        self.end_indefinite()
    }

    /// Write an indefinite-length map whose entries are written by `f`.
    ///
    /// `f` must write an even number of items.
    pub fn encode_indefinite_map<F>(&mut self, f: F) -> Result<(), S::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), S::Error>,
    {
        self.start_indefinite(IndefiniteKind::Map)?;
        f(self)?;
        self.end_indefinite()
    }

    pub fn encode_byte_stream<F>(&mut self, f: F) -> Result<(), S::Error>
    where
        F: FnOnce(&mut ByteStream<S>) -> Result<(), S::Error>,
    {
        self.start_indefinite(IndefiniteKind::ByteString)?;
        f(&mut ByteStream { encoder: self })?;
        self.end_indefinite()
    }

    pub fn encode_text_stream<F>(&mut self, f: F) -> Result<(), S::Error>
    where
        F: FnOnce(&mut TextStream<S>) -> Result<(), S::Error>,
    {
        self.start_indefinite(IndefiniteKind::TextString)?;
        f(&mut TextStream { encoder: self })?;
        self.end_indefinite()
    }
}

/// The open body of an indefinite-length byte string
pub struct ByteStream<'a, S> {
    encoder: &'a mut StreamEncoder<S>,
}

impl<S> ByteStream<'_, S>
where
    S: ByteSink,
{
    pub fn chunk(&mut self, bytes: &[u8]) -> Result<(), S::Error> {
        self.encoder.encode_bytes(bytes)
    }
}

/// The open body of an indefinite-length text string
pub struct TextStream<'a, S> {
    encoder: &'a mut StreamEncoder<S>,
}

impl<S> TextStream<'_, S>
where
    S: ByteSink,
{
    pub fn chunk(&mut self, text: &str) -> Result<(), S::Error> {
        self.encoder.encode_text(text)
    }
}

fn infallible<T>(r: Result<T, core::convert::Infallible>) -> T {
    match r {
        Ok(t) => t,
        Err(never) => match never {},
    }
}

/// Encode `value` as a definite-length CBOR data item.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut e = StreamEncoder::new(Vec::new());
    infallible(e.encode(value));
    e.into_inner()
}

/// Encode using the streaming API into a fresh buffer.
pub fn encode_with<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut StreamEncoder<Vec<u8>>) -> Result<(), core::convert::Infallible>,
{
    let mut e = StreamEncoder::new(Vec::new());
    infallible(f(&mut e));
    e.into_inner()
}
