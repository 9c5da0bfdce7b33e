/*!
Byte source and sink abstractions used by the stream codec.
*/

use super::*;
use decode::Error;

#[cfg(feature = "std")]
use std::io::{Read, Write};

/// A big-endian fixed width unsigned integer, as found after a CBOR initial byte.
pub trait FixedWidth: Copy {
    const WIDTH: usize;

    /// `bytes` must be exactly `WIDTH` long
    fn from_be_slice(bytes: &[u8]) -> Self;

    fn with_be_bytes<R, F>(self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R;
}

macro_rules! impl_fixed_width {
    ($($ty:ty),*) => {
        $(
            impl FixedWidth for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();

                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; core::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_be_bytes(buf)
                }

                fn with_be_bytes<R, F>(self, f: F) -> R
                where
                    F: FnOnce(&[u8]) -> R,
                {
                    f(&self.to_be_bytes())
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64);

pub trait ByteSource {
    fn read_byte(&mut self) -> Result<u8, Error>;

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error>;

    fn read_int<T>(&mut self) -> Result<T, Error>
    where
        T: FixedWidth,
    {
        let bytes = self.read_bytes(T::WIDTH)?;
        Ok(T::from_be_slice(&bytes))
    }
}

pub trait ByteSink {
    type Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    fn write_int<T>(&mut self, value: T) -> Result<(), Self::Error>
    where
        T: FixedWidth,
    {
        value.with_be_bytes(|b| self.write_bytes(b))
    }
}

/// Reads from an in-memory buffer, tracking how much has been consumed.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_byte(&mut self) -> Result<u8, Error> {
        let b = *self
            .data
            .get(self.offset)
            .ok_or(Error::UnexpectedEndOfStream)?;
        self.offset += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        if n > self.data.len() - self.offset {
            return Err(Error::UnexpectedEndOfStream);
        }
        let bytes = self.data[self.offset..self.offset + n].to_vec();
        self.offset += n;
        Ok(bytes)
    }
}

impl ByteSink for Vec<u8> {
    type Error = core::convert::Infallible;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.push(byte);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapts an [`embedded_io::Read`] into a [`ByteSource`], without needing `std`.
pub struct EmbeddedSource<R> {
    reader: R,
}

impl<R: embedded_io::Read> EmbeddedSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn map_read_error<E: embedded_io::Error>(e: embedded_io::ReadExactError<E>) -> Error {
    match e {
        embedded_io::ReadExactError::UnexpectedEof => Error::UnexpectedEndOfStream,
        embedded_io::ReadExactError::Other(e) => Error::Read(embedded_io::Error::kind(&e)),
    }
}

impl<R: embedded_io::Read> ByteSource for EmbeddedSource<R> {
    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut b = [0u8; 1];
        self.reader.read_exact(&mut b).map_err(map_read_error)?;
        Ok(b[0])
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        // `n` comes off the wire, so grow a chunk at a time
        let mut buf = Vec::new();
        let mut chunk = [0u8; 256];
        while buf.len() < n {
            let len = (n - buf.len()).min(chunk.len());
            self.reader
                .read_exact(&mut chunk[..len])
                .map_err(map_read_error)?;
            buf.extend_from_slice(&chunk[..len]);
        }
        Ok(buf)
    }
}

/// Adapts an [`embedded_io::Write`] into a [`ByteSink`].
pub struct EmbeddedSink<W> {
    writer: W,
}

impl<W: embedded_io::Write> EmbeddedSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: embedded_io::Write> ByteSink for EmbeddedSink<W> {
    type Error = W::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.writer.write_all(&[byte])
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.writer.write_all(bytes)
    }
}

/// Adapts any [`std::io::Read`] into a [`ByteSource`].
#[cfg(feature = "std")]
pub struct IoSource<R> {
    reader: R,
}

#[cfg(feature = "std")]
impl<R: Read> IoSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(feature = "std")]
fn map_io_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEndOfStream
    } else {
        Error::Io(e)
    }
}

#[cfg(feature = "std")]
impl<R: Read> ByteSource for IoSource<R> {
    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut b = [0u8; 1];
        self.reader.read_exact(&mut b).map_err(map_io_error)?;
        Ok(b[0])
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        // Lengths come off the wire, so never trust them for preallocation
        let mut buf = Vec::new();
        (&mut self.reader)
            .take(n as u64)
            .read_to_end(&mut buf)
            .map_err(map_io_error)?;
        if buf.len() < n {
            Err(Error::UnexpectedEndOfStream)
        } else {
            Ok(buf)
        }
    }
}

/// Adapts any [`std::io::Write`] into a [`ByteSink`].
#[cfg(feature = "std")]
pub struct IoSink<W> {
    writer: W,
}

#[cfg(feature = "std")]
impl<W: Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(feature = "std")]
impl<W: Write> ByteSink for IoSink<W> {
    type Error = std::io::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.writer.write_all(&[byte])
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.writer.write_all(bytes)
    }
}
