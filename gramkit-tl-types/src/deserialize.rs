//! Decoding side of the codec.

use std::fmt;

use crate::RawVec;
use crate::serialize::{BOOL_FALSE_ID, BOOL_TRUE_ID, LONG_STRING_MARKER, VECTOR_ID, padding_for};

/// Why a decode stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The input ended in the middle of a value.
    UnexpectedEof,
    /// A boxed value started with an id its type does not have.
    UnexpectedConstructor { id: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("input ended mid-value"),
            Self::UnexpectedConstructor { id } => write!(f, "constructor {id:#010x} not valid here"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Read position over a borrowed byte slice.
///
/// Decoders take `&mut Cursor` so that after a nested object the caller can
/// see, through [`Cursor::pos`], where the next field starts.
pub struct Cursor<'a> {
    data: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self { data, at: 0 }
    }

    pub fn pos(&self) -> usize {
        self.at
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.at
    }

    /// Take the next `len` bytes, borrowed from the underlying slice.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let taken = self
            .at
            .checked_add(len)
            .and_then(|end| self.data.get(self.at..end))
            .ok_or(Error::UnexpectedEof)?;
        self.at += len;
        Ok(taken)
    }

    /// Take the next `N` bytes as an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(self.read_slice(out.len())?);
        Ok(())
    }

    /// The next 4 bytes as a constructor id, leaving the position alone.
    pub fn peek_u32(&self) -> Result<u32> {
        match self.data.get(self.at..self.at + 4) {
            Some(&[a, b, c, d]) => Ok(u32::from_le_bytes([a, b, c, d])),
            _ => Err(Error::UnexpectedEof),
        }
    }

    /// Append everything left to `out`; returns how many bytes that was.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> usize {
        let rest = &self.data[self.at..];
        out.extend_from_slice(rest);
        self.at = self.data.len();
        rest.len()
    }
}

/// What every generated decoder receives.
pub type Buffer<'a, 'b> = &'a mut Cursor<'b>;

/// A value that can be read back from its TL wire form.
pub trait Deserializable: Sized {
    fn deserialize(buf: Buffer) -> Result<Self>;

    /// Decode from the start of `bytes`. Trailing bytes are ignored.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut Cursor::from_slice(bytes))
    }
}

macro_rules! fixed_width {
    ($($ty:ty),*) => {$(
        impl Deserializable for $ty {
            fn deserialize(buf: Buffer) -> Result<Self> {
                buf.read_array().map(<$ty>::from_le_bytes)
            }
        }
    )*};
}

fixed_width!(i32, u32, i64, f64);

impl<const N: usize> Deserializable for [u8; N] {
    fn deserialize(buf: Buffer) -> Result<Self> {
        buf.read_array()
    }
}

impl Deserializable for bool {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            BOOL_TRUE_ID => Ok(true),
            BOOL_FALSE_ID => Ok(false),
            id => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

impl Deserializable for Vec<u8> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let (len, header) = match buf.read_byte()? {
            LONG_STRING_MARKER => {
                let [a, b, c] = buf.read_array()?;
                (u32::from_le_bytes([a, b, c, 0]) as usize, 4)
            }
            short => (short as usize, 1),
        };
        let payload = buf.read_slice(len)?.to_vec();
        buf.read_slice(padding_for(header + len))?;
        Ok(payload)
    }
}

/// Invalid UTF-8 from the server is replaced rather than rejected.
impl Deserializable for String {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let raw = Vec::<u8>::deserialize(buf)?;
        Ok(String::from_utf8(raw).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

fn counted<T: Deserializable>(buf: Buffer) -> Result<Vec<T>> {
    let count = i32::deserialize(buf)?.max(0) as usize;
    // A hostile count must not drive the allocation; each element needs at least 4 bytes.
    let mut items = Vec::with_capacity(count.min(buf.remaining() / 4));
    for _ in 0..count {
        items.push(T::deserialize(buf)?);
    }
    Ok(items)
}

impl<T: Deserializable> Deserializable for Vec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            VECTOR_ID => counted(buf),
            id => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

impl<T: Deserializable> Deserializable for RawVec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        counted(buf).map(RawVec)
    }
}

impl<T: Deserializable> Deserializable for Box<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        T::deserialize(buf).map(Box::new)
    }
}
