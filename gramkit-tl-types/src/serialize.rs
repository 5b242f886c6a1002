//! Encoding side of the codec.
//!
//! TL output is always a whole number of 4-byte words. Fixed-width values are
//! little-endian; byte strings carry a length header and zero padding.

/// A value with a TL wire form.
pub trait Serializable {
    /// Append the encoding of `self` to `buf`.
    fn serialize(&self, buf: &mut impl Extend<u8>);

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize(&mut out);
        out
    }
}

/// `vector#1cb5c415 {t:Type} # [ t ] = Vector t`
pub const VECTOR_ID: u32 = 0x1cb5c415;
/// `boolTrue#997275b5 = Bool`
pub const BOOL_TRUE_ID: u32 = 0x997275b5;
/// `boolFalse#bc799737 = Bool`
pub const BOOL_FALSE_ID: u32 = 0xbc799737;

/// Longest byte string that fits the one-byte length header.
pub(crate) const SHORT_STRING_MAX: usize = 253;
/// First header byte of a byte string with a 3-byte length.
pub(crate) const LONG_STRING_MARKER: u8 = 0xfe;
/// Byte strings must be shorter than this to be representable.
pub const LONG_STRING_LIMIT: usize = 1 << 24;

/// Zero bytes needed after `used` bytes to reach a word boundary.
pub(crate) fn padding_for(used: usize) -> usize {
    (4 - used % 4) % 4
}

macro_rules! fixed_width {
    ($($ty:ty),*) => {$(
        impl Serializable for $ty {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                buf.extend(self.to_le_bytes());
            }
        }
    )*};
}

fixed_width!(i32, u32, i64, f64);

/// `int128` and `int256` travel as their raw bytes.
impl<const N: usize> Serializable for [u8; N] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        buf.extend(*self);
    }
}

impl Serializable for bool {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let id = if *self { BOOL_TRUE_ID } else { BOOL_FALSE_ID };
        id.serialize(buf);
    }
}

/// `bytes` and `string`.
///
/// Up to 253 bytes: one length byte. Longer: `0xfe` then a 3-byte length.
/// Either way the payload is zero-padded to a word boundary.
///
/// The 3-byte length caps a value below [`LONG_STRING_LIMIT`] bytes.
impl Serializable for [u8] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let len = self.len();
        debug_assert!(len < LONG_STRING_LIMIT, "TL byte string of {len} bytes does not fit a 3-byte length");
        let header = if len <= SHORT_STRING_MAX {
            buf.extend([len as u8]);
            1
        } else {
            let [a, b, c, _] = (len as u32).to_le_bytes();
            buf.extend([LONG_STRING_MARKER, a, b, c]);
            4
        };
        buf.extend(self.iter().copied());
        buf.extend(std::iter::repeat_n(0u8, padding_for(header + len)));
    }
}

impl Serializable for Vec<u8> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.as_slice().serialize(buf);
    }
}

impl Serializable for String {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.as_bytes().serialize(buf);
    }
}

fn counted<T: Serializable>(items: &[T], buf: &mut impl Extend<u8>) {
    (items.len() as i32).serialize(buf);
    items.iter().for_each(|item| item.serialize(buf));
}

/// Boxed `Vector<T>`.
impl<T: Serializable> Serializable for Vec<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        VECTOR_ID.serialize(buf);
        counted(self, buf);
    }
}

/// Bare `vector<T>`.
impl<T: Serializable> Serializable for crate::RawVec<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        counted(&self.0, buf);
    }
}

/// Flag-guarded field: absence is recorded in the flags word, so `None` writes nothing.
impl<T: Serializable> Serializable for Option<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        if let Some(value) = self {
            value.serialize(buf);
        }
    }
}

impl<T: Serializable + ?Sized> Serializable for &T {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        (**self).serialize(buf);
    }
}

impl<T: Serializable> Serializable for Box<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        (**self).serialize(buf);
    }
}
