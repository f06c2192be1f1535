//! Raw little-endian primitive byte conversion, used internally by [`crate::buffer::Buffer`]
//! to read/write the fixed-width payloads of §4.1. This is the same pattern the teacher crate
//! used for its top-level `Pack` trait, kept here as an internal building block rather than a
//! public API: the public surface for whole value objects is [`crate::packable::Packable`].

use crate::io::{Read, Write};
use crate::{Error, Result};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Implemented on the fixed-width primitive types the wire format transfers inline.
pub trait RawEndian: Sized + Copy {
    /// Writes `self` in little-endian order into `writer`.
    fn write_le(&self, writer: &mut impl Write) -> Result<usize>;
    /// Reads a value of `Self` in little-endian order from `reader`.
    fn read_le(reader: &mut impl Read) -> Result<Self>;
    /// Returns the little-endian byte representation of `self`.
    fn to_le_array(&self) -> Vec<u8>;
    /// Reconstructs `Self` from a little-endian byte slice. Panics if `bytes.len()` does not
    /// match `size_of::<Self>()`; callers in this crate always pass an exact-size slice.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_raw_endian {
    ($($t:ty),+ $(,)?) => {
        $(
            impl RawEndian for $t {
                #[inline(always)]
                fn write_le(&self, writer: &mut impl Write) -> Result<usize> {
                    writer.write(&endian_cast::Endianness::le_bytes(self))
                }

                #[inline(always)]
                fn read_le(reader: &mut impl Read) -> Result<Self> {
                    let mut buf = [0u8; core::mem::size_of::<$t>()];
                    let n = reader.read(&mut buf)?;
                    if n != buf.len() {
                        return Err(Error::ReaderOutOfData);
                    }
                    Ok(<$t>::from_le_bytes(buf))
                }

                #[inline(always)]
                fn to_le_array(&self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }

                #[inline(always)]
                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; core::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )+
    };
}

impl_raw_endian!(u8, u16, u32, u64, i8, i16, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Cursor;

    fn roundtrip<T: RawEndian + PartialEq + core::fmt::Debug>(value: T) {
        let mut buffer = Vec::new();
        value.write_le(&mut buffer).unwrap();
        let mut cursor = Cursor::new(&buffer[..]);
        let decoded = T::read_le(&mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn primitive_roundtrips() {
        roundtrip(0u8);
        roundtrip(255u8);
        roundtrip(0u16);
        roundtrip(u16::MAX);
        roundtrip(0u32);
        roundtrip(u32::MAX);
        roundtrip(0u64);
        roundtrip(u64::MAX);
        roundtrip(i8::MIN);
        roundtrip(i8::MAX);
        roundtrip(i16::MIN);
        roundtrip(i32::MIN);
        roundtrip(i64::MIN);
    }

    #[test]
    fn byte_order_is_little_endian() {
        let mut buffer = Vec::new();
        0x1234u16.write_le(&mut buffer).unwrap();
        assert_eq!(buffer, vec![0x34, 0x12]);
    }

    #[test]
    fn insufficient_data_errors() {
        let bytes = [0x12u8];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(u32::read_le(&mut cursor), Err(Error::ReaderOutOfData)));
    }
}
