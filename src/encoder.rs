//! The encoder (§4.2): capacity management, index/type tag emission, primitive/string/array/
//! nested-object/map writers, and length back-patching with in-buffer trimming.

use crate::buffer::Buffer;
#[cfg(feature = "std")]
use crate::pool::BufferPool;
use crate::varint::{write_varint_neg1, zigzag_encode_32, zigzag_encode_64};
use crate::wire::*;
use crate::{Error, Packable, Result};
use hashbrown::HashMap;
use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Process-wide ratchet of the largest message size observed, used to give subsequent
/// encodes a bigger initial capacity jump (§4.2 capacity policy).
static MAX_ALLOCATED: AtomicUsize = AtomicUsize::new(4096);

/// Builds one encoded message by appending tagged records into a growing [`Buffer`].
pub struct Encoder {
    buffer: Buffer,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates an encoder whose initial capacity is seeded from the process-wide size
    /// ratchet, pulling a buffer from [`BufferPool`] when the `std` feature is enabled.
    pub fn new() -> Self {
        let initial = MAX_ALLOCATED.load(Ordering::Relaxed).min(DOUBLE_BUFFER_LIMIT);
        #[cfg(feature = "std")]
        {
            let pooled = BufferPool::global().acquire(initial).take();
            Encoder {
                buffer: Buffer::from_vec(pooled),
            }
        }
        #[cfg(not(feature = "std"))]
        {
            Encoder {
                buffer: Buffer::with_capacity(initial),
            }
        }
    }

    /// Creates an encoder with an explicit initial capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Encoder {
            buffer: Buffer::with_capacity(capacity),
        }
    }

    /// Ensures at least `additional` more bytes can be written without reallocating on every
    /// call, failing with `CapacityOverflow` if the message would exceed `max_buffer_size`,
    /// and ratcheting the process-wide size hint upward.
    fn ensure(&mut self, additional: usize) -> Result<()> {
        let required = self
            .buffer
            .limit()
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        if required > MAX_BUFFER_SIZE {
            return Err(Error::CapacityOverflow);
        }
        MAX_ALLOCATED.fetch_max(required, Ordering::Relaxed);
        self.buffer.reserve(additional);
        Ok(())
    }

    /// Emits the tag byte(s) for `index`, returning the offset of the first tag byte so the
    /// caller can OR the chosen type class into it once known.
    fn put_index(&mut self, index: u32) -> Result<usize> {
        if index >= 256 {
            return Err(Error::InvalidInput);
        }
        self.ensure(2)?;
        if index < LITTLE_INDEX_BOUND {
            Ok(self.buffer.append(&[index as u8]))
        } else {
            Ok(self.buffer.append(&[BIG_INDEX_MASK, index as u8]))
        }
    }

    /// ORs `type_class` into the tag byte previously returned by [`Encoder::put_index`].
    fn set_type(&mut self, tag_offset: usize, type_class: u8) {
        let current = self.buffer.as_slice()[tag_offset];
        self.buffer
            .patch(tag_offset, &[current | (type_class << TYPE_SHIFT)]);
    }

    /// Writes a boolean field.
    pub fn put_bool(&mut self, index: u32, value: bool) -> Result<()> {
        self.put_i32(index, value as i32)
    }

    /// Writes a 32-bit integer field, selecting `type_0`/`type_num_8/16/32` by the narrowest
    /// width that preserves `value` as an unsigned zero-extension.
    pub fn put_i32(&mut self, index: u32, value: i32) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        if value == 0 {
            self.set_type(tag_offset, TYPE_0);
            return Ok(());
        }
        self.ensure(4)?;
        let u = value as u32;
        if u >> 8 == 0 {
            self.buffer.write_u8(value as u8);
            self.set_type(tag_offset, TYPE_NUM_8);
        } else if u >> 16 == 0 {
            self.buffer.write_i16(value as i16);
            self.set_type(tag_offset, TYPE_NUM_16);
        } else {
            self.buffer.write_i32(value);
            self.set_type(tag_offset, TYPE_NUM_32);
        }
        Ok(())
    }

    /// Writes a zigzag-encoded signed 32-bit integer field.
    pub fn put_si32(&mut self, index: u32, value: i32) -> Result<()> {
        self.put_i32(index, zigzag_encode_32(value))
    }

    /// Writes a 64-bit integer field, additionally considering the 64-bit width.
    pub fn put_i64(&mut self, index: u32, value: i64) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        if value == 0 {
            self.set_type(tag_offset, TYPE_0);
            return Ok(());
        }
        self.ensure(8)?;
        let u = value as u64;
        if u >> 32 != 0 {
            self.buffer.write_i64(value);
            self.set_type(tag_offset, TYPE_NUM_64);
        } else if u >> 8 == 0 {
            self.buffer.write_u8(value as u8);
            self.set_type(tag_offset, TYPE_NUM_8);
        } else if u >> 16 == 0 {
            self.buffer.write_i16(value as i16);
            self.set_type(tag_offset, TYPE_NUM_16);
        } else {
            self.buffer.write_i32(value as i32);
            self.set_type(tag_offset, TYPE_NUM_32);
        }
        Ok(())
    }

    /// Writes a zigzag-encoded signed 64-bit integer field.
    pub fn put_si64(&mut self, index: u32, value: i64) -> Result<()> {
        self.put_i64(index, zigzag_encode_64(value))
    }

    /// Writes a 32-bit float field, zero-elided.
    pub fn put_f32(&mut self, index: u32, value: f32) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        if value == 0.0 && value.is_sign_positive() {
            self.set_type(tag_offset, TYPE_0);
            return Ok(());
        }
        self.ensure(4)?;
        self.buffer.write_f32(value);
        self.set_type(tag_offset, TYPE_NUM_32);
        Ok(())
    }

    /// Writes a 64-bit float field, zero-elided.
    pub fn put_f64(&mut self, index: u32, value: f64) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        if value == 0.0 && value.is_sign_positive() {
            self.set_type(tag_offset, TYPE_0);
            return Ok(());
        }
        self.ensure(8)?;
        self.buffer.write_f64(value);
        self.set_type(tag_offset, TYPE_NUM_64);
        Ok(())
    }

    /// Writes a compact float-64 field (§4.2): writes only the non-zero half of the swapped
    /// bit pattern when possible.
    pub fn put_cf64(&mut self, index: u32, value: f64) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        let bits = value.to_bits();
        if bits == 0 {
            self.set_type(tag_offset, TYPE_0);
            return Ok(());
        }
        let swapped = swap_halves(bits);
        self.ensure(8)?;
        if swapped & 0xFFFF_FFFF == 0 {
            let high = (swapped >> 32) as u32;
            self.buffer.write_i32(high as i32);
            self.set_type(tag_offset, TYPE_NUM_32);
        } else {
            self.buffer.write_i64(swapped as i64);
            self.set_type(tag_offset, TYPE_NUM_64);
        }
        Ok(())
    }

    /// Reserves a tag and length-prefixed header for a `size`-byte body, choosing
    /// `type_var_8/16/32` by the narrowest length prefix that fits `size`.
    fn wrap_tag_and_length(&mut self, index: u32, size: usize) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        self.ensure(4 + size)?;
        if size <= u8::MAX as usize {
            self.buffer.write_u8(size as u8);
            self.set_type(tag_offset, TYPE_VAR_8);
        } else if size <= u16::MAX as usize {
            self.buffer.write_i16(size as u16 as i16);
            self.set_type(tag_offset, TYPE_VAR_16);
        } else if size <= u32::MAX as usize {
            self.buffer.write_i32(size as u32 as i32);
            self.set_type(tag_offset, TYPE_VAR_32);
        } else {
            return Err(Error::CapacityOverflow);
        }
        Ok(())
    }

    /// Writes an optional string field; `None` omits the field entirely.
    pub fn put_string_ref(&mut self, index: u32, value: Option<&str>) -> Result<()> {
        let Some(s) = value else {
            return Ok(());
        };
        self.wrap_tag_and_length(index, s.len())?;
        self.buffer.append(s.as_bytes());
        Ok(())
    }

    /// Writes a non-optional string field.
    pub fn put_string(&mut self, index: u32, value: &str) -> Result<()> {
        self.put_string_ref(index, Some(value))
    }

    /// Writes an optional raw byte field; `None` omits the field entirely.
    pub fn put_bytes(&mut self, index: u32, value: Option<&[u8]>) -> Result<()> {
        let Some(bytes) = value else {
            return Ok(());
        };
        self.wrap_tag_and_length(index, bytes.len())?;
        self.buffer.append(bytes);
        Ok(())
    }

    /// Writes an `i32` array as `n * 4` raw little-endian bytes.
    pub fn put_i32_array(&mut self, index: u32, values: &[i32]) -> Result<()> {
        self.wrap_tag_and_length(index, values.len() * 4)?;
        for &v in values {
            self.buffer.append(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Writes an `i64` array as `n * 8` raw little-endian bytes.
    pub fn put_i64_array(&mut self, index: u32, values: &[i64]) -> Result<()> {
        self.wrap_tag_and_length(index, values.len() * 8)?;
        for &v in values {
            self.buffer.append(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Writes an `f32` array as `n * 4` raw little-endian bytes.
    pub fn put_f32_array(&mut self, index: u32, values: &[f32]) -> Result<()> {
        self.wrap_tag_and_length(index, values.len() * 4)?;
        for &v in values {
            self.buffer.append(&v.to_bits().to_le_bytes());
        }
        Ok(())
    }

    /// Writes an `f64` array as `n * 8` raw little-endian bytes.
    pub fn put_f64_array(&mut self, index: u32, values: &[f64]) -> Result<()> {
        self.wrap_tag_and_length(index, values.len() * 8)?;
        for &v in values {
            self.buffer.append(&v.to_bits().to_le_bytes());
        }
        Ok(())
    }

    /// Writes an optional nested object field (§4.2 `put_packable`). `None` omits the field.
    pub fn put_packable<T: Packable>(&mut self, index: u32, value: Option<&T>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        let tag_offset = self.put_index(index)?;
        self.ensure(4)?;
        let len_offset = self.buffer.append_zeros(4);
        let body_start = self.buffer.limit();
        value.encode(self)?;
        let body_size = self.buffer.limit() - body_start;
        self.trim_or_keep_length(tag_offset, len_offset, body_start, body_size);
        Ok(())
    }

    /// Shared trim-or-keep-4-byte-length policy used by nested objects and arrays.
    fn trim_or_keep_length(
        &mut self,
        tag_offset: usize,
        len_offset: usize,
        body_start: usize,
        body_size: usize,
    ) {
        if body_size == 0 {
            self.buffer.truncate(tag_offset);
            return;
        }
        if body_size <= TRIM_SIZE_LIMIT {
            self.buffer.patch(len_offset, &[body_size as u8]);
            self.buffer.move_range(body_start, body_size, -3);
            self.buffer.truncate(self.buffer.limit() - 3);
            self.set_type(tag_offset, TYPE_VAR_8);
        } else {
            self.buffer.patch(len_offset, &(body_size as u32).to_le_bytes());
            self.set_type(tag_offset, TYPE_VAR_32);
        }
    }

    /// Writes an optional array of optional nested objects (§4.2 `put_packable_array`).
    pub fn put_packable_array<T: Packable>(
        &mut self,
        index: u32,
        values: Option<&[Option<T>]>,
    ) -> Result<()> {
        let Some(values) = values else {
            return Ok(());
        };
        if values.len() > MAX_OBJECT_ARRAY_SIZE {
            return Err(Error::CapacityOverflow);
        }
        let tag_offset = self.put_index(index)?;
        self.ensure(4)?;
        let len_offset = self.buffer.append_zeros(4);
        let body_start = self.buffer.limit();
        self.buffer.write_varint32(values.len() as i32);
        for element in values {
            match element {
                None => {
                    self.buffer.append(&(-1i16).to_le_bytes());
                }
                Some(elem) => {
                    let elem_len_offset = self.buffer.append_zeros(4);
                    let elem_body_start = self.buffer.limit();
                    elem.encode(self)?;
                    let elem_size = self.buffer.limit() - elem_body_start;
                    if elem_size <= 0x7FFF {
                        self.buffer.patch(elem_len_offset, &(elem_size as u16).to_le_bytes());
                        self.buffer.move_range(elem_body_start, elem_size, -2);
                        self.buffer.truncate(self.buffer.limit() - 2);
                    } else {
                        let first = 0x8000u16 | ((elem_size >> 16) as u16 & 0x7FFF);
                        let second = (elem_size & 0xFFFF) as u16;
                        self.buffer.patch(elem_len_offset, &first.to_le_bytes());
                        self.buffer.patch(elem_len_offset + 2, &second.to_le_bytes());
                    }
                }
            }
        }
        let body_size = self.buffer.limit() - body_start;
        self.trim_or_keep_length(tag_offset, len_offset, body_start, body_size);
        Ok(())
    }

    /// Writes an optional array of non-optional strings.
    pub fn put_string_array(&mut self, index: u32, values: Option<&[String]>) -> Result<()> {
        let Some(values) = values else {
            return Ok(());
        };
        self.put_string_ref_array_impl(index, values.iter().map(|s| Some(s.as_str())))
    }

    /// Writes an optional array of optional strings; `None` elements encode as the canonical
    /// `-1` varint sentinel.
    pub fn put_string_ref_array(&mut self, index: u32, values: Option<&[Option<&str>]>) -> Result<()> {
        let Some(values) = values else {
            return Ok(());
        };
        self.put_string_ref_array_impl(index, values.iter().copied())
    }

    fn put_string_ref_array_impl<'a>(
        &mut self,
        index: u32,
        values: impl ExactSizeIterator<Item = Option<&'a str>>,
    ) -> Result<()> {
        if values.len() > MAX_OBJECT_ARRAY_SIZE {
            return Err(Error::CapacityOverflow);
        }
        let tag_offset = self.put_index(index)?;
        self.ensure(4)?;
        let len_offset = self.buffer.append_zeros(4);
        let body_start = self.buffer.limit();
        self.buffer.write_varint32(values.len() as i32);
        for element in values {
            match element {
                None => {
                    write_varint_neg1(&mut self.buffer)?;
                }
                Some(s) => {
                    self.buffer.write_varint32(s.len() as i32);
                    self.buffer.append(s.as_bytes());
                }
            }
        }
        let body_size = self.buffer.limit() - body_start;
        self.trim_or_keep_length(tag_offset, len_offset, body_start, body_size);
        Ok(())
    }

    /// Writes a string-to-string map field, reusing the object-array framing.
    pub fn put_str2str(&mut self, index: u32, map: &HashMap<String, String>) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        self.ensure(4)?;
        let len_offset = self.buffer.append_zeros(4);
        let body_start = self.buffer.limit();
        self.buffer.write_varint32(map.len() as i32);
        for (k, v) in map {
            self.buffer.write_varint32(k.len() as i32);
            self.buffer.append(k.as_bytes());
            self.buffer.write_varint32(v.len() as i32);
            self.buffer.append(v.as_bytes());
        }
        let body_size = self.buffer.limit() - body_start;
        self.trim_or_keep_length(tag_offset, len_offset, body_start, body_size);
        Ok(())
    }

    /// Writes a string-to-packable map field, reusing the object-array framing.
    pub fn put_str2pack<T: Packable>(&mut self, index: u32, map: &HashMap<String, T>) -> Result<()> {
        let tag_offset = self.put_index(index)?;
        self.ensure(4)?;
        let len_offset = self.buffer.append_zeros(4);
        let body_start = self.buffer.limit();
        self.buffer.write_varint32(map.len() as i32);
        for (k, v) in map {
            self.buffer.write_varint32(k.len() as i32);
            self.buffer.append(k.as_bytes());
            let elem_len_offset = self.buffer.append_zeros(4);
            let elem_body_start = self.buffer.limit();
            v.encode(self)?;
            let elem_size = self.buffer.limit() - elem_body_start;
            self.buffer.patch(elem_len_offset, &(elem_size as u32).to_le_bytes());
        }
        let body_size = self.buffer.limit() - body_start;
        self.trim_or_keep_length(tag_offset, len_offset, body_start, body_size);
        Ok(())
    }

    /// Reserves a tag and a length-prefixed region of exactly `size` bytes, returning a
    /// mutable slice of the region so the caller can write arbitrary bit-exact content.
    pub fn put_custom(&mut self, index: u32, size: usize) -> Result<&mut [u8]> {
        let tag_offset = self.put_index(index)?;
        self.ensure(4 + size)?;
        if size <= u8::MAX as usize {
            self.buffer.write_u8(size as u8);
            self.set_type(tag_offset, TYPE_VAR_8);
        } else if size <= u16::MAX as usize {
            self.buffer.write_i16(size as u16 as i16);
            self.set_type(tag_offset, TYPE_VAR_16);
        } else if size <= u32::MAX as usize {
            self.buffer.write_i32(size as u32 as i32);
            self.set_type(tag_offset, TYPE_VAR_32);
        } else {
            return Err(Error::CapacityOverflow);
        }
        let offset = self.buffer.append_zeros(size);
        Ok(self.buffer.region_mut(offset, size))
    }

    /// Finishes encoding, returning the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buffer.into_vec()
    }
}

/// Swaps the high and low 32-bit halves of a 64-bit word (its own inverse). Used by
/// [`Encoder::put_cf64`] and the matching decoder accessor.
#[inline(always)]
pub const fn swap_halves(bits: u64) -> u64 {
    ((bits & 0xFFFF_FFFF) << 32) | (bits >> 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_zero_i32() {
        let mut e = Encoder::new();
        e.put_i32(0, 0).unwrap();
        assert_eq!(e.finish(), vec![0x00]);
    }

    #[test]
    fn scenario_b_narrow_i32() {
        let mut e = Encoder::new();
        e.put_i32(0, 200).unwrap();
        assert_eq!(e.finish(), vec![0x10, 0xC8]);
    }

    #[test]
    fn scenario_c_negative_i32_uses_full_width() {
        let mut e = Encoder::new();
        e.put_i32(0, -1).unwrap();
        assert_eq!(e.finish(), vec![0x30, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn scenario_d_string() {
        let mut e = Encoder::new();
        e.put_string(0, "ab").unwrap();
        assert_eq!(e.finish(), vec![0x50, 0x02, 0x61, 0x62]);
    }

    #[test]
    fn scenario_e_big_index() {
        let mut e = Encoder::new();
        e.put_i32(20, 5).unwrap();
        assert_eq!(e.finish(), vec![0x90, 0x14, 0x05]);
    }

    struct Inner {
        value: i32,
    }

    impl Packable for Inner {
        fn encode(&self, encoder: &mut Encoder) -> Result<()> {
            encoder.put_i32(0, self.value)
        }
        fn decode(decoder: &crate::decoder::Decoder) -> Result<Self> {
            Ok(Inner {
                value: decoder.get_i32(0)?,
            })
        }
    }

    #[test]
    fn scenario_f_nested_packable_trims() {
        let mut e = Encoder::new();
        e.put_packable(0, Some(&Inner { value: 1 })).unwrap();
        assert_eq!(e.finish(), vec![0x50, 0x02, 0x10, 0x01]);
    }

    #[test]
    fn absent_nested_packable_omits_field() {
        let mut e = Encoder::new();
        e.put_packable::<Inner>(0, None).unwrap();
        assert_eq!(e.finish(), Vec::<u8>::new());
    }

    #[test]
    fn cf64_compresses_integral_doubles() {
        let mut e = Encoder::new();
        e.put_cf64(0, 1.0).unwrap();
        let bytes = e.finish();
        // integral values have a 32-bit-wide swapped low half: expect a 5-byte record.
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn index_at_255_uses_big_index_form() {
        let mut e = Encoder::new();
        e.put_bool(255, true).unwrap();
        let bytes = e.finish();
        assert_eq!(bytes[0] & BIG_INDEX_MASK, BIG_INDEX_MASK);
        assert_eq!(bytes[1], 255);
    }

    #[test]
    fn index_out_of_range_is_rejected() {
        let mut e = Encoder::new();
        assert!(matches!(e.put_i32(256, 1), Err(Error::InvalidInput)));
    }
}
