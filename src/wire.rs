//! Tag byte layout, type class constants, and the numeric configuration bound into the wire
//! (§3, §6). Changing any of these values breaks compatibility with existing encoded messages.

/// Type class: value is zero / absent-as-default; no payload.
pub const TYPE_0: u8 = 0;
/// Type class: 8-bit little-endian integer payload.
pub const TYPE_NUM_8: u8 = 1;
/// Type class: 16-bit little-endian integer payload.
pub const TYPE_NUM_16: u8 = 2;
/// Type class: 32-bit little-endian integer payload.
pub const TYPE_NUM_32: u8 = 3;
/// Type class: 64-bit little-endian integer payload.
pub const TYPE_NUM_64: u8 = 4;
/// Type class: length-prefixed payload, 1-byte length.
pub const TYPE_VAR_8: u8 = 5;
/// Type class: length-prefixed payload, 2-byte length.
pub const TYPE_VAR_16: u8 = 6;
/// Type class: length-prefixed payload, 4-byte length.
pub const TYPE_VAR_32: u8 = 7;

/// Number of bits the type class is shifted left by within the tag byte.
pub const TYPE_SHIFT: u8 = 4;
/// Mask selecting the short (in-tag-byte) index bits.
pub const INDEX_MASK: u8 = 0x0F;
/// Flag bit indicating the index did not fit in the tag byte and follows as its own byte.
pub const BIG_INDEX_MASK: u8 = 0x80;
/// Largest index representable inline in the tag byte before `big_index` must be used.
pub const LITTLE_INDEX_BOUND: u32 = 16;

/// Largest buffer a single message may occupy. Also the bound that makes the info-table
/// "inline value vs buffer offset" packing trick in [`crate::decoder`] sound.
pub const MAX_BUFFER_SIZE: usize = 1 << 30;
/// Largest permitted element count for an array or map.
pub const MAX_OBJECT_ARRAY_SIZE: usize = 1 << 20;
/// Ceiling on the encoder's doubling/quadrupling growth before it falls back to linear growth.
pub const DOUBLE_BUFFER_LIMIT: usize = 1 << 22;
/// Largest nested-object body size eligible for the 1-byte trimmed length prefix.
pub const TRIM_SIZE_LIMIT: usize = 127;
/// Sentinel written for a `None` element inside an object/string array.
pub const NULL_PACKABLE: i32 = -1;

/// Sentinel info-table word meaning "field absent", i.e. all bits set.
pub const NULL_FLAG: u64 = u64::MAX;
/// High bit of a 64-bit info-table slot; when set, the low 32 bits hold a buffer offset
/// rather than an inline value.
pub const INFO_OFFSET_FLAG: u64 = 1 << 63;

/// Returns the byte width of the fixed payload for numeric type classes 0..4, or `None` for
/// the variable-length classes.
#[inline(always)]
pub const fn fixed_width(type_class: u8) -> Option<usize> {
    match type_class {
        TYPE_0 => Some(0),
        TYPE_NUM_8 => Some(1),
        TYPE_NUM_16 => Some(2),
        TYPE_NUM_32 => Some(4),
        TYPE_NUM_64 => Some(8),
        _ => None,
    }
}

/// Returns the byte width of the length prefix for variable-length type classes 5..7, or
/// `None` for the fixed-width classes.
#[inline(always)]
pub const fn length_prefix_width(type_class: u8) -> Option<usize> {
    match type_class {
        TYPE_VAR_8 => Some(1),
        TYPE_VAR_16 => Some(2),
        TYPE_VAR_32 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_widths_match_type_classes() {
        assert_eq!(fixed_width(TYPE_0), Some(0));
        assert_eq!(fixed_width(TYPE_NUM_8), Some(1));
        assert_eq!(fixed_width(TYPE_NUM_16), Some(2));
        assert_eq!(fixed_width(TYPE_NUM_32), Some(4));
        assert_eq!(fixed_width(TYPE_NUM_64), Some(8));
        assert_eq!(fixed_width(TYPE_VAR_8), None);
    }

    #[test]
    fn length_prefix_widths_match_type_classes() {
        assert_eq!(length_prefix_width(TYPE_VAR_8), Some(1));
        assert_eq!(length_prefix_width(TYPE_VAR_16), Some(2));
        assert_eq!(length_prefix_width(TYPE_VAR_32), Some(4));
        assert_eq!(length_prefix_width(TYPE_NUM_8), None);
    }
}
