//! The `Packable` trait (§6): the single seam user value types implement to plug into the
//! encoder/decoder. Mapping a type's fields to indices is left entirely to the implementor.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::Result;

/// Implemented by any value type that can be written into and read out of a Pack message.
///
/// `encode` writes `self`'s fields into `encoder` at whatever indices the implementor chooses.
/// `decode` reads them back from an already-scanned `decoder`. Both directions are infallible
/// with respect to *which* indices exist in the wire format but can fail on malformed input
/// (wrong UTF-8, truncated arrays, a nested object whose own fields don't parse).
pub trait Packable: Sized {
    /// Writes this value's fields into `encoder`.
    fn encode(&self, encoder: &mut Encoder) -> Result<()>;

    /// Reads a value of this type out of `decoder`.
    fn decode(decoder: &Decoder) -> Result<Self>;
}
