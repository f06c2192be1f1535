//! End-to-end coverage of the wire format (§8): the exact byte vectors from the specification,
//! round-trip fidelity across field shapes, sparse index access, corruption rejection, and
//! pool neutrality over many encode/decode cycles.

use packable::{Decoder, Encoder, Error, Packable, Result};

struct Inner {
    value: i32,
}

impl Packable for Inner {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.put_i32(0, self.value)
    }
    fn decode(decoder: &Decoder) -> Result<Self> {
        Ok(Inner {
            value: decoder.get_i32(0)?,
        })
    }
}

struct Wide {
    a: i32,
    b: i64,
    c: f64,
    d: String,
    e: Vec<i32>,
    f: Option<Inner>,
    g: Vec<bool>,
    h: Vec<u32>,
}

impl Packable for Wide {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.put_i32(0, self.a)?;
        encoder.put_i64(1, self.b)?;
        encoder.put_cf64(2, self.c)?;
        encoder.put_string(3, &self.d)?;
        encoder.put_i32_array(4, &self.e)?;
        encoder.put_packable(5, self.f.as_ref())?;
        let bools = packable::array_codec::encode_bool_array(&self.g);
        encoder.put_bytes(6, Some(&bools))?;
        let enums = packable::array_codec::encode_enum_array(&self.h)?;
        encoder.put_bytes(7, Some(&enums))?;
        Ok(())
    }

    fn decode(decoder: &Decoder) -> Result<Self> {
        Ok(Wide {
            a: decoder.get_i32(0)?,
            b: decoder.get_i64(1)?,
            c: decoder.get_cf64(2)?,
            d: decoder.get_string(3)?,
            e: decoder.get_i32_array(4)?,
            f: decoder.get_packable(5)?,
            g: packable::array_codec::decode_bool_array(decoder.get_bytes(6)?.unwrap())?,
            h: packable::array_codec::decode_enum_array(decoder.get_bytes(7)?.unwrap())?,
        })
    }
}

#[test]
fn spec_scenario_a_zero_value_elided_payload() {
    let mut e = Encoder::new();
    e.put_i32(0, 0).unwrap();
    assert_eq!(e.finish(), vec![0x00]);
}

#[test]
fn spec_scenario_b_narrowest_width_chosen() {
    let mut e = Encoder::new();
    e.put_i32(0, 200).unwrap();
    assert_eq!(e.finish(), vec![0x10, 0xC8]);
}

#[test]
fn spec_scenario_c_negative_forces_full_width() {
    let mut e = Encoder::new();
    e.put_i32(0, -1).unwrap();
    assert_eq!(e.finish(), vec![0x30, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn spec_scenario_d_string_field() {
    let mut e = Encoder::new();
    e.put_string(0, "ab").unwrap();
    assert_eq!(e.finish(), vec![0x50, 0x02, 0x61, 0x62]);
}

#[test]
fn spec_scenario_e_big_index_form() {
    let mut e = Encoder::new();
    e.put_i32(20, 5).unwrap();
    assert_eq!(e.finish(), vec![0x90, 0x14, 0x05]);
}

#[test]
fn spec_scenario_f_nested_object_trims_to_one_byte_length() {
    let mut e = Encoder::new();
    e.put_packable(0, Some(&Inner { value: 1 })).unwrap();
    assert_eq!(e.finish(), vec![0x50, 0x02, 0x10, 0x01]);
}

#[test]
fn spec_scenario_g_bool_array_short_form() {
    let bytes = packable::array_codec::encode_bool_array(&[true, false, true]);
    assert_eq!(bytes, vec![0x65]);
}

#[test]
fn spec_scenario_h_enum_array_packing() {
    let bytes = packable::array_codec::encode_enum_array(&[1, 2, 1]).unwrap();
    assert_eq!(bytes, vec![0x0E, 0x19]);
}

#[test]
fn round_trip_across_boundary_widths() {
    let cases = [
        0i64,
        1,
        -1,
        127,
        -128,
        32767,
        -32768,
        i32::MAX as i64,
        i32::MIN as i64,
        i64::MAX,
        i64::MIN,
    ];
    for &v in &cases {
        let mut e = Encoder::new();
        e.put_i64(0, v).unwrap();
        let bytes = e.finish();
        let d = Decoder::new(&bytes).unwrap();
        assert_eq!(d.get_i64(0).unwrap(), v, "failed for {v}");
    }
}

#[test]
fn round_trip_empty_string_and_array() {
    let mut e = Encoder::new();
    e.put_string(0, "").unwrap();
    e.put_i32_array(1, &[]).unwrap();
    let bytes = e.finish();
    let d = Decoder::new(&bytes).unwrap();
    assert_eq!(d.get_string(0).unwrap(), "");
    assert_eq!(d.get_i32_array(1).unwrap(), Vec::<i32>::new());
}

#[test]
fn round_trip_null_nested_object_is_omitted() {
    let mut e = Encoder::new();
    e.put_packable::<Inner>(0, None).unwrap();
    e.put_i32(1, 9).unwrap();
    let bytes = e.finish();
    let d = Decoder::new(&bytes).unwrap();
    assert!(d.get_packable::<Inner>(0).unwrap().is_none());
    assert_eq!(d.get_i32(1).unwrap(), 9);
}

#[test]
fn round_trip_indices_up_to_255() {
    let mut e = Encoder::new();
    e.put_i32(0, 1).unwrap();
    e.put_i32(255, 2).unwrap();
    let bytes = e.finish();
    let d = Decoder::new(&bytes).unwrap();
    assert_eq!(d.get_i32(0).unwrap(), 1);
    assert_eq!(d.get_i32(255).unwrap(), 2);
}

#[test]
fn sparse_index_access_skips_unset_fields() {
    let mut e = Encoder::new();
    e.put_i32(0, 10).unwrap();
    e.put_i32(3, 30).unwrap();
    e.put_i32(200, 2000).unwrap();
    let bytes = e.finish();
    let d = Decoder::new(&bytes).unwrap();
    assert_eq!(d.get_i32(0).unwrap(), 10);
    assert_eq!(d.get_i32(3).unwrap(), 30);
    assert_eq!(d.get_i32(200).unwrap(), 2000);
    assert_eq!(d.get_i32_or(1, -1).unwrap(), -1);
    assert_eq!(d.get_i32_or(150, -1).unwrap(), -1);
}

#[test]
fn wide_message_round_trips_every_field_kind() {
    let value = Wide {
        a: -42,
        b: 9_000_000_000,
        c: 3.5,
        d: "round trip".to_string(),
        e: vec![1, -2, 3],
        f: Some(Inner { value: 99 }),
        g: vec![true, false, true, true, false, false, true, false, true],
        h: vec![0, 1, 2, 3, 1, 0],
    };
    let mut e = Encoder::new();
    value.encode(&mut e).unwrap();
    let bytes = e.finish();
    let d = Decoder::new(&bytes).unwrap();
    let decoded = Wide::decode(&d).unwrap();
    assert_eq!(decoded.a, value.a);
    assert_eq!(decoded.b, value.b);
    assert_eq!(decoded.c, value.c);
    assert_eq!(decoded.d, value.d);
    assert_eq!(decoded.e, value.e);
    assert_eq!(decoded.f.unwrap().value, value.f.unwrap().value);
    assert_eq!(decoded.g, value.g);
    assert_eq!(decoded.h, value.h);
}

#[test]
fn truncated_message_is_rejected_as_corrupt() {
    let mut e = Encoder::new();
    e.put_string(0, "hello").unwrap();
    let mut bytes = e.finish();
    bytes.truncate(bytes.len() - 2);
    let d = Decoder::new(&bytes).unwrap();
    assert!(matches!(d.get_string_ref(0), Err(Error::Corrupt)));
}

#[test]
fn duplicate_field_index_is_rejected_as_corrupt() {
    // Two zero-value records at index 0: tag byte 0x00 appears twice.
    let bytes = vec![0x00, 0x00];
    let d = Decoder::new(&bytes).unwrap();
    assert!(matches!(d.get_i32(0), Err(Error::Corrupt)));
}

#[test]
fn oversized_message_is_rejected_before_scanning() {
    let bytes = vec![0u8; (1usize << 30) + 1];
    assert!(matches!(Decoder::new(&bytes), Err(Error::CapacityOverflow)));
}

#[test]
fn width_is_minimal_for_each_magnitude() {
    let mut e = Encoder::new();
    e.put_i32(0, 0).unwrap();
    e.put_i32(1, 1).unwrap();
    e.put_i32(2, 1000).unwrap();
    e.put_i32(3, 100_000).unwrap();
    let bytes = e.finish();
    // zero: tag only (1 byte). 1: tag + 1-byte payload. 1000: tag + 2-byte payload.
    // 100_000: tag + 4-byte payload (exceeds 16 bits).
    assert_eq!(bytes.len(), 1 + 2 + 3 + 5);
}

#[test]
fn repeated_encode_decode_cycles_are_pool_neutral() {
    for i in 0..10_000i32 {
        let mut e = Encoder::new();
        e.put_i32(0, i).unwrap();
        e.put_string(1, "cycle").unwrap();
        let bytes = e.finish();
        let d = Decoder::new(&bytes).unwrap();
        assert_eq!(d.get_i32(0).unwrap(), i);
        assert_eq!(d.get_string_ref(1).unwrap(), Some("cycle"));
    }
}
