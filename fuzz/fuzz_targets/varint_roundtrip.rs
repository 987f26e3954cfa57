#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: zig-zag varint encode->decode roundtrip.
//
// Takes 8 bytes of fuzz input, interprets them as an i64, encodes it as a
// zig-zag varint, then decodes it and asserts value and length match.
fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let value = i64::from_le_bytes(data[..8].try_into().unwrap());

    let mut buf = [0u8; avp_wire::varint::MAX_VARINT_BYTES];
    let encoded_len = avp_wire::varint::encode_long(value, &mut buf);

    let (decoded, decoded_len) = avp_wire::varint::decode_long(&buf[..encoded_len]).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded_len, encoded_len);
});
