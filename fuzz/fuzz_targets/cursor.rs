#![no_main]

use avp_wire::{BinaryCursor, SliceSource};
use libfuzzer_sys::fuzz_target;

// Fuzz target: primitive reads on arbitrary bytes.
//
// The first byte picks a read sequence, the rest is the input. Catches
// panics and unbounded allocation in:
// - Varint decoding (overlong and truncated encodings)
// - Length-prefixed reads (negative and oversized lengths)
// - Block headers (i64::MIN counts, negative byte sizes)
fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let mut cursor = BinaryCursor::with_limit(SliceSource::new(input), 1 << 16);
    let mut buf = Vec::new();

    for step in 0..64u8 {
        let result = match selector.wrapping_add(step) % 7 {
            0 => cursor.read_long().map(drop),
            1 => cursor.read_int().map(drop),
            2 => cursor.read_bool().map(drop),
            3 => cursor.read_double().map(drop),
            4 => cursor.read_bytes_into(&mut buf),
            5 => cursor.read_string_into(&mut buf).map(drop),
            _ => cursor.read_block_count().map(drop),
        };
        if result.is_err() {
            break;
        }
        assert!(cursor.position() <= input.len());
    }
});
