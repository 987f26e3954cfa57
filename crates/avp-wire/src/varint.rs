use crate::error::WireError;

/// Maximum number of bytes a zig-zag encoded `long` can occupy.
/// ceil(64 / 7) = 10 bytes.
pub const MAX_VARINT_BYTES: usize = 10;

/// Map a signed value onto an unsigned one so that small magnitudes of
/// either sign encode to short varints.
///
/// | Signed | Zig-zag |
/// |--------|---------|
/// | 0      | 0       |
/// | -1     | 1       |
/// | 1      | 2       |
/// | -2     | 3       |
/// | 2      | 4       |
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn encode_zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`encode_zigzag`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn decode_zigzag(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

/// Encode an `i64` as a zig-zag varint into the provided buffer.
///
/// # Returns
///
/// The number of bytes written (1–10).
///
/// # Panics
///
/// Panics if `buf` is shorter than the required encoding length.
/// A 10-byte buffer is always sufficient.
///
/// # Wire format examples
///
/// | Value | Encoded bytes  |
/// |-------|----------------|
/// | 0     | `[0x00]`       |
/// | -1    | `[0x01]`       |
/// | 1     | `[0x02]`       |
/// | -64   | `[0x7F]`       |
/// | 64    | `[0x80, 0x01]` |
pub fn encode_long(value: i64, buf: &mut [u8]) -> usize {
    let mut raw = encode_zigzag(value);
    let mut i = 0;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (raw & 0x7F) as u8;
        raw >>= 7;
        if raw > 0 {
            byte |= 0x80;
        }
        buf[i] = byte;
        i += 1;
        if raw == 0 {
            return i;
        }
    }
}

/// Decode a zig-zag varint from the front of `buf`.
///
/// # Returns
///
/// `(decoded_value, bytes_consumed)` on success.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] if 10 bytes pass without a terminator.
/// - [`WireError::UnexpectedEof`] if the slice ends mid-varint.
pub fn decode_long(buf: &[u8]) -> Result<(i64, usize), WireError> {
    let mut raw: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_BYTES {
            return Err(WireError::VarintTooLong { offset: 0 });
        }

        raw |= u64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((decode_zigzag(raw), i + 1));
        }
    }

    Err(WireError::UnexpectedEof { offset: buf.len() })
}
