use crate::error::WireError;
use crate::source::ByteSource;
use crate::varint::{MAX_VARINT_BYTES, decode_zigzag};

/// Default cap on a single length-prefixed or fixed payload (16 MiB).
pub const DEFAULT_MAX_BYTES_LEN: usize = 16 * 1024 * 1024;

/// Sequential decoder for the primitive encodings of the binary format.
///
/// Every read advances the underlying [`ByteSource`] by exactly the bytes
/// it consumes. Nothing is ever re-read, so a failure leaves the cursor in
/// an unspecified position and the session must be abandoned.
///
/// ```text
/// ┌────────────────────┬──────────────────────────────────────────────┐
/// │ Primitive          │ Encoding                                     │
/// ├────────────────────┼──────────────────────────────────────────────┤
/// │ int / long         │ zig-zag varint                               │
/// │ float / double     │ 4 / 8 bytes little-endian IEEE 754           │
/// │ boolean            │ one byte, 0x00 or 0x01                       │
/// │ bytes / string     │ long length, then that many bytes            │
/// │ fixed              │ schema-declared number of bytes              │
/// │ union branch       │ long index                                   │
/// │ block count        │ long count; negative → long size follows     │
/// └────────────────────┴──────────────────────────────────────────────┘
/// ```
///
/// Length-prefixed reads write into a caller-owned `Vec<u8>` so that one
/// allocation can serve every string and bytes value of a session.
#[derive(Debug)]
pub struct BinaryCursor<S> {
    source: S,
    max_bytes_len: usize,
}

impl<S: ByteSource> BinaryCursor<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_limit(source, DEFAULT_MAX_BYTES_LEN)
    }

    /// Create a cursor that rejects payloads longer than `max_bytes_len`.
    #[must_use]
    pub fn with_limit(source: S, max_bytes_len: usize) -> Self {
        Self {
            source,
            max_bytes_len,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Whether the source is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures from streaming sources.
    pub fn at_end(&mut self) -> Result<bool, WireError> {
        self.source.at_end()
    }

    /// Read a zig-zag varint `long`.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if input ends mid-varint.
    /// - [`WireError::VarintTooLong`] after 10 continuation bytes.
    pub fn read_long(&mut self) -> Result<i64, WireError> {
        let start = self.position();
        let mut raw: u64 = 0;
        let mut shift: u32 = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.source.read_u8()?;
            raw |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(decode_zigzag(raw));
            }
            shift += 7;
        }

        Err(WireError::VarintTooLong { offset: start })
    }

    /// Read a zig-zag varint `int`.
    ///
    /// # Errors
    ///
    /// Everything [`read_long`](Self::read_long) raises, plus
    /// [`WireError::IntOverflow`] when the value exceeds 32 bits.
    pub fn read_int(&mut self) -> Result<i32, WireError> {
        let start = self.position();
        let value = self.read_long()?;
        i32::try_from(value).map_err(|_| WireError::IntOverflow {
            value,
            offset: start,
        })
    }

    /// Read a little-endian IEEE 754 single.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_float(&mut self) -> Result<f32, WireError> {
        let mut raw = [0u8; 4];
        self.source.read_exact(&mut raw)?;
        Ok(f32::from_le_bytes(raw))
    }

    /// Read a little-endian IEEE 754 double.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than 8 bytes remain.
    pub fn read_double(&mut self) -> Result<f64, WireError> {
        let mut raw = [0u8; 8];
        self.source.read_exact(&mut raw)?;
        Ok(f64::from_le_bytes(raw))
    }

    /// Read a one-byte boolean.
    ///
    /// # Errors
    ///
    /// [`WireError::InvalidBool`] for any byte other than 0 or 1.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        let offset = self.position();
        match self.source.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(WireError::InvalidBool { value, offset }),
        }
    }

    /// Read a length-prefixed payload into `buf`, replacing its contents.
    ///
    /// The buffer keeps its capacity, so repeated reads of similar sizes
    /// do not reallocate.
    ///
    /// # Errors
    ///
    /// - [`WireError::NegativeLength`] for a length below zero.
    /// - [`WireError::LengthLimitExceeded`] for a length above the limit.
    /// - [`WireError::UnexpectedEof`] if the payload is truncated. `buf`
    ///   contents are unspecified afterwards.
    pub fn read_bytes_into(&mut self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        let offset = self.position();
        let length = self.read_long()?;
        let len = usize::try_from(length)
            .map_err(|_| WireError::NegativeLength { length, offset })?;
        self.fill_buf(buf, len, offset)
    }

    /// Read a length-prefixed UTF-8 string into `buf`.
    ///
    /// # Errors
    ///
    /// Everything [`read_bytes_into`](Self::read_bytes_into) raises, plus
    /// [`WireError::InvalidUtf8`].
    pub fn read_string_into<'b>(&mut self, buf: &'b mut Vec<u8>) -> Result<&'b str, WireError> {
        let offset = self.position();
        self.read_bytes_into(buf)?;
        std::str::from_utf8(buf).map_err(|_| WireError::InvalidUtf8 { offset })
    }

    /// Read exactly `size` bytes into `buf`, replacing its contents.
    ///
    /// # Errors
    ///
    /// [`WireError::LengthLimitExceeded`] or [`WireError::UnexpectedEof`].
    pub fn read_fixed_into(&mut self, buf: &mut Vec<u8>, size: usize) -> Result<(), WireError> {
        let offset = self.position();
        self.fill_buf(buf, size, offset)
    }

    /// Read a union branch index. Range checking is the caller's job since
    /// only the schema knows the branch count.
    ///
    /// # Errors
    ///
    /// Same as [`read_long`](Self::read_long).
    pub fn read_union_index(&mut self) -> Result<i64, WireError> {
        self.read_long()
    }

    /// Read one block header of an array or map.
    ///
    /// ```text
    ///   count  > 0 : count items follow
    ///   count == 0 : end of collection
    ///   count  < 0 : byte-size (long) follows, then |count| items
    /// ```
    ///
    /// The byte-size is consumed and discarded; readers that decode every
    /// item have no use for it.
    ///
    /// # Errors
    ///
    /// [`WireError::MalformedBlockCount`] for a count of `i64::MIN` or a
    /// negative byte-size, plus anything [`read_long`](Self::read_long)
    /// raises.
    pub fn read_block_count(&mut self) -> Result<u64, WireError> {
        let offset = self.position();
        let count = self.read_long()?;
        if count >= 0 {
            return Ok(count.unsigned_abs());
        }
        if count == i64::MIN {
            return Err(WireError::MalformedBlockCount { count, offset });
        }
        let size = self.read_long()?;
        if size < 0 {
            return Err(WireError::MalformedBlockCount { count, offset });
        }
        Ok(count.unsigned_abs())
    }

    fn fill_buf(&mut self, buf: &mut Vec<u8>, len: usize, offset: usize) -> Result<(), WireError> {
        if len > self.max_bytes_len {
            return Err(WireError::LengthLimitExceeded {
                length: len as u64,
                limit: self.max_bytes_len,
                offset,
            });
        }
        buf.clear();
        buf.resize(len, 0);
        self.source.read_exact(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SliceSource;
    use crate::varint::encode_long;

    fn cursor(bytes: &[u8]) -> BinaryCursor<SliceSource<'_>> {
        BinaryCursor::new(SliceSource::new(bytes))
    }

    fn long_bytes(values: &[i64]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut scratch = [0u8; MAX_VARINT_BYTES];
        for &v in values {
            let n = encode_long(v, &mut scratch);
            out.extend_from_slice(&scratch[..n]);
        }
        out
    }

    #[test]
    fn reads_longs_in_sequence() {
        let bytes = long_bytes(&[0, -1, 1, 300, i64::MIN]);
        let mut c = cursor(&bytes);
        assert_eq!(c.read_long().unwrap(), 0);
        assert_eq!(c.read_long().unwrap(), -1);
        assert_eq!(c.read_long().unwrap(), 1);
        assert_eq!(c.read_long().unwrap(), 300);
        assert_eq!(c.read_long().unwrap(), i64::MIN);
        assert!(c.at_end().unwrap());
    }

    #[test]
    fn long_too_long() {
        let mut c = cursor(&[0xFF; 12]);
        assert!(matches!(
            c.read_long(),
            Err(WireError::VarintTooLong { offset: 0 })
        ));
    }

    #[test]
    fn int_out_of_range() {
        let bytes = long_bytes(&[i64::from(i32::MAX) + 1]);
        let mut c = cursor(&bytes);
        assert!(matches!(
            c.read_int(),
            Err(WireError::IntOverflow { offset: 0, .. })
        ));
    }

    #[test]
    fn int_extremes() {
        let bytes = long_bytes(&[i64::from(i32::MIN), i64::from(i32::MAX)]);
        let mut c = cursor(&bytes);
        assert_eq!(c.read_int().unwrap(), i32::MIN);
        assert_eq!(c.read_int().unwrap(), i32::MAX);
    }

    #[test]
    fn floats_are_little_endian() {
        let mut bytes = 1.5f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut c = cursor(&bytes);
        assert_eq!(c.read_float().unwrap(), 1.5);
        assert_eq!(c.read_double().unwrap(), -2.25);
    }

    #[test]
    fn bool_bytes() {
        let mut c = cursor(&[0x00, 0x01, 0x02]);
        assert!(!c.read_bool().unwrap());
        assert!(c.read_bool().unwrap());
        assert!(matches!(
            c.read_bool(),
            Err(WireError::InvalidBool { value: 2, offset: 2 })
        ));
    }

    #[test]
    fn bytes_reuse_buffer_capacity() {
        let mut bytes = long_bytes(&[5]);
        bytes.extend_from_slice(b"hello");
        bytes.extend_from_slice(&long_bytes(&[2]));
        bytes.extend_from_slice(b"hi");

        let mut c = cursor(&bytes);
        let mut buf = Vec::with_capacity(16);
        let ptr = buf.as_ptr();
        c.read_bytes_into(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
        c.read_bytes_into(&mut buf).unwrap();
        assert_eq!(buf, b"hi");
        assert_eq!(buf.as_ptr(), ptr, "buffer must not be reallocated");
    }

    #[test]
    fn negative_length_rejected() {
        let bytes = long_bytes(&[-3]);
        let mut c = cursor(&bytes);
        let mut buf = Vec::new();
        assert!(matches!(
            c.read_bytes_into(&mut buf),
            Err(WireError::NegativeLength { length: -3, offset: 0 })
        ));
    }

    #[test]
    fn length_limit_enforced_before_allocation() {
        let bytes = long_bytes(&[1_000_000]);
        let mut c = BinaryCursor::with_limit(SliceSource::new(&bytes), 1024);
        let mut buf = Vec::new();
        assert!(matches!(
            c.read_bytes_into(&mut buf),
            Err(WireError::LengthLimitExceeded { length: 1_000_000, limit: 1024, .. })
        ));
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn truncated_string() {
        let mut bytes = long_bytes(&[2]);
        bytes.push(b'A');
        let mut c = cursor(&bytes);
        let mut buf = Vec::new();
        assert!(matches!(
            c.read_string_into(&mut buf),
            Err(WireError::UnexpectedEof { offset: 2 })
        ));
    }

    #[test]
    fn invalid_utf8_string() {
        let mut bytes = long_bytes(&[2]);
        bytes.extend_from_slice(&[0xC3, 0x28]);
        let mut c = cursor(&bytes);
        let mut buf = Vec::new();
        assert!(matches!(
            c.read_string_into(&mut buf),
            Err(WireError::InvalidUtf8 { offset: 0 })
        ));
    }

    #[test]
    fn fixed_reads_exact_size() {
        let mut c = cursor(&[1, 2, 3, 4]);
        let mut buf = Vec::new();
        c.read_fixed_into(&mut buf, 3).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(c.position(), 3);
    }

    #[test]
    fn block_counts() {
        // positive, negative with size, zero
        let bytes = long_bytes(&[3, -2, 10, 0]);
        let mut c = cursor(&bytes);
        assert_eq!(c.read_block_count().unwrap(), 3);
        assert_eq!(c.read_block_count().unwrap(), 2);
        assert_eq!(c.read_block_count().unwrap(), 0);
        assert!(c.at_end().unwrap());
    }

    #[test]
    fn block_count_min_is_malformed() {
        let bytes = long_bytes(&[i64::MIN]);
        let mut c = cursor(&bytes);
        assert!(matches!(
            c.read_block_count(),
            Err(WireError::MalformedBlockCount { count: i64::MIN, offset: 0 })
        ));
    }

    #[test]
    fn block_count_negative_size_is_malformed() {
        let bytes = long_bytes(&[-1, -5]);
        let mut c = cursor(&bytes);
        assert!(matches!(
            c.read_block_count(),
            Err(WireError::MalformedBlockCount { count: -1, .. })
        ));
    }
}
