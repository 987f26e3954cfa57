/// Errors raised by the binary cursor and its byte sources.
///
/// Every variant that can be located carries the byte offset (counted from
/// the start of the source) at which the problem was detected. The parser
/// crate attaches the active read context on top of this.
///
/// ```text
///   WireError
///   ├── UnexpectedEof        ← input ended mid-value (truncated input)
///   ├── VarintTooLong        ← varint ran past 10 bytes
///   ├── IntOverflow          ← int value does not fit in 32 bits
///   ├── InvalidBool          ← boolean byte other than 0 or 1
///   ├── NegativeLength       ← length prefix below zero
///   ├── LengthLimitExceeded  ← length prefix above the configured limit
///   ├── MalformedBlockCount  ← collection block header is inconsistent
///   ├── InvalidUtf8          ← string payload is not UTF-8
///   └── Io(std::io::Error)   ← from a streaming source
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Input ended before the value being read was complete.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A varint did not terminate within 10 bytes.
    #[error("varint at offset {offset} exceeded 10-byte limit")]
    VarintTooLong { offset: usize },

    /// An `int` value was encoded outside the 32-bit range.
    #[error("int value {value} at offset {offset} does not fit in 32 bits")]
    IntOverflow { value: i64, offset: usize },

    /// A boolean byte was neither 0x00 nor 0x01.
    #[error("invalid boolean byte {value:#04X} at offset {offset}")]
    InvalidBool { value: u8, offset: usize },

    /// A length prefix was negative.
    #[error("negative length {length} at offset {offset}")]
    NegativeLength { length: i64, offset: usize },

    /// A length prefix exceeded the cursor's allocation limit.
    #[error("length {length} at offset {offset} exceeds limit {limit}")]
    LengthLimitExceeded {
        length: u64,
        limit: usize,
        offset: usize,
    },

    /// A collection block header could not be interpreted.
    ///
    /// Raised for a count of `i64::MIN` (its magnitude is not
    /// representable) and for a negative byte-size after a negative count.
    #[error("malformed block count {count} at offset {offset}")]
    MalformedBlockCount { count: i64, offset: usize },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// I/O error from a streaming source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// The byte offset this error refers to, when one is known.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEof { offset }
            | Self::VarintTooLong { offset }
            | Self::IntOverflow { offset, .. }
            | Self::InvalidBool { offset, .. }
            | Self::NegativeLength { offset, .. }
            | Self::LengthLimitExceeded { offset, .. }
            | Self::MalformedBlockCount { offset, .. }
            | Self::InvalidUtf8 { offset } => Some(*offset),
            Self::Io(_) => None,
        }
    }
}
