#![warn(clippy::pedantic)]

pub mod cursor;
pub mod error;
pub mod source;
pub mod varint;

pub use cursor::{BinaryCursor, DEFAULT_MAX_BYTES_LEN};
pub use error::WireError;
pub use source::{ByteSource, ReaderSource, SliceSource};
