//! Shared helpers for the avp integration tests, benches, and fuzz targets.
//!
//! - [`encode`]: a minimal writer for the binary encoding, driven by the
//!   same [`Schema`](avp_schema::Schema) the parser reads with.
//! - [`json`]: logical-value views used to compare what was written with
//!   what the token stream describes.
//! - [`transcript`]: one-token-per-line renderings for snapshot tests.
//! - [`flaky`]: a reader that fails on cue, for I/O error paths.

pub mod encode;
pub mod flaky;
pub mod json;
pub mod transcript;

pub use encode::{BlockLayout, Datum, EncodeError, encode, write_datum};
pub use flaky::FlakyReader;
pub use json::{JsonError, datum_to_json, tokens_to_json};
pub use transcript::transcript;
