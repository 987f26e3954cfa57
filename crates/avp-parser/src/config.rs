use avp_wire::DEFAULT_MAX_BYTES_LEN;

/// Default cap on the item count of one array or map block.
pub const DEFAULT_MAX_BLOCK_ITEMS: u64 = 1 << 24;

/// Configuration for a [`TokenParser`](crate::TokenParser) session.
///
/// ```text
/// ┌─────────────────┬───────────┬────────────────────────────────────────┐
/// │ Field           │ Default   │ Purpose                                │
/// ├─────────────────┼───────────┼────────────────────────────────────────┤
/// │ max_depth       │ 256       │ open frames allowed below the root     │
/// │ max_bytes_len   │ 16 MiB    │ largest string/bytes/fixed payload     │
/// │ max_block_items │ 2^24      │ largest item count of one array/map    │
/// │                 │           │ block                                  │
/// │ root_mode       │ Sequence  │ one root value, or values until EOF    │
/// └─────────────────┴───────────┴────────────────────────────────────────┘
/// ```
///
/// The limits guard against hostile input. A length prefix is checked
/// before anything is allocated for it, and deeply recursive schemas
/// cannot grow the frame stack without bound.
///
/// Items that encode to zero bytes (`null`, a record without fields) let a
/// block header of a few bytes announce any number of tokens. Every block
/// costs at least one header byte, so `max_block_items` caps the tokens an
/// input can produce at roughly `max_block_items` per input byte. Lower it
/// when collections of such items are expected from untrusted sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of frames open at once, not counting the root.
    /// Scalar values occupy a frame while they are decoded.
    pub max_depth: usize,

    /// Maximum length of one length-prefixed or fixed-size payload.
    pub max_bytes_len: usize,

    /// Maximum item count announced by one array or map block header.
    pub max_block_items: u64,

    /// How many root values the byte source holds.
    pub root_mode: RootMode,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_bytes_len: DEFAULT_MAX_BYTES_LEN,
            max_block_items: DEFAULT_MAX_BLOCK_ITEMS,
            root_mode: RootMode::default(),
        }
    }
}

/// How the root frame treats the byte source.
///
/// ```text
/// ┌──────────┬───────────────────────────────────────────────────────┐
/// │ Mode     │ Behavior                                              │
/// ├──────────┼───────────────────────────────────────────────────────┤
/// │ Sequence │ Decode root values back to back until input is        │
/// │          │ exhausted. Empty input yields no tokens.              │
/// │ Single   │ Decode exactly one root value. Any byte left over is  │
/// │          │ a TrailingData error.                                 │
/// └──────────┴───────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RootMode {
    #[default]
    Sequence,
    Single,
}
