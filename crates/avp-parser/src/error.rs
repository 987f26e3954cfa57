use avp_wire::WireError;

use crate::context::ContextKind;

/// Errors that can occur while pulling tokens.
///
/// Every error is terminal: the cursor may have consumed part of a value,
/// so the session cannot be resumed. Further pulls return
/// [`DecodeError::Aborted`].
///
/// ```text
///   DecodeError
///   ├── TruncatedInput        ← input ended mid-value
///   ├── InvalidUnionBranch    ← branch index outside the union
///   ├── MalformedBlockLength  ← array/map block header inconsistent
///   ├── InvalidEnumIndex      ← symbol index outside the enum
///   ├── DepthLimitExceeded    ← frame stack deeper than configured
///   ├── BlockLimitExceeded    ← array/map block larger than configured
///   ├── TrailingData          ← bytes left that no root value explains
///   ├── InvalidWindow         ← slice window outside the buffer
///   ├── SchemaMismatch        ← reserved for schema resolution layers
///   ├── Aborted               ← pull after a failed pull
///   └── Wire { WireError }    ← any other cursor failure
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The byte source ran out before the value being decoded was complete.
    #[error("truncated input at offset {offset} in {context} context")]
    TruncatedInput { offset: usize, context: ContextKind },

    /// A union branch index was negative or not below the branch count.
    #[error("union branch {index} out of range ({branches} branches) at offset {offset}")]
    InvalidUnionBranch {
        index: i64,
        branches: usize,
        offset: usize,
    },

    /// A block header of an array or map could not be interpreted.
    #[error("malformed block length {count} at offset {offset} in {context} context")]
    MalformedBlockLength {
        count: i64,
        offset: usize,
        context: ContextKind,
    },

    /// An enum symbol index was negative or not below the symbol count.
    #[error("enum index {index} out of range ({symbols} symbols) at offset {offset}")]
    InvalidEnumIndex {
        index: i32,
        symbols: usize,
        offset: usize,
    },

    /// Descending would open more frames than `ParserConfig::max_depth`.
    #[error("nesting depth exceeds limit {limit} at offset {offset} in {context} context")]
    DepthLimitExceeded {
        limit: usize,
        offset: usize,
        context: ContextKind,
    },

    /// An array or map block announced more items than
    /// `ParserConfig::max_block_items`.
    #[error("block of {count} items exceeds limit {limit} at offset {offset} in {context} context")]
    BlockLimitExceeded {
        count: u64,
        limit: u64,
        offset: usize,
        context: ContextKind,
    },

    /// Bytes remain that do not belong to any root value.
    ///
    /// Raised in `RootMode::Single` after the root value, and in
    /// `RootMode::Sequence` when a root value consumed no bytes at all
    /// (a `null` root over non-empty input), which would otherwise
    /// repeat forever.
    #[error("unexpected data after root value at offset {offset}")]
    TrailingData { offset: usize },

    /// The requested window does not fit inside the input buffer.
    #[error("window {offset}+{len} exceeds input of {available} bytes")]
    InvalidWindow {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// Writer and reader schemas disagree.
    ///
    /// Never raised by the parser itself; schema resolution layers that
    /// wrap it report through this variant.
    #[error("schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    /// A token was requested after an earlier pull failed.
    #[error("session aborted by an earlier decode error")]
    Aborted,

    /// Any other failure of the binary cursor.
    #[error("{source} in {context} context")]
    Wire {
        source: WireError,
        context: ContextKind,
    },
}

impl DecodeError {
    /// Attach the active context to a cursor failure.
    pub(crate) fn from_wire(source: WireError, context: ContextKind) -> Self {
        match source {
            WireError::UnexpectedEof { offset } => Self::TruncatedInput { offset, context },
            WireError::MalformedBlockCount { count, offset } => Self::MalformedBlockLength {
                count,
                offset,
                context,
            },
            source => Self::Wire { source, context },
        }
    }

    /// Byte offset of the failure, when one is known.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::TruncatedInput { offset, .. }
            | Self::InvalidUnionBranch { offset, .. }
            | Self::MalformedBlockLength { offset, .. }
            | Self::InvalidEnumIndex { offset, .. }
            | Self::DepthLimitExceeded { offset, .. }
            | Self::BlockLimitExceeded { offset, .. }
            | Self::TrailingData { offset }
            | Self::InvalidWindow { offset, .. } => Some(*offset),
            Self::Wire { source, .. } => source.offset(),
            Self::SchemaMismatch { .. } | Self::Aborted => None,
        }
    }

    /// Kind of frame that was active when the failure happened.
    #[must_use]
    pub fn context(&self) -> Option<ContextKind> {
        match self {
            Self::TruncatedInput { context, .. }
            | Self::MalformedBlockLength { context, .. }
            | Self::DepthLimitExceeded { context, .. }
            | Self::BlockLimitExceeded { context, .. }
            | Self::Wire { context, .. } => Some(*context),
            Self::InvalidUnionBranch { .. } => Some(ContextKind::Union),
            Self::InvalidEnumIndex { .. } => Some(ContextKind::Scalar),
            Self::TrailingData { .. } => Some(ContextKind::Root),
            Self::InvalidWindow { .. }
            | Self::SchemaMismatch { .. }
            | Self::Aborted => None,
        }
    }
}
