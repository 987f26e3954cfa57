//! Read contexts: one frame per open shape on the traversal stack.
//!
//! A frame knows how to produce the next step for its shape and nothing
//! else. The driver in [`crate::parser`] owns the stack and interprets the
//! steps:
//!
//! ```text
//!   Step::Emit(token)      → hand the token to the caller
//!   Step::Descend(schema)  → push a frame for `schema`, ask it instead
//!   Step::Exhausted        → pop this frame, ask the parent
//! ```
//!
//! Frames borrow their schema nodes for the whole session. State lives in
//! small enums, so the stack is a plain `Vec` of tagged values with no
//! dynamic dispatch and no parent pointers (the parent is the frame below).

use std::fmt;

use avp_schema::{Field, Schema};
use avp_wire::{BinaryCursor, ByteSource, WireError};
use log::trace;

use crate::config::RootMode;
use crate::error::DecodeError;
use crate::scratch::Scratchpad;

/// Kind of read context, reported with decode errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Root,
    Record,
    Array,
    Map,
    Union,
    Scalar,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Root => "root",
            Self::Record => "record",
            Self::Array => "array",
            Self::Map => "map",
            Self::Union => "union",
            Self::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// What a frame produced. Scalar payloads that live in the scratchpad
/// (`Key`, `Text`, `Bytes`) are read back from it when the token is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Emitted<'s> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// Record field name, borrowed from the schema.
    Field(&'s str),
    /// Map key, held as text in the scratchpad.
    Key,
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text,
    /// Enum symbol, borrowed from the schema.
    Symbol(&'s str),
    Bytes,
}

pub(crate) enum Step<'s> {
    Emit(Emitted<'s>),
    Descend(&'s Schema),
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RootState {
    Fresh,
    /// A root value began at this offset.
    Started(usize),
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecordState {
    Start,
    Name(usize),
    Value(usize),
    Done,
}

/// Progress through a block-encoded collection.
///
/// `Items(n)` means `n` items of the current block are still to come; at
/// zero the next block header is read. Maps spend one extra step per entry
/// in `Value(n)` between emitting the key and descending into the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockState {
    Start,
    Items(u64),
    Value(u64),
    Done,
}

/// Leaf kinds, resolved once when the frame is built.
#[derive(Clone, Copy, Debug)]
enum Leaf<'s> {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Enum(&'s [String]),
    Fixed(usize),
}

#[derive(Debug)]
pub(crate) enum Frame<'s> {
    Root {
        schema: &'s Schema,
        mode: RootMode,
        state: RootState,
    },
    Record {
        fields: &'s [Field],
        state: RecordState,
    },
    Array {
        items: &'s Schema,
        state: BlockState,
    },
    Map {
        values: &'s Schema,
        state: BlockState,
    },
    Union {
        branches: &'s [Schema],
        resolved: bool,
    },
    Scalar {
        leaf: Leaf<'s>,
        emitted: bool,
    },
}

fn within(context: ContextKind) -> impl Fn(WireError) -> DecodeError {
    move |e| DecodeError::from_wire(e, context)
}

impl<'s> Frame<'s> {
    pub(crate) fn root(schema: &'s Schema, mode: RootMode) -> Self {
        Self::Root {
            schema,
            mode,
            state: RootState::Fresh,
        }
    }

    /// The frame that decodes one value of `schema`.
    pub(crate) fn for_schema(schema: &'s Schema) -> Self {
        let leaf = match schema {
            Schema::Record { fields, .. } => {
                return Self::Record {
                    fields,
                    state: RecordState::Start,
                };
            }
            Schema::Array { items } => {
                return Self::Array {
                    items,
                    state: BlockState::Start,
                };
            }
            Schema::Map { values } => {
                return Self::Map {
                    values,
                    state: BlockState::Start,
                };
            }
            Schema::Union { branches } => {
                return Self::Union {
                    branches,
                    resolved: false,
                };
            }
            Schema::Null => Leaf::Null,
            Schema::Boolean => Leaf::Boolean,
            Schema::Int => Leaf::Int,
            Schema::Long => Leaf::Long,
            Schema::Float => Leaf::Float,
            Schema::Double => Leaf::Double,
            Schema::String => Leaf::String,
            Schema::Bytes => Leaf::Bytes,
            Schema::Enum { symbols, .. } => Leaf::Enum(symbols),
            Schema::Fixed { size, .. } => Leaf::Fixed(*size),
        };
        Self::Scalar {
            leaf,
            emitted: false,
        }
    }

    pub(crate) fn kind(&self) -> ContextKind {
        match self {
            Self::Root { .. } => ContextKind::Root,
            Self::Record { .. } => ContextKind::Record,
            Self::Array { .. } => ContextKind::Array,
            Self::Map { .. } => ContextKind::Map,
            Self::Union { .. } => ContextKind::Union,
            Self::Scalar { .. } => ContextKind::Scalar,
        }
    }

    /// Advance this frame by one step, decoding from `cursor` as needed.
    ///
    /// Collection frames reject block headers announcing more than
    /// `max_block_items` items.
    pub(crate) fn next<S: ByteSource>(
        &mut self,
        cursor: &mut BinaryCursor<S>,
        scratch: &mut Scratchpad,
        max_block_items: u64,
    ) -> Result<Step<'s>, DecodeError> {
        match self {
            Self::Root {
                schema,
                mode,
                state,
            } => next_root(*schema, *mode, state, cursor),
            Self::Record { fields, state } => Ok(next_record(*fields, state)),
            Self::Array { items, state } => next_array(*items, state, cursor, max_block_items),
            Self::Map { values, state } => {
                next_map(*values, state, cursor, scratch, max_block_items)
            }
            Self::Union { branches, resolved } => next_union(*branches, resolved, cursor),
            Self::Scalar { leaf, emitted } => {
                if *emitted {
                    return Ok(Step::Exhausted);
                }
                *emitted = true;
                decode_leaf(*leaf, cursor, scratch).map(Step::Emit)
            }
        }
    }
}

fn next_root<'s, S: ByteSource>(
    schema: &'s Schema,
    mode: RootMode,
    state: &mut RootState,
    cursor: &mut BinaryCursor<S>,
) -> Result<Step<'s>, DecodeError> {
    let offset = cursor.position();

    match (*state, mode) {
        (RootState::Finished, _) => Ok(Step::Exhausted),
        (RootState::Fresh, RootMode::Single) => {
            *state = RootState::Started(offset);
            Ok(Step::Descend(schema))
        }
        (RootState::Started(_), RootMode::Single) => {
            *state = RootState::Finished;
            if cursor.at_end().map_err(within(ContextKind::Root))? {
                Ok(Step::Exhausted)
            } else {
                Err(DecodeError::TrailingData { offset })
            }
        }
        (RootState::Fresh | RootState::Started(_), RootMode::Sequence) => {
            if cursor.at_end().map_err(within(ContextKind::Root))? {
                *state = RootState::Finished;
                return Ok(Step::Exhausted);
            }
            if *state == RootState::Started(offset) {
                return Err(DecodeError::TrailingData { offset });
            }
            trace!("root value starts at offset {offset}");
            *state = RootState::Started(offset);
            Ok(Step::Descend(schema))
        }
    }
}

fn next_record<'s>(fields: &'s [Field], state: &mut RecordState) -> Step<'s> {
    match *state {
        RecordState::Start => {
            *state = RecordState::Name(0);
            Step::Emit(Emitted::StartObject)
        }
        RecordState::Name(i) => match fields.get(i) {
            Some(field) => {
                *state = RecordState::Value(i);
                Step::Emit(Emitted::Field(&field.name))
            }
            None => {
                *state = RecordState::Done;
                Step::Emit(Emitted::EndObject)
            }
        },
        RecordState::Value(i) => {
            *state = RecordState::Name(i + 1);
            Step::Descend(&fields[i].schema)
        }
        RecordState::Done => Step::Exhausted,
    }
}

fn next_array<'s, S: ByteSource>(
    items: &'s Schema,
    state: &mut BlockState,
    cursor: &mut BinaryCursor<S>,
    limit: u64,
) -> Result<Step<'s>, DecodeError> {
    match *state {
        BlockState::Start => {
            *state = BlockState::Items(0);
            Ok(Step::Emit(Emitted::StartArray))
        }
        BlockState::Items(remaining) => {
            let remaining = refill(remaining, cursor, limit, ContextKind::Array)?;
            if remaining == 0 {
                *state = BlockState::Done;
                return Ok(Step::Emit(Emitted::EndArray));
            }
            *state = BlockState::Items(remaining - 1);
            Ok(Step::Descend(items))
        }
        // Arrays never enter `Value`; treat it like a finished frame.
        BlockState::Value(_) | BlockState::Done => Ok(Step::Exhausted),
    }
}

fn next_map<'s, S: ByteSource>(
    values: &'s Schema,
    state: &mut BlockState,
    cursor: &mut BinaryCursor<S>,
    scratch: &mut Scratchpad,
    limit: u64,
) -> Result<Step<'s>, DecodeError> {
    match *state {
        BlockState::Start => {
            *state = BlockState::Items(0);
            Ok(Step::Emit(Emitted::StartObject))
        }
        BlockState::Items(remaining) => {
            let remaining = refill(remaining, cursor, limit, ContextKind::Map)?;
            if remaining == 0 {
                *state = BlockState::Done;
                return Ok(Step::Emit(Emitted::EndObject));
            }
            let offset = cursor.position();
            let context = within(ContextKind::Map);
            cursor.read_bytes_into(scratch.buffer()).map_err(&context)?;
            scratch.promote_text(offset).map_err(&context)?;
            *state = BlockState::Value(remaining - 1);
            Ok(Step::Emit(Emitted::Key))
        }
        BlockState::Value(remaining) => {
            *state = BlockState::Items(remaining);
            Ok(Step::Descend(values))
        }
        BlockState::Done => Ok(Step::Exhausted),
    }
}

/// Items left in the current block, reading the next block header when the
/// current one is used up. Zero means the collection has ended.
fn refill<S: ByteSource>(
    remaining: u64,
    cursor: &mut BinaryCursor<S>,
    limit: u64,
    context: ContextKind,
) -> Result<u64, DecodeError> {
    if remaining > 0 {
        return Ok(remaining);
    }
    let offset = cursor.position();
    let count = cursor.read_block_count().map_err(within(context))?;
    if count > limit {
        return Err(DecodeError::BlockLimitExceeded {
            count,
            limit,
            offset,
            context,
        });
    }
    trace!("{context} block of {count} items");
    Ok(count)
}

fn next_union<'s, S: ByteSource>(
    branches: &'s [Schema],
    resolved: &mut bool,
    cursor: &mut BinaryCursor<S>,
) -> Result<Step<'s>, DecodeError> {
    if *resolved {
        return Ok(Step::Exhausted);
    }
    let offset = cursor.position();
    let index = cursor
        .read_union_index()
        .map_err(within(ContextKind::Union))?;
    let branch = usize::try_from(index)
        .ok()
        .and_then(|i| branches.get(i))
        .ok_or(DecodeError::InvalidUnionBranch {
            index,
            branches: branches.len(),
            offset,
        })?;
    *resolved = true;
    Ok(Step::Descend(branch))
}

fn decode_leaf<'s, S: ByteSource>(
    leaf: Leaf<'s>,
    cursor: &mut BinaryCursor<S>,
    scratch: &mut Scratchpad,
) -> Result<Emitted<'s>, DecodeError> {
    let offset = cursor.position();
    let context = within(ContextKind::Scalar);
    let emitted = match leaf {
        Leaf::Null => Emitted::Null,
        Leaf::Boolean => Emitted::Bool(cursor.read_bool().map_err(&context)?),
        Leaf::Int => Emitted::Int(cursor.read_int().map_err(&context)?),
        Leaf::Long => Emitted::Long(cursor.read_long().map_err(&context)?),
        Leaf::Float => Emitted::Float(cursor.read_float().map_err(&context)?),
        Leaf::Double => Emitted::Double(cursor.read_double().map_err(&context)?),
        Leaf::String => {
            cursor.read_bytes_into(scratch.buffer()).map_err(&context)?;
            scratch.promote_text(offset).map_err(&context)?;
            Emitted::Text
        }
        Leaf::Bytes => {
            cursor.read_bytes_into(scratch.buffer()).map_err(&context)?;
            Emitted::Bytes
        }
        Leaf::Fixed(size) => {
            cursor
                .read_fixed_into(scratch.buffer(), size)
                .map_err(&context)?;
            Emitted::Bytes
        }
        Leaf::Enum(symbols) => {
            let index = cursor.read_int().map_err(&context)?;
            let symbol = usize::try_from(index)
                .ok()
                .and_then(|i| symbols.get(i))
                .ok_or(DecodeError::InvalidEnumIndex {
                    index,
                    symbols: symbols.len(),
                    offset,
                })?;
            Emitted::Symbol(symbol)
        }
    };
    Ok(emitted)
}
