use avp_schema::Schema;
use avp_wire::varint::{MAX_VARINT_BYTES, encode_long};

/// A logical value, shaped the way the binary encoding lays it out.
///
/// Records hold their field values in schema order, enums and unions hold
/// indices. Nothing ties a `Datum` to a schema until it is written.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Record(Vec<Datum>),
    Enum(usize),
    Array(Vec<Datum>),
    Map(Vec<(String, Datum)>),
    Union(usize, Box<Datum>),
    Fixed(Vec<u8>),
}

impl Datum {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn union(branch: usize, value: Datum) -> Self {
        Self::Union(branch, Box::new(value))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("cannot write {found} as {expected}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("record has {expected} fields, got {found} values")]
    FieldCount { expected: usize, found: usize },

    #[error("index {index} out of range for {len} choices")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("fixed of size {expected} got {found} bytes")]
    FixedSize { expected: usize, found: usize },
}

/// How arrays and maps are split into blocks.
///
/// Writers are free to split a collection at any point and to announce a
/// block's byte size with a negative count; readers must accept all of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    /// Largest number of items in one block. Zero is treated as one.
    pub max_items: usize,
    /// Write negative counts followed by the block's byte size.
    pub sized: bool,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            max_items: usize::MAX,
            sized: false,
        }
    }
}

/// Encode one value with the default block layout.
///
/// # Errors
///
/// Returns [`EncodeError`] when `datum` does not fit `schema`.
pub fn encode(schema: &Schema, datum: &Datum) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    write_datum(schema, datum, BlockLayout::default(), &mut out)?;
    Ok(out)
}

/// Append the encoding of `datum` under `schema` to `out`.
///
/// # Errors
///
/// Returns [`EncodeError`] when `datum` does not fit `schema`. `out` may
/// hold a partial value afterwards.
pub fn write_datum(
    schema: &Schema,
    datum: &Datum,
    layout: BlockLayout,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match (schema, datum) {
        (Schema::Null, Datum::Null) => {}
        (Schema::Boolean, Datum::Boolean(v)) => out.push(u8::from(*v)),
        (Schema::Int, Datum::Int(v)) => write_long(i64::from(*v), out),
        (Schema::Long, Datum::Long(v)) => write_long(*v, out),
        (Schema::Float, Datum::Float(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Schema::Double, Datum::Double(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Schema::String, Datum::String(s)) => write_bytes(s.as_bytes(), out),
        (Schema::Bytes, Datum::Bytes(b)) => write_bytes(b, out),
        (Schema::Fixed { size, .. }, Datum::Fixed(b)) => {
            if b.len() != *size {
                return Err(EncodeError::FixedSize {
                    expected: *size,
                    found: b.len(),
                });
            }
            out.extend_from_slice(b);
        }
        (Schema::Enum { symbols, .. }, Datum::Enum(index)) => {
            check_index(*index, symbols.len())?;
            write_long(*index as i64, out);
        }
        (Schema::Record { fields, .. }, Datum::Record(values)) => {
            if fields.len() != values.len() {
                return Err(EncodeError::FieldCount {
                    expected: fields.len(),
                    found: values.len(),
                });
            }
            for (field, value) in fields.iter().zip(values) {
                write_datum(&field.schema, value, layout, out)?;
            }
        }
        (Schema::Array { items }, Datum::Array(values)) => {
            write_blocks(values, layout, out, |item, block| {
                write_datum(items, item, layout, block)
            })?;
        }
        (Schema::Map { values }, Datum::Map(entries)) => {
            write_blocks(entries, layout, out, |(key, value), block| {
                write_bytes(key.as_bytes(), block);
                write_datum(values, value, layout, block)
            })?;
        }
        (Schema::Union { branches }, Datum::Union(index, value)) => {
            check_index(*index, branches.len())?;
            write_long(*index as i64, out);
            write_datum(&branches[*index], value, layout, out)?;
        }
        (schema, datum) => {
            return Err(EncodeError::Mismatch {
                expected: schema.kind_name(),
                found: datum_kind(datum),
            });
        }
    }
    Ok(())
}

fn write_blocks<T>(
    items: &[T],
    layout: BlockLayout,
    out: &mut Vec<u8>,
    mut write_item: impl FnMut(&T, &mut Vec<u8>) -> Result<(), EncodeError>,
) -> Result<(), EncodeError> {
    let mut block = Vec::new();
    for chunk in items.chunks(layout.max_items.max(1)) {
        block.clear();
        for item in chunk {
            write_item(item, &mut block)?;
        }
        let count = chunk.len() as i64;
        if layout.sized {
            write_long(-count, out);
            write_long(block.len() as i64, out);
        } else {
            write_long(count, out);
        }
        out.extend_from_slice(&block);
    }
    write_long(0, out);
    Ok(())
}

fn write_long(value: i64, out: &mut Vec<u8>) {
    let mut buf = [0u8; MAX_VARINT_BYTES];
    let n = encode_long(value, &mut buf);
    out.extend_from_slice(&buf[..n]);
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    write_long(bytes.len() as i64, out);
    out.extend_from_slice(bytes);
}

fn check_index(index: usize, len: usize) -> Result<(), EncodeError> {
    if index < len {
        Ok(())
    } else {
        Err(EncodeError::IndexOutOfRange { index, len })
    }
}

fn datum_kind(datum: &Datum) -> &'static str {
    match datum {
        Datum::Null => "null",
        Datum::Boolean(_) => "boolean",
        Datum::Int(_) => "int",
        Datum::Long(_) => "long",
        Datum::Float(_) => "float",
        Datum::Double(_) => "double",
        Datum::String(_) => "string",
        Datum::Bytes(_) => "bytes",
        Datum::Record(_) => "record",
        Datum::Enum(_) => "enum",
        Datum::Array(_) => "array",
        Datum::Map(_) => "map",
        Datum::Union(..) => "union",
        Datum::Fixed(_) => "fixed",
    }
}
