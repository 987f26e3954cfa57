use std::collections::HashSet;

use crate::error::SchemaError;

/// One node of a compiled schema tree.
///
/// The binary encoding carries no type tags, so this tree alone decides how
/// every byte is interpreted. Nodes are immutable once built and are
/// borrowed, never cloned, by the parser for the lifetime of a session.
///
/// ```text
/// ┌──────────┬─────────────────────────────────────────────────┐
/// │ Kind     │ Binary layout                                   │
/// ├──────────┼─────────────────────────────────────────────────┤
/// │ Null     │ zero bytes                                      │
/// │ Boolean  │ one byte                                        │
/// │ Int/Long │ zig-zag varint                                  │
/// │ Float    │ 4 bytes LE       Double │ 8 bytes LE            │
/// │ String   │ length + UTF-8   Bytes  │ length + raw bytes    │
/// │ Record   │ fields back to back, in declaration order       │
/// │ Enum     │ symbol index (int)                              │
/// │ Array    │ blocks of items, terminated by a zero count     │
/// │ Map      │ blocks of (string key, value) pairs             │
/// │ Union    │ branch index (long), then the branch value      │
/// │ Fixed    │ exactly `size` bytes                            │
/// └──────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schema {
  Null,
  Boolean,
  Int,
  Long,
  Float,
  Double,
  String,
  Bytes,
  Record { name: String, fields: Vec<Field> },
  Enum { name: String, symbols: Vec<String> },
  Array { items: Box<Schema> },
  Map { values: Box<Schema> },
  /// Build through [`Schema::union`] to get the structural checks.
  Union { branches: Vec<Schema> },
  Fixed { name: String, size: usize },
}

/// A named record field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
  pub name: String,
  pub schema: Schema,
}

impl Field {
  pub fn new(name: impl Into<String>, schema: Schema) -> Self {
    Self {
      name: name.into(),
      schema,
    }
  }
}

impl Schema {
  pub fn record(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
    Self::Record {
      name: name.into(),
      fields: fields.into_iter().collect(),
    }
  }

  #[must_use]
  pub fn array(items: Schema) -> Self {
    Self::Array {
      items: Box::new(items),
    }
  }

  #[must_use]
  pub fn map(values: Schema) -> Self {
    Self::Map {
      values: Box::new(values),
    }
  }

  pub fn enumeration<I>(name: impl Into<String>, symbols: I) -> Self
  where
    I: IntoIterator,
    I::Item: Into<String>,
  {
    Self::Enum {
      name: name.into(),
      symbols: symbols.into_iter().map(Into::into).collect(),
    }
  }

  pub fn fixed(name: impl Into<String>, size: usize) -> Self {
    Self::Fixed {
      name: name.into(),
      size,
    }
  }

  /// Build a union, enforcing the structural rules of the format.
  ///
  /// # Errors
  ///
  /// - [`SchemaError::EmptyUnion`] for zero branches.
  /// - [`SchemaError::NestedUnion`] if a branch is a union.
  /// - [`SchemaError::DuplicateBranch`] if two unnamed branches share a
  ///   kind, or two named branches share kind and name.
  pub fn union(branches: Vec<Schema>) -> Result<Self, SchemaError> {
    if branches.is_empty() {
      return Err(SchemaError::EmptyUnion);
    }

    let mut seen = HashSet::new();
    for (index, branch) in branches.iter().enumerate() {
      if matches!(branch, Self::Union { .. }) {
        return Err(SchemaError::NestedUnion { index });
      }
      let key = match branch.name() {
        Some(name) => format!("{} {name}", branch.kind_name()),
        None => branch.kind_name().to_string(),
      };
      if !seen.insert(key.clone()) {
        return Err(SchemaError::DuplicateBranch { kind: key });
      }
    }

    Ok(Self::Union { branches })
  }

  /// `["null", inner]`, the usual shape of an optional value.
  ///
  /// A union argument gets `null` prepended unless it already has a null
  /// branch; `Null` itself is returned unchanged.
  #[must_use]
  pub fn optional(inner: Schema) -> Self {
    match inner {
      Self::Null => Self::Null,
      Self::Union { branches } if branches.contains(&Self::Null) => Self::Union { branches },
      Self::Union { mut branches } => {
        branches.insert(0, Self::Null);
        Self::Union { branches }
      }
      other => Self::Union {
        branches: vec![Self::Null, other],
      },
    }
  }

  /// Lower-case kind name, as used in schema documents.
  #[must_use]
  pub fn kind_name(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Boolean => "boolean",
      Self::Int => "int",
      Self::Long => "long",
      Self::Float => "float",
      Self::Double => "double",
      Self::String => "string",
      Self::Bytes => "bytes",
      Self::Record { .. } => "record",
      Self::Enum { .. } => "enum",
      Self::Array { .. } => "array",
      Self::Map { .. } => "map",
      Self::Union { .. } => "union",
      Self::Fixed { .. } => "fixed",
    }
  }

  /// Name of a named type (record, enum, fixed).
  #[must_use]
  pub fn name(&self) -> Option<&str> {
    match self {
      Self::Record { name, .. } | Self::Enum { name, .. } | Self::Fixed { name, .. } => Some(name),
      _ => None,
    }
  }
}
