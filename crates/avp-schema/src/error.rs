/// Errors raised while assembling a schema tree.
///
/// Only the structural rules that the binary layout depends on are
/// checked here; name resolution and defaults belong to whatever
/// compiles schema documents into [`Schema`](crate::Schema) values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
  /// A union was declared with no branches. No branch index could ever
  /// be valid, so such a union can never be decoded.
  #[error("union must declare at least one branch")]
  EmptyUnion,

  /// A union branch is itself a union.
  #[error("union branch {index} is itself a union")]
  NestedUnion { index: usize },

  /// Two unnamed branches share a kind, e.g. two `string` branches.
  ///
  /// Named kinds (record, enum, fixed) may repeat as long as their names
  /// differ.
  #[error("union declares {kind} more than once")]
  DuplicateBranch { kind: String },
}
