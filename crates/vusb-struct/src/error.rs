/// Errors raised while *building* field and record decoders.
///
/// Decoding itself never fails: a buffer that is too short produces an
/// undecodable [`Field`](crate::Field), not an error. Everything in this
/// enum is a configuration mistake in the calling code (an unsupported
/// width, a typo in a layout string) and is reported to whoever asked
/// for the decoder.
///
/// ```text
/// ┌──────────────────┬──────────────────────────────────────────────┐
/// │ Variant          │ Cause                                        │
/// ├──────────────────┼──────────────────────────────────────────────┤
/// │ UnsupportedWidth │ integer width other than 1, 2 or 4 bytes     │
/// │ MalformedEntry   │ layout entry not of the form `name:kind`     │
/// │ UnknownKind      │ layout kind not recognised                   │
/// │ DuplicateName    │ two layout entries share a field name        │
/// │ EmptyLayout      │ layout string has no entries                 │
/// └──────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StructError {
  /// Fixed-width integers are 1, 2 or 4 bytes wide.
  #[error("unsupported field width: {bytes} bytes (expected 1, 2 or 4)")]
  UnsupportedWidth { bytes: usize },

  /// A layout entry was missing its `:` separator or had an empty side.
  #[error("malformed layout entry {entry:?}: expected `name:kind`")]
  MalformedEntry { entry: String },

  /// A layout entry named a field kind this crate does not know.
  #[error("unknown field kind {kind:?} in layout entry {entry:?}")]
  UnknownKind { entry: String, kind: String },

  #[error("duplicate field name {name:?} in layout")]
  DuplicateName { name: String },

  #[error("layout is empty")]
  EmptyLayout,
}
