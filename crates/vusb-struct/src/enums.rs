use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::field::{hex_string, Field, Format, Value};
use crate::item::{ByteOrder, Item, Radix, UInt, Width};

// ── EnumLookup ────────────────────────────────────────────────────────

/// A total mapping from raw integer to human label.
///
/// Lookups never fail. A value with no entry renders as `0x` followed by
/// its uppercase hex digits, zero-padded to the width of the field it
/// came from:
///
/// ```text
/// ┌───────┬──────────────┬─────────────┐
/// │ Value │ Entry        │ label()     │
/// ├───────┼──────────────┼─────────────┤
/// │ 0x00  │ "Test"       │ "Test"      │
/// │ 0x01  │ (none)       │ "0x01"      │
/// │ 0x1FF │ (none)       │ "0x1FF"     │
/// └───────┴──────────────┴─────────────┘
/// ```
///
/// The table is fixed at construction. Share it between fields with an
/// `Arc` rather than cloning it per decode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumLookup {
  labels: BTreeMap<u64, String>,
}

impl EnumLookup {
  pub fn new<I, S>(entries: I) -> Self
  where
    I: IntoIterator<Item = (u64, S)>,
    S: Into<String>,
  {
    entries.into_iter().collect()
  }

  /// The mapped label, if `value` has an entry.
  pub fn get(&self, value: u64) -> Option<&str> {
    self.labels.get(&value).map(String::as_str)
  }

  pub fn contains(&self, value: u64) -> bool {
    self.labels.contains_key(&value)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  /// Label for `value`, falling back to a one-byte-wide hex string.
  pub fn label(&self, value: u64) -> Cow<'_, str> {
    self.label_for_width(value, Width::One)
  }

  /// Label for `value`, falling back to hex padded to `width`.
  pub fn label_for_width(&self, value: u64, width: Width) -> Cow<'_, str> {
    self.label_with_digits(value, width.hex_digits())
  }

  pub(crate) fn label_with_digits(&self, value: u64, digits: usize) -> Cow<'_, str> {
    match self.get(value) {
      Some(label) => Cow::Borrowed(label),
      None => Cow::Owned(hex_string(value, digits)),
    }
  }
}

impl<S: Into<String>> FromIterator<(u64, S)> for EnumLookup {
  fn from_iter<I: IntoIterator<Item = (u64, S)>>(iter: I) -> Self {
    Self {
      labels: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
    }
  }
}

// ── Enum field ────────────────────────────────────────────────────────

/// An integer field rendered through an [`EnumLookup`].
///
/// Decodes exactly like the [`UInt`] of the same width and byte order;
/// only the display differs.
#[derive(Clone, Debug)]
pub struct Enum {
  int: UInt,
  lookup: Arc<EnumLookup>,
}

impl Enum {
  pub fn new(
    name: impl Into<String>,
    width: Width,
    order: ByteOrder,
    lookup: Arc<EnumLookup>,
  ) -> Self {
    Self {
      int: UInt::new(name, width, order, Radix::Hex),
      lookup,
    }
  }

  /// A single-byte enum, the common case for type and status codes.
  pub fn u8(name: impl Into<String>, lookup: Arc<EnumLookup>) -> Self {
    Self::new(name, Width::One, ByteOrder::Little, lookup)
  }

  pub fn lookup(&self) -> &EnumLookup {
    &self.lookup
  }
}

impl Item for Enum {
  fn name(&self) -> &str {
    self.int.name()
  }

  fn format(&self) -> Format {
    Format::Enum {
      lookup: Arc::clone(&self.lookup),
      digits: self.int.width().hex_digits(),
    }
  }

  fn decode<'a>(&self, buf: &'a [u8]) -> (Field, &'a [u8]) {
    match self.int.read(buf) {
      Some((value, rest)) => (
        Field::new(self.name(), Value::UInt(value), self.int.width().bytes(), self.format()),
        rest,
      ),
      None => (self.undecodable(), buf),
    }
  }

  fn fixed_size(&self) -> Option<usize> {
    self.int.fixed_size()
  }
}
