use std::fmt;

use crate::field::{Field, Format, Value};
use crate::item::Item;

/// One decoded protocol unit: an ordered list of named fields.
///
/// Field order is declaration order. `consumed` is the number of input
/// bytes the fields used, so the caller can advance past the record.
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │ Record "setup"                                   │
/// │   fields:   [bmRequestType, bRequest, wValue..]  │
/// │   consumed: 8                                    │
/// │   truncated: false                               │
/// └──────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    name: String,
    fields: Vec<Field>,
    consumed: usize,
    truncated: bool,
}

impl Record {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First field with the given name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bytes of input consumed by all fields together.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// True if the input ran out before the last field was decoded.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={field}", field.name())?;
        }
        f.write_str("}")
    }
}

/// Composes field items into a [`Record`] decoder.
///
/// Decoding walks the items in order, handing each one the bytes the
/// previous one left behind:
///
/// ```text
///   buf ──► item[0] ──rest──► item[1] ──rest──► ... ──► remainder
///             │                  │
///           field[0]          field[1]
/// ```
///
/// Decoding never stops early. Once an item runs out of input, it and
/// every item after it yield undecodable fields that consume nothing,
/// and the record is flagged as truncated. The fields that came before
/// keep their values.
///
/// A `RecordDecoder` is itself an [`Item`], so records nest.
///
/// # Example
///
/// ```rust
/// use vusb_struct::{RecordDecoder, UInt};
///
/// let setup = RecordDecoder::new("setup")
///     .with(UInt::u8_hex("bmRequestType"))
///     .with(UInt::u8("bRequest"))
///     .with(UInt::u16_hex("wValue"));
///
/// let (record, rest) = setup.decode(&[0x80, 0x06, 0x00, 0x01, 0xFF]);
/// assert_eq!(record.to_string(), "{bmRequestType=0x80, bRequest=6, wValue=0x0100}");
/// assert_eq!(record.consumed(), 4);
/// assert_eq!(rest, &[0xFF]);
/// ```
pub struct RecordDecoder {
    name: String,
    items: Vec<Box<dyn Item>>,
}

impl RecordDecoder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Append an item, builder style.
    #[must_use]
    pub fn with(mut self, item: impl Item + 'static) -> Self {
        self.items.push(Box::new(item));
        self
    }

    /// Append an already boxed item.
    pub fn push(&mut self, item: Box<dyn Item>) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of the items, in decode order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name())
    }

    /// Total record size when every item has a fixed size.
    pub fn fixed_size(&self) -> Option<usize> {
        self.items.iter().map(|item| item.fixed_size()).sum()
    }

    /// Decode one record from the front of `buf`.
    ///
    /// Returns the record and the bytes it did not consume.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> (Record, &'a [u8]) {
        let mut rest = buf;
        let mut truncated = false;
        let mut fields = Vec::with_capacity(self.items.len());

        for item in &self.items {
            if truncated {
                fields.push(item.undecodable());
                continue;
            }

            let (field, next) = item.decode(rest);
            truncated = field.is_truncated();
            fields.push(field);
            rest = next;
        }

        let record = Record {
            name: self.name.clone(),
            fields,
            consumed: buf.len() - rest.len(),
            truncated,
        };
        (record, rest)
    }
}

impl Item for RecordDecoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> Format {
        Format::Record
    }

    fn decode<'a>(&self, buf: &'a [u8]) -> (Field, &'a [u8]) {
        let (record, rest) = RecordDecoder::decode(self, buf);
        let consumed = record.consumed();
        (
            Field::new(&*self.name, Value::Record(record), consumed, Format::Record),
            rest,
        )
    }

    fn fixed_size(&self) -> Option<usize> {
        RecordDecoder::fixed_size(self)
    }
}

impl fmt::Debug for RecordDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDecoder")
            .field("name", &self.name)
            .field("items", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::UInt;
    use crate::text::Utf16;

    fn header() -> RecordDecoder {
        RecordDecoder::new("header")
            .with(UInt::u8("a"))
            .with(UInt::u16("b"))
            .with(UInt::u32_be_hex("c"))
    }

    #[test]
    fn consumes_sum_of_field_widths() {
        let buf = [1, 2, 0, 0, 0, 0, 9, 0xAA];
        let (record, rest) = header().decode(&buf);
        assert_eq!(record.consumed(), 7);
        assert_eq!(rest, &[0xAA]);
        assert!(!record.is_truncated());
        assert_eq!(record.get("a").and_then(Field::as_u64), Some(1));
        assert_eq!(record.get("b").and_then(Field::as_u64), Some(2));
        assert_eq!(record.get("c").map(ToString::to_string).as_deref(), Some("0x00000009"));
    }

    #[test]
    fn truncation_marks_remaining_fields() {
        // `b` needs two bytes but only one is left after `a`.
        let buf = [7, 1];
        let (record, rest) = header().decode(&buf);
        assert!(record.is_truncated());
        assert_eq!(record.consumed(), 1);
        assert_eq!(rest, &[1]);

        let rendered: Vec<String> = record.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["7", "None", "None"]);
    }

    #[test]
    fn later_fields_stay_undecodable_even_if_bytes_would_fit() {
        let decoder = RecordDecoder::new("r")
            .with(UInt::u32("wide"))
            .with(UInt::u8("narrow"));
        let (record, rest) = decoder.decode(&[1, 2]);
        assert!(record.fields().iter().all(|f| !f.is_decodable()));
        assert_eq!(record.consumed(), 0);
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn empty_buffer_yields_all_undecodable() {
        let (record, rest) = header().decode(&[]);
        assert_eq!(record.len(), 3);
        assert_eq!(record.consumed(), 0);
        assert!(rest.is_empty());
        assert_eq!(record.to_string(), "{a=None, b=None, c=None}");
    }

    #[test]
    fn nested_records() {
        let outer = RecordDecoder::new("outer")
            .with(UInt::u8("len"))
            .with(header())
            .with(UInt::u8_hex("tail"));

        assert_eq!(outer.fixed_size(), Some(9));

        let buf = [3, 1, 2, 0, 0, 0, 0, 5, 0xFE];
        let (record, rest) = outer.decode(&buf);
        assert!(rest.is_empty());
        assert_eq!(
            record.to_string(),
            "{len=3, header={a=1, b=2, c=0x00000005}, tail=0xFE}"
        );
        let inner = record.get("header").and_then(Field::as_record).unwrap();
        assert_eq!(inner.consumed(), 7);
    }

    #[test]
    fn truncated_nested_record_truncates_outer() {
        let outer = RecordDecoder::new("outer")
            .with(header())
            .with(UInt::u8("after"));
        let (record, _) = outer.decode(&[1, 2]);
        assert!(record.is_truncated());
        assert_eq!(record.consumed(), 1);
        assert_eq!(record.get("after").map(Field::is_decodable), Some(false));
    }

    #[test]
    fn variable_items_have_no_fixed_size() {
        let decoder = RecordDecoder::new("r")
            .with(UInt::u8("len"))
            .with(Utf16::remaining("text"));
        assert_eq!(decoder.fixed_size(), None);
    }

    #[test]
    fn debug_lists_item_names() {
        let text = format!("{:?}", header());
        assert!(text.contains("[\"a\", \"b\", \"c\"]"), "{text}");
    }
}
