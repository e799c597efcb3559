use std::fmt;
use std::sync::Arc;

use crate::enums::EnumLookup;
use crate::record::Record;

/// Display string of a field whose bytes were not available.
pub const UNDECODABLE: &str = "None";

/// The raw value carried by a decoded [`Field`].
///
/// Integers of every width are widened to `u64`; the field's
/// [`Format`] remembers how wide they were on the wire so the hex
/// rendering can be padded correctly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    UInt(u64),
    Text(String),
    Record(Record),
}

/// How a field renders its value.
///
/// ```text
/// ┌─────────┬────────────────────────────────────────────────────┐
/// │ Format  │ Rendering                                          │
/// ├─────────┼────────────────────────────────────────────────────┤
/// │ Decimal │ 258                                                │
/// │ Hex     │ 0x0102  (zero-padded to `digits`)                  │
/// │ Enum    │ lookup label, or 0x.. fallback padded to `digits`  │
/// │ Text    │ the decoded string                                 │
/// │ Record  │ {name=value, name=value}                           │
/// └─────────┴────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Decimal,
    Hex { digits: usize },
    Enum { lookup: Arc<EnumLookup>, digits: usize },
    Text,
    Record,
}

/// A single named value decoded from the front of a byte buffer.
///
/// Fields are immutable: decoding the same bytes again produces a new
/// `Field`. A field whose input was too short carries no value and
/// renders as [`UNDECODABLE`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
    value: Option<Value>,
    consumed: usize,
    format: Format,
}

impl Field {
    /// A successfully decoded field that consumed `consumed` bytes.
    pub fn new(name: impl Into<String>, value: Value, consumed: usize, format: Format) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            consumed,
            format,
        }
    }

    /// A field whose bytes were missing. It consumed nothing.
    pub fn undecodable(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            value: None,
            consumed: 0,
            format,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded value, or `None` when the field was undecodable.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Number of input bytes this field consumed.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_decodable(&self) -> bool {
        self.value.is_some()
    }

    /// True if the field, or any record nested inside it, ran out of input.
    pub fn is_truncated(&self) -> bool {
        match &self.value {
            None => true,
            Some(Value::Record(record)) => record.is_truncated(),
            Some(_) => false,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.value {
            Some(Value::UInt(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match &self.value {
            Some(Value::Record(r)) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(value) = &self.value else {
            return f.write_str(UNDECODABLE);
        };

        match (value, &self.format) {
            (Value::UInt(v), Format::Hex { digits }) => f.write_str(&hex_string(*v, *digits)),
            (Value::UInt(v), Format::Enum { lookup, digits }) => {
                f.write_str(&lookup.label_with_digits(*v, *digits))
            }
            (Value::UInt(v), _) => write!(f, "{v}"),
            (Value::Text(s), _) => f.write_str(s),
            (Value::Record(r), _) => write!(f, "{r}"),
        }
    }
}

/// `0x` followed by uppercase hex, zero-padded to `digits`.
///
/// Values wider than `digits` are printed in full, never cut.
pub(crate) fn hex_string(value: u64, digits: usize) -> String {
    format!("0x{value:0digits$X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_renders_none_marker() {
        let field = Field::undecodable("Name", Format::Decimal);
        assert!(!field.is_decodable());
        assert!(field.is_truncated());
        assert_eq!(field.consumed(), 0);
        assert_eq!(field.to_string(), "None");
    }

    #[test]
    fn hex_pads_to_digit_count() {
        assert_eq!(hex_string(0x1, 2), "0x01");
        assert_eq!(hex_string(0x102, 4), "0x0102");
        assert_eq!(hex_string(0xABCD, 2), "0xABCD");
    }

    #[test]
    fn accessors_match_value_kind() {
        let field = Field::new("n", Value::UInt(7), 1, Format::Decimal);
        assert_eq!(field.as_u64(), Some(7));
        assert_eq!(field.as_str(), None);
        assert!(field.as_record().is_none());

        let text = Field::new("s", Value::Text("hi".into()), 4, Format::Text);
        assert_eq!(text.as_str(), Some("hi"));
        assert_eq!(text.to_string(), "hi");
    }
}
