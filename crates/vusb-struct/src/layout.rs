//! Text layouts for record decoders.
//!
//! A layout is a comma-separated list of `name:kind` entries:
//!
//! ```text
//!   len:u16, kind:u8_hex, id:u32_be, label:utf16z
//! ```
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────┐
//! │ Kind                         │ Item                                 │
//! ├──────────────────────────────┼──────────────────────────────────────┤
//! │ u8 / u16 / u32               │ little-endian integer, decimal       │
//! │ u16_be / u32_be              │ big-endian integer, decimal          │
//! │ <any of the above>_hex       │ same integer, zero-padded hex        │
//! │ utf16                        │ UTF-16LE, rest of the buffer         │
//! │ utf16z                       │ UTF-16LE, NUL-terminated             │
//! │ utf16[N]                     │ UTF-16LE, exactly N bytes            │
//! └──────────────────────────────┴──────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::StructError;
use crate::item::{ByteOrder, Item, Radix, UInt, Width};
use crate::record::RecordDecoder;
use crate::text::Utf16;

impl RecordDecoder {
    /// Build a decoder from a layout string.
    ///
    /// # Errors
    ///
    /// Returns a [`StructError`] when the layout is empty, an entry is
    /// not `name:kind`, a kind is unknown, or a name repeats.
    pub fn from_layout(name: impl Into<String>, layout: &str) -> Result<Self, StructError> {
        let mut decoder = RecordDecoder::new(name);
        let mut seen = HashSet::new();

        for entry in layout.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (field, kind) = entry
                .split_once(':')
                .map(|(f, k)| (f.trim(), k.trim()))
                .filter(|(f, k)| !f.is_empty() && !k.is_empty())
                .ok_or_else(|| StructError::MalformedEntry {
                    entry: entry.to_string(),
                })?;

            if !seen.insert(field) {
                return Err(StructError::DuplicateName {
                    name: field.to_string(),
                });
            }

            let item = parse_kind(field, kind).ok_or_else(|| StructError::UnknownKind {
                entry: entry.to_string(),
                kind: kind.to_string(),
            })?;
            decoder.push(item);
        }

        if decoder.is_empty() {
            return Err(StructError::EmptyLayout);
        }
        Ok(decoder)
    }
}

fn parse_kind(name: &str, kind: &str) -> Option<Box<dyn Item>> {
    match kind {
        "utf16" => return Some(Box::new(Utf16::remaining(name))),
        "utf16z" => return Some(Box::new(Utf16::nul_terminated(name))),
        _ => {}
    }

    if let Some(len) = kind.strip_prefix("utf16[").and_then(|k| k.strip_suffix(']')) {
        let bytes = len.parse().ok()?;
        return Some(Box::new(Utf16::fixed(name, bytes)));
    }

    parse_uint(name, kind).map(|item| Box::new(item) as Box<dyn Item>)
}

fn parse_uint(name: &str, kind: &str) -> Option<UInt> {
    let (kind, radix) = match kind.strip_suffix("_hex") {
        Some(k) => (k, Radix::Hex),
        None => (kind, Radix::Decimal),
    };
    let (kind, order) = match kind.strip_suffix("_be") {
        Some(k) => (k, ByteOrder::Big),
        None => (kind, ByteOrder::Little),
    };
    let width = match kind {
        "u8" if order == ByteOrder::Little => Width::One,
        "u16" => Width::Two,
        "u32" => Width::Four,
        _ => return None,
    };
    Some(UInt::new(name, width, order, radix))
}
