use crate::field::{Field, Format, Value};
use crate::item::Item;

/// How far a [`Utf16`] field extends into the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Utf16Length {
    /// Exactly this many bytes. Trailing NUL characters are trimmed.
    Fixed(usize),
    /// Up to and including the first `0x0000` code unit.
    NulTerminated,
    /// Every remaining code unit. A dangling odd byte is left unconsumed.
    Remaining,
}

/// A little-endian UTF-16 string field, as found in USB string descriptors.
///
/// Unpaired surrogates decode to U+FFFD instead of failing. A fixed span
/// longer than the buffer, or a NUL-terminated string with no terminator,
/// is undecodable and consumes nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utf16 {
    name: String,
    length: Utf16Length,
}

impl Utf16 {
    pub fn new(name: impl Into<String>, length: Utf16Length) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    pub fn fixed(name: impl Into<String>, bytes: usize) -> Self {
        Self::new(name, Utf16Length::Fixed(bytes))
    }

    pub fn nul_terminated(name: impl Into<String>) -> Self {
        Self::new(name, Utf16Length::NulTerminated)
    }

    pub fn remaining(name: impl Into<String>) -> Self {
        Self::new(name, Utf16Length::Remaining)
    }

    pub fn length(&self) -> Utf16Length {
        self.length
    }

    /// Returns `(text bytes, bytes consumed)` or `None` if undecodable.
    fn span<'a>(&self, buf: &'a [u8]) -> Option<(&'a [u8], usize)> {
        match self.length {
            Utf16Length::Fixed(n) => buf.get(..n).map(|text| (text, n)),
            Utf16Length::NulTerminated => buf
                .chunks_exact(2)
                .position(|unit| unit[0] == 0 && unit[1] == 0)
                .map(|i| (&buf[..2 * i], 2 * i + 2)),
            Utf16Length::Remaining => {
                let n = buf.len() & !1;
                Some((&buf[..n], n))
            }
        }
    }
}

impl Item for Utf16 {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> Format {
        Format::Text
    }

    fn decode<'a>(&self, buf: &'a [u8]) -> (Field, &'a [u8]) {
        let Some((text, consumed)) = self.span(buf) else {
            return (self.undecodable(), buf);
        };

        let mut value = decode_utf16le(text);
        if matches!(self.length, Utf16Length::Fixed(_)) {
            value.truncate(value.trim_end_matches('\0').len());
        }

        (
            Field::new(&*self.name, Value::Text(value), consumed, Format::Text),
            &buf[consumed..],
        )
    }

    fn fixed_size(&self) -> Option<usize> {
        match self.length {
            Utf16Length::Fixed(n) => Some(n),
            _ => None,
        }
    }
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|unit| u16::from_le_bytes([unit[0], unit[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
