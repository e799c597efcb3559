use crate::error::StructError;
use crate::field::{Field, Format, Value};

/// The decode contract every field kind implements.
///
/// An item knows its own width, byte order and display policy. It
/// decodes a prefix of `buf` into a [`Field`] and returns the bytes
/// it did not consume:
///
/// ```text
///   buf:  [ b0 b1 | b2 b3 b4 ... ]
///           ^^^^^   ^^^^^^^^^^^^
///           field   returned remainder
/// ```
///
/// `decode` has no default, so every field kind supplies its own. When
/// `buf` is too short the item must return an undecodable field and the
/// *unchanged* buffer.
pub trait Item: Send + Sync {
    /// The field name used for display and [`Record::get`](crate::Record::get).
    fn name(&self) -> &str;

    /// Display policy of fields produced by this item.
    fn format(&self) -> Format;

    /// Decode a prefix of `buf`, returning the field and the remainder.
    fn decode<'a>(&self, buf: &'a [u8]) -> (Field, &'a [u8]);

    /// Bytes consumed by every successful decode, when that is constant.
    fn fixed_size(&self) -> Option<usize> {
        None
    }

    /// The field this item yields when no bytes are left to decode it.
    fn undecodable(&self) -> Field {
        Field::undecodable(self.name(), self.format())
    }
}

/// Width of a fixed-size integer on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    One = 1,
    Two = 2,
    Four = 4,
}

impl Width {
    /// Convert a byte count into a [`Width`].
    ///
    /// # Errors
    ///
    /// [`StructError::UnsupportedWidth`] for anything other than 1, 2 or 4.
    pub fn from_bytes(bytes: usize) -> Result<Self, StructError> {
        match bytes {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            other => Err(StructError::UnsupportedWidth { bytes: other }),
        }
    }

    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Digits in the zero-padded hex rendering (two per byte).
    pub fn hex_digits(self) -> usize {
        2 * self.bytes()
    }

    /// Largest value representable in this width.
    pub fn max_value(self) -> u64 {
        match self {
            Self::One => u64::from(u8::MAX),
            Self::Two => u64::from(u16::MAX),
            Self::Four => u64::from(u32::MAX),
        }
    }
}

/// Which end of a multi-byte integer comes first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Interpret `bytes` as an unsigned integer in this byte order.
    pub fn read(self, bytes: &[u8]) -> u64 {
        let shift_in = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
        match self {
            Self::Little => bytes.iter().rev().fold(0, shift_in),
            Self::Big => bytes.iter().fold(0, shift_in),
        }
    }
}

/// Decimal or hexadecimal display of an integer field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Radix {
    #[default]
    Decimal,
    Hex,
}

/// A fixed-width unsigned integer field.
///
/// ```text
/// ┌────────────┬───────┬────────┬─────────┐
/// │ Ctor       │ Width │ Order  │ Display │
/// ├────────────┼───────┼────────┼─────────┤
/// │ u8         │ 1     │ -      │ 1       │
/// │ u8_hex     │ 1     │ -      │ 0x01    │
/// │ u16        │ 2     │ little │ 258     │
/// │ u16_hex    │ 2     │ little │ 0x0102  │
/// │ u16_be     │ 2     │ big    │ 258     │
/// │ u16_be_hex │ 2     │ big    │ 0x0102  │
/// │ u32 ...    │ 4     │ ...    │ ...     │
/// └────────────┴───────┴────────┴─────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UInt {
    name: String,
    width: Width,
    order: ByteOrder,
    radix: Radix,
}

macro_rules! uint_ctors {
    ( $( $(#[$meta:meta])* $ctor:ident => ($width:ident, $order:ident, $radix:ident) ),+ $(,)? ) => {
        $(
            $(#[$meta])*
            pub fn $ctor(name: impl Into<String>) -> Self {
                Self::new(name, Width::$width, ByteOrder::$order, Radix::$radix)
            }
        )+
    };
}

impl UInt {
    pub fn new(name: impl Into<String>, width: Width, order: ByteOrder, radix: Radix) -> Self {
        Self {
            name: name.into(),
            width,
            order,
            radix,
        }
    }

    uint_ctors! {
        u8 => (One, Little, Decimal),
        u8_hex => (One, Little, Hex),
        /// Little-endian 16-bit, decimal.
        u16 => (Two, Little, Decimal),
        u16_hex => (Two, Little, Hex),
        u16_be => (Two, Big, Decimal),
        u16_be_hex => (Two, Big, Hex),
        /// Little-endian 32-bit, decimal.
        u32 => (Four, Little, Decimal),
        u32_hex => (Four, Little, Hex),
        u32_be => (Four, Big, Decimal),
        u32_be_hex => (Four, Big, Hex),
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    /// Read the integer from the front of `buf`, or `None` if it is too short.
    pub(crate) fn read<'a>(&self, buf: &'a [u8]) -> Option<(u64, &'a [u8])> {
        if buf.len() < self.width.bytes() {
            return None;
        }
        let (head, rest) = buf.split_at(self.width.bytes());
        Some((self.order.read(head), rest))
    }
}

impl Item for UInt {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> Format {
        match self.radix {
            Radix::Decimal => Format::Decimal,
            Radix::Hex => Format::Hex {
                digits: self.width.hex_digits(),
            },
        }
    }

    fn decode<'a>(&self, buf: &'a [u8]) -> (Field, &'a [u8]) {
        match self.read(buf) {
            Some((value, rest)) => (
                Field::new(&*self.name, Value::UInt(value), self.width.bytes(), self.format()),
                rest,
            ),
            None => (self.undecodable(), buf),
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.width.bytes())
    }
}
