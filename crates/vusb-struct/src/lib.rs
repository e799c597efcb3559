#![warn(clippy::pedantic)]

pub mod enums;
pub mod error;
pub mod field;
pub mod item;
pub mod layout;
pub mod record;
pub mod text;

pub use enums::{Enum, EnumLookup};
pub use error::StructError;
pub use field::{Field, Format, UNDECODABLE, Value};
pub use item::{ByteOrder, Item, Radix, UInt, Width};
pub use record::{Record, RecordDecoder};
pub use text::{Utf16, Utf16Length};
