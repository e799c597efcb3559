//! Fixtures shared by the integration tests and benchmarks.

use std::io::{self, Write as _};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flate2::Compression;
use flate2::write::GzEncoder;
use vusb_struct::{Enum, EnumLookup, RecordDecoder, UInt};

/// Gzip `data` in memory.
///
/// # Errors
///
/// Propagates encoder errors.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Poll `done` every few milliseconds. Returns `false` on timeout.
pub fn wait_for(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    true
}

/// Standard request codes of a USB control transfer.
pub fn standard_requests() -> Arc<EnumLookup> {
    Arc::new(EnumLookup::new([
        (0x00, "GET_STATUS"),
        (0x01, "CLEAR_FEATURE"),
        (0x03, "SET_FEATURE"),
        (0x05, "SET_ADDRESS"),
        (0x06, "GET_DESCRIPTOR"),
        (0x07, "SET_DESCRIPTOR"),
        (0x08, "GET_CONFIGURATION"),
        (0x09, "SET_CONFIGURATION"),
    ]))
}

/// The 8-byte setup packet that starts every control transfer.
pub fn setup_packet() -> RecordDecoder {
    RecordDecoder::new("setup")
        .with(UInt::u8_hex("bmRequestType"))
        .with(Enum::u8("bRequest", standard_requests()))
        .with(UInt::u16_hex("wValue"))
        .with(UInt::u16("wIndex"))
        .with(UInt::u16("wLength"))
}
