#![no_main]

use libfuzzer_sys::fuzz_target;
use vusb_struct::{RecordDecoder, UInt, Utf16};

// Fuzz target: RecordDecoder::decode over every field kind.
//
// Checks:
// - decoding never panics on short or odd-length input
// - consumed bytes plus the remainder add up to the input
// - every field after the first truncated one is undecodable
fuzz_target!(|data: &[u8]| {
    let decoder = RecordDecoder::new("fuzz")
        .with(UInt::u8("a"))
        .with(UInt::u16_be_hex("b"))
        .with(Utf16::nul_terminated("name"))
        .with(UInt::u32("c"))
        .with(Utf16::fixed("label", 6))
        .with(Utf16::remaining("tail"));

    let (record, rest) = decoder.decode(data);
    assert_eq!(record.consumed() + rest.len(), data.len());
    assert_eq!(rest, &data[record.consumed()..]);

    if let Some(first) = record.iter().position(|f| !f.is_decodable()) {
        assert!(record.is_truncated());
        assert!(record.iter().skip(first).all(|f| !f.is_decodable() && f.consumed() == 0));
    }
});
