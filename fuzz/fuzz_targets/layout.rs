#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vusb_struct::RecordDecoder;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    layout: &'a str,
    bytes: &'a [u8],
}

// Fuzz target: RecordDecoder::from_layout on arbitrary text.
//
// A layout either parses or returns an error; a decoder that parses
// must decode any bytes without panicking.
fuzz_target!(|input: Input<'_>| {
    if let Ok(decoder) = RecordDecoder::from_layout("fuzz", input.layout) {
        let (record, rest) = decoder.decode(input.bytes);
        assert_eq!(record.len(), decoder.len());
        assert!(rest.len() <= input.bytes.len());
    }
});
