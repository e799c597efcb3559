#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vusb_follow::{EventQueue, Parser, RecordParser};
use vusb_struct::{RecordDecoder, UInt};

#[derive(Arbitrary, Debug)]
struct Input {
    stream: Vec<u8>,
    splits: Vec<u8>,
}

// Fuzz target: RecordParser reassembly.
//
// Feeding a stream in arbitrary chunks must frame exactly the same
// records as decoding it in one piece, with the tail left pending.
fuzz_target!(|input: Input| {
    let decoder = || {
        RecordDecoder::new("rec")
            .with(UInt::u16("len"))
            .with(UInt::u8_hex("kind"))
            .with(UInt::u32_be("id"))
    };
    let size = 7;
    let whole = input.stream.len() / size;

    let queue = EventQueue::bounded(whole.max(1));
    let mut parser = RecordParser::new(decoder(), queue.clone()).unwrap();

    let mut rest = input.stream.as_slice();
    for split in input.splits.iter().map(|&s| usize::from(s)) {
        let (chunk, tail) = rest.split_at(split.min(rest.len()));
        parser.parse(chunk).unwrap();
        rest = tail;
    }
    parser.parse(rest).unwrap();
    assert_eq!(parser.pending(), input.stream.len() % size);

    let reference = decoder();
    for (i, bytes) in input.stream.chunks_exact(size).enumerate() {
        let framed = queue.try_pop().unwrap_or_else(|| panic!("record {i} missing"));
        assert_eq!(framed, reference.decode(bytes).0);
    }
    assert!(queue.is_empty());
});
