//! Record decoding as seen by a log viewer: whole packets, truncated
//! packets, enum fallbacks and nested records, checked against inline
//! insta snapshots of the rendered record.

use insta::assert_snapshot;
use vusb_struct::{ByteOrder, Enum, RecordDecoder, UInt, Utf16, Width};
use vusb_tests::{setup_packet, standard_requests};

// ── Integer vectors ───────────────────────────────────────────────────────────

#[test]
fn two_bytes_in_both_orders() {
    let bytes = [0x02, 0x01];

    let (le, rest) = RecordDecoder::new("le").with(UInt::u16("v")).decode(&bytes);
    assert_snapshot!(le.to_string(), @"{v=258}");
    assert!(rest.is_empty());

    let (be, _) = RecordDecoder::new("be").with(UInt::u16_be("v")).decode(&bytes);
    assert_snapshot!(be.to_string(), @"{v=513}");

    let (hex, _) = RecordDecoder::new("hex").with(UInt::u16_hex("v")).decode(&bytes);
    assert_snapshot!(hex.to_string(), @"{v=0x0102}");
}

#[test]
fn four_bytes_little_endian() {
    let decoder = RecordDecoder::new("r")
        .with(UInt::u32("dec"))
        .with(UInt::u32_hex("hex"));
    let (record, _) = decoder.decode(&[0, 0, 0, 1, 0, 0, 0, 1]);
    assert_snapshot!(record.to_string(), @"{dec=16777216, hex=0x01000000}");
}

#[test]
fn one_byte_short_is_undecodable() {
    let decoder = RecordDecoder::new("r").with(UInt::u16("v"));
    let (record, rest) = decoder.decode(&[0x01]);
    assert_snapshot!(record.to_string(), @"{v=None}");
    assert_eq!(rest, [0x01]);
    assert_eq!(record.consumed(), 0);
}

// ── Setup packets ─────────────────────────────────────────────────────────────

#[test]
fn get_descriptor_request() {
    let bytes = [0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x12, 0x00];
    let (record, rest) = setup_packet().decode(&bytes);

    assert_snapshot!(
        record.to_string(),
        @"{bmRequestType=0x80, bRequest=GET_DESCRIPTOR, wValue=0x0100, wIndex=0, wLength=18}"
    );
    assert_eq!(record.consumed(), 8);
    assert!(!record.is_truncated());
    assert!(rest.is_empty());
}

#[test]
fn unknown_request_falls_back_to_hex() {
    let bytes = [0x40, 0x42, 0x34, 0x12, 0x01, 0x00, 0x00, 0x00];
    let (record, _) = setup_packet().decode(&bytes);
    assert_snapshot!(
        record.to_string(),
        @"{bmRequestType=0x40, bRequest=0x42, wValue=0x1234, wIndex=1, wLength=0}"
    );
}

#[test]
fn truncated_packet_keeps_leading_fields() {
    let (record, rest) = setup_packet().decode(&[0x80, 0x06, 0x00]);
    assert_snapshot!(
        record.to_string(),
        @"{bmRequestType=0x80, bRequest=GET_DESCRIPTOR, wValue=None, wIndex=None, wLength=None}"
    );
    assert!(record.is_truncated());
    assert_eq!(record.consumed(), 2);
    assert_eq!(rest, [0x00]);
}

#[test]
fn consumed_is_the_sum_of_whole_fields_available() {
    let bytes = [0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x12, 0x00, 0xFF];
    let widths = [1, 1, 2, 2, 2];
    let decoder = setup_packet();

    for len in 0..=bytes.len() {
        let (record, rest) = decoder.decode(&bytes[..len]);
        let expected: usize = widths
            .iter()
            .scan(0, |total, w| {
                *total += w;
                Some(*total)
            })
            .take_while(|&end| end <= len)
            .last()
            .unwrap_or(0);

        assert_eq!(record.consumed(), expected, "len {len}");
        assert_eq!(rest.len(), len - expected, "len {len}");
        assert_eq!(record.is_truncated(), expected < 8, "len {len}");
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

#[test]
fn every_sixteen_bit_value_has_a_label() {
    let lookup = standard_requests();
    for v in 0..=u64::from(u16::MAX) {
        let label = lookup.label_for_width(v, Width::Two);
        match lookup.get(v) {
            Some(mapped) => assert_eq!(label, mapped),
            None => assert_eq!(label, format!("0x{v:04X}")),
        }
    }
}

#[test]
fn big_endian_enum() {
    let decoder = RecordDecoder::new("r").with(Enum::new(
        "code",
        Width::Two,
        ByteOrder::Big,
        standard_requests(),
    ));
    let (known, _) = decoder.decode(&[0x00, 0x06]);
    assert_snapshot!(known.to_string(), @"{code=GET_DESCRIPTOR}");
    let (unknown, _) = decoder.decode(&[0x06, 0x00]);
    assert_snapshot!(unknown.to_string(), @"{code=0x0600}");
}

// ── Text and nesting ──────────────────────────────────────────────────────────

#[test]
fn string_descriptor() {
    let decoder = RecordDecoder::new("string")
        .with(UInt::u8("bLength"))
        .with(UInt::u8_hex("bDescriptorType"))
        .with(Utf16::nul_terminated("text"));
    let bytes = [0x08, 0x03, b'H', 0, b'i', 0, 0, 0, 0xAA];

    let (record, rest) = decoder.decode(&bytes);
    assert_snapshot!(record.to_string(), @"{bLength=8, bDescriptorType=0x03, text=Hi}");
    assert_eq!(record.consumed(), 8);
    assert_eq!(rest, [0xAA]);
}

#[test]
fn nested_setup_inside_transfer() {
    let transfer = RecordDecoder::new("transfer")
        .with(UInt::u8("endpoint"))
        .with(setup_packet())
        .with(UInt::u32("status"));
    assert_eq!(transfer.fixed_size(), Some(13));

    let bytes = [0x00, 0x00, 0x05, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0, 0, 0, 0];
    let (record, _) = transfer.decode(&bytes);
    assert_snapshot!(
        record.to_string(),
        @"{endpoint=0, setup={bmRequestType=0x00, bRequest=SET_ADDRESS, wValue=0x0007, wIndex=0, wLength=0}, status=0}"
    );
}

#[test]
fn layout_matches_hand_built_decoder() {
    let from_layout = RecordDecoder::from_layout(
        "setup",
        "bmRequestType:u8_hex, bRequest:u8_hex, wValue:u16_hex, wIndex:u16, wLength:u16",
    )
    .unwrap();
    let (record, _) = from_layout.decode(&[0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x12, 0x00]);
    assert_snapshot!(
        record.to_string(),
        @"{bmRequestType=0x80, bRequest=0x06, wValue=0x0100, wIndex=0, wLength=18}"
    );
}
