/// Implementation of `vusb decode`.
///
/// Builds a [`RecordDecoder`] from `--layout`, decodes the hex argument
/// and prints one `name: value` line per field followed by the number of
/// bytes left over. Fields the input was too short for print as `None`.
///
/// ```text
/// $ vusb decode --layout "len:u16,kind:u8_hex" "02 01"
/// len: 258
/// kind: None
/// truncated after 2 bytes
/// 0 bytes remaining
/// ```
use anyhow::{Context, Result};
use vusb_struct::RecordDecoder;

use crate::DecodeArgs;
use crate::render;

/// # Errors
///
/// Returns an error if the layout does not parse or the input is not
/// valid hex.
pub fn run(args: &DecodeArgs) -> Result<()> {
    let decoder = RecordDecoder::from_layout("record", &args.layout)
        .with_context(|| format!("invalid layout {:?}", args.layout))?;

    let digits: String = args.hex.split_whitespace().collect();
    let bytes = hex::decode(&digits).with_context(|| format!("invalid hex {:?}", args.hex))?;

    let (record, rest) = decoder.decode(&bytes);

    if args.json {
        let mut out = render::record_json(&record);
        out["remaining"] = rest.len().into();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for line in render::record_lines(&record) {
        println!("{line}");
    }
    if record.is_truncated() {
        println!("truncated after {} bytes", record.consumed());
    }
    println!("{} bytes remaining", rest.len());
    Ok(())
}
