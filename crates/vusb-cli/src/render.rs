//! Text and JSON rendering of decoded records.

use serde_json::{Map, Value as Json, json};
use vusb_struct::{Field, Record, Value};

/// One `name: value` line per field, nested records indented.
pub fn record_lines(record: &Record) -> Vec<String> {
    let mut lines = Vec::with_capacity(record.len());
    push_lines(record, 0, &mut lines);
    lines
}

fn push_lines(record: &Record, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for field in record {
        match field.as_record() {
            Some(nested) => {
                lines.push(format!("{indent}{}:", field.name()));
                push_lines(nested, depth + 1, lines);
            }
            None => lines.push(format!("{indent}{}: {field}", field.name())),
        }
    }
}

/// `{"record": .., "consumed": .., "truncated": .., "fields": {..}}`.
pub fn record_json(record: &Record) -> Json {
    json!({
        "record": record.name(),
        "consumed": record.consumed(),
        "truncated": record.is_truncated(),
        "fields": fields_json(record),
    })
}

fn fields_json(record: &Record) -> Json {
    let fields: Map<String, Json> = record
        .iter()
        .map(|field| (field.name().to_owned(), field_json(field)))
        .collect();
    Json::Object(fields)
}

/// Integers keep their number and their rendering; undecodable fields
/// become `null`.
fn field_json(field: &Field) -> Json {
    match field.value() {
        None => Json::Null,
        Some(Value::UInt(n)) => json!({ "value": n, "display": field.to_string() }),
        Some(Value::Text(s)) => Json::String(s.clone()),
        Some(Value::Record(r)) => fields_json(r),
    }
}
