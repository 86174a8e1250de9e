//! Decoding of health-assessment imaging rows.
//!
//! Imaging result rows carry three report columns (result, conclusion,
//! suggestion), each stored compressed and often RTF-formatted. Depending
//! on the view, a column is named `<Field>Data` or just `<Field>`.
//!
//! [`decode_imaging_row`] keeps every original column and adds, per field:
//!
//! - `<Field>Text` - the decoded text (RTF markup intact)
//! - `<Field>Plain` - the same text with RTF converted to plain text

use serde_json::{Map, Value};

use crate::payload::{decode_to_text, rtf_to_plain_text, RawCell};

/// Report fields decoded on every imaging row.
pub const IMAGING_REPORT_FIELDS: [&str; 3] = ["Result", "Conclusion", "Suggestion"];

/// Decoded text for one report field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedField {
    pub text: Option<String>,
    pub plain: Option<String>,
}

/// Decode a single JSON cell to text and plain text.
pub fn decode_field(value: Option<&Value>) -> DecodedField {
    let text = value
        .and_then(RawCell::from_json)
        .and_then(|cell| decode_to_text(&cell));
    let plain = text
        .as_deref()
        .map(|text| rtf_to_plain_text(text).into_owned());
    DecodedField { text, plain }
}

/// Locate the raw value of a report field, preferring `<Field>Data`.
fn field_value<'a>(row: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    row.get(&format!("{field}Data"))
        .filter(|v| !v.is_null())
        .or_else(|| row.get(field))
}

/// Decode the report fields of an imaging row.
pub fn decode_imaging_row(row: &Map<String, Value>) -> Map<String, Value> {
    let mut out = row.clone();
    for field in IMAGING_REPORT_FIELDS {
        let decoded = decode_field(field_value(row, field));
        out.insert(format!("{field}Text"), option_to_json(decoded.text));
        out.insert(format!("{field}Plain"), option_to_json(decoded.plain));
    }
    out
}

/// Decode a list of imaging rows. Non-object entries are passed through.
pub fn decode_imaging_rows(rows: &[Value]) -> Vec<Value> {
    rows.iter()
        .map(|row| match row {
            Value::Object(map) => Value::Object(decode_imaging_row(map)),
            other => other.clone(),
        })
        .collect()
}

fn option_to_json(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}
