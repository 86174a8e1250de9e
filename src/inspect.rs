//! Inspection of dumped imaging responses.
//!
//! An API response captured to a file (often pasted into a markdown note)
//! holds imaging rows whose report columns are serialized Node buffers:
//!
//! ```json
//! { "data": { "imagingData": [
//!     { "ImagingResultId": 1, "ResultData": { "type": "Buffer", "data": [31, 139, ...] } }
//! ] } }
//! ```
//!
//! [`inspect_text`] finds the JSON block in such a file and reports, per row
//! and column, what the buffer holds together with a readable preview.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::InspectError;
use crate::format::{classify, is_printable_text, FormatTag};
use crate::payload::{inflate, preview_text, Envelope, RawCell};

/// Characters of JSON kept when a value is not a buffer.
pub const JSON_PREVIEW_LIMIT: usize = 2000;

/// Columns reported for every imaging row.
pub const INSPECTED_COLUMNS: [&str; 3] = ["ResultData", "ConclusionData", "SuggestionData"];

/// What one buffer value holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferReport {
    /// Format description, e.g. `text (gzip -> utf8)` or `png`
    pub format: String,

    /// Text preview, or a note when the value cannot be shown as text
    pub preview: String,
}

impl BufferReport {
    fn new(format: impl Into<String>, preview: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            preview: preview.into(),
        }
    }
}

/// Reports for the inspected columns of one imaging row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    /// `ImagingResultId` of the row, `null` when absent
    pub id: Value,

    pub columns: Vec<(String, BufferReport)>,
}

impl fmt::Display for RowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==============================")?;
        writeln!(f, "ImagingResultId: {}", self.id)?;
        for (i, (column, report)) in self.columns.iter().enumerate() {
            if i > 0 {
                writeln!(f, "---")?;
            }
            writeln!(f, "{column} format: {}", report.format)?;
            writeln!(f, "{column} preview:")?;
            writeln!(f, "{}", report.preview)?;
        }
        Ok(())
    }
}

fn is_node_buffer(map: &Map<String, Value>) -> bool {
    map.get("type").and_then(Value::as_str) == Some("Buffer")
        && map.get("data").is_some_and(Value::is_array)
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Describe a single serialized buffer value.
///
/// - `null` reports format `null`
/// - anything other than a Node buffer reports `not-node-buffer-structure`
///   with its JSON text
/// - gzip payloads are inflated and previewed as UTF-8
/// - printable UTF-8 is previewed as is
/// - everything else reports its format tag
pub fn inspect_value(value: &Value, preview_limit: usize) -> BufferReport {
    let not_buffer = || {
        BufferReport::new(
            "not-node-buffer-structure",
            truncate_chars(&value.to_string(), JSON_PREVIEW_LIMIT),
        )
    };

    let bytes = match value {
        Value::Null => return BufferReport::new("null", "(null)"),
        Value::Object(map) if is_node_buffer(map) => match RawCell::from_json(value) {
            Some(RawCell::Bytes(bytes)) => bytes,
            _ => return not_buffer(),
        },
        _ => return not_buffer(),
    };

    let format = classify(&bytes);
    if format == FormatTag::GzipCompressed {
        let inflated = inflate(&bytes);
        if inflated.envelope == Some(Envelope::Gzip) {
            let text = String::from_utf8_lossy(&inflated.bytes);
            return BufferReport::new("text (gzip -> utf8)", preview_text(&text, preview_limit));
        }
        return BufferReport::new(format.name(), "(gzip, inflate failed)");
    }

    if is_printable_text(&bytes) {
        let text = String::from_utf8_lossy(&bytes);
        return BufferReport::new("text (utf8?)", preview_text(&text, preview_limit));
    }

    BufferReport::new(format.name(), "(binary, cannot display as text)")
}

/// Parse the JSON block spanning the first `{` to the last `}` of `text`.
pub fn extract_json_block(text: &str) -> Result<Value, InspectError> {
    let start = text.find('{').ok_or(InspectError::NoJsonBlock)?;
    let end = text.rfind('}').ok_or(InspectError::NoJsonBlock)?;
    if end <= start {
        return Err(InspectError::NoJsonBlock);
    }
    Ok(serde_json::from_str(&text[start..=end])?)
}

/// Report every row under `data.imagingData`.
///
/// A document without that array yields no rows.
pub fn inspect_document(document: &Value, preview_limit: usize) -> Vec<RowReport> {
    let Some(rows) = document
        .pointer("/data/imagingData")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| RowReport {
            id: row.get("ImagingResultId").cloned().unwrap_or(Value::Null),
            columns: INSPECTED_COLUMNS
                .iter()
                .map(|column| {
                    let value = row.get(*column).unwrap_or(&Value::Null);
                    (column.to_string(), inspect_value(value, preview_limit))
                })
                .collect(),
        })
        .collect()
}

/// Extract the JSON block from `text` and report its imaging rows.
pub fn inspect_text(text: &str, preview_limit: usize) -> Result<Vec<RowReport>, InspectError> {
    let document = extract_json_block(text)?;
    Ok(inspect_document(&document, preview_limit))
}
