//! Raw database cell values and byte recovery.
//!
//! Database drivers hand BLOB/VARBINARY columns back in several shapes:
//! native bytes, `0x`-prefixed hex, bare hex dumps, base64, or a JSON array
//! of byte values. [`recover_bytes`] tries each textual form in a fixed
//! order and reports which one matched.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::error::DecodeError;

/// Standard alphabet, padding optional.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// =============================================================================
// RawCell
// =============================================================================

/// A value as read from a database column.
///
/// Textual cells may carry hex, base64, a numeric-array JSON string, or just
/// plain text; [`recover_bytes`] tells them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCell {
    /// Native binary value
    Bytes(Vec<u8>),

    /// Any textual value
    Text(String),
}

impl RawCell {
    /// Map a JSON value produced by a database driver or a row dump.
    ///
    /// - `null` has no cell
    /// - strings are [`RawCell::Text`]
    /// - arrays of integers in `0..=255` are [`RawCell::Bytes`]
    /// - `{"type": "Buffer", "data": [...]}` objects are [`RawCell::Bytes`]
    /// - numbers and booleans are [`RawCell::Text`] of their JSON rendering
    ///
    /// Any other structure returns `None`.
    pub fn from_json(value: &Value) -> Option<RawCell> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(RawCell::Text(s.clone())),
            Value::Number(_) | Value::Bool(_) => Some(RawCell::Text(value.to_string())),
            Value::Array(items) => byte_array(items).map(RawCell::Bytes),
            Value::Object(map) => match (map.get("type"), map.get("data")) {
                (Some(Value::String(kind)), Some(Value::Array(items))) if kind == "Buffer" => {
                    byte_array(items).map(RawCell::Bytes)
                }
                _ => None,
            },
        }
    }

    /// Whether the cell holds no bytes or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Bytes(bytes) => bytes.is_empty(),
            RawCell::Text(text) => text.is_empty(),
        }
    }

    /// The textual value, if this cell is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCell::Text(s) => Some(s),
            RawCell::Bytes(_) => None,
        }
    }
}

impl From<Vec<u8>> for RawCell {
    fn from(bytes: Vec<u8>) -> Self {
        RawCell::Bytes(bytes)
    }
}

impl From<&[u8]> for RawCell {
    fn from(bytes: &[u8]) -> Self {
        RawCell::Bytes(bytes.to_vec())
    }
}

impl From<String> for RawCell {
    fn from(text: String) -> Self {
        RawCell::Text(text)
    }
}

impl From<&str> for RawCell {
    fn from(text: &str) -> Self {
        RawCell::Text(text.to_string())
    }
}

fn byte_array(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

// =============================================================================
// Byte Recovery
// =============================================================================

/// Encoding that produced a recovered byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEncoding {
    /// Cell was already binary
    Native,

    /// JSON array of byte values, e.g. `"[31,139,8]"`
    NumericArray,

    /// Bare even-length hex dump
    Hex,

    /// `0x`/`0X`-prefixed hex literal
    PrefixedHex,

    Base64,
}

impl CellEncoding {
    pub const fn name(&self) -> &'static str {
        match self {
            CellEncoding::Native => "native",
            CellEncoding::NumericArray => "numeric-array",
            CellEncoding::Hex => "hex",
            CellEncoding::PrefixedHex => "prefixed-hex",
            CellEncoding::Base64 => "base64",
        }
    }
}

/// Bytes recovered from a cell, with the encoding that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredBytes {
    pub bytes: Vec<u8>,
    pub encoding: CellEncoding,
}

/// Recover the byte sequence behind a cell value.
///
/// Attempts, first success wins:
///
/// 1. native bytes, returned as-is
/// 2. JSON array of integers in `0..=255`
/// 3. bare hex matching `^[0-9a-fA-F]+$` with even length
/// 4. `0x`/`0X`-prefixed hex
/// 5. base64
///
/// Hex is tried before base64 because most hex dumps are also valid base64.
/// Text is trimmed first. Returns `None` when every attempt fails.
pub fn recover_bytes(raw: &RawCell) -> Option<RecoveredBytes> {
    let text = match raw {
        RawCell::Bytes(bytes) => {
            return Some(RecoveredBytes {
                bytes: bytes.clone(),
                encoding: CellEncoding::Native,
            })
        }
        RawCell::Text(text) => text.trim(),
    };

    if text.is_empty() {
        debug!(error = %DecodeError::Empty, "Cell has no recoverable bytes");
        return None;
    }

    let attempts: [(CellEncoding, fn(&str) -> Result<Vec<u8>, DecodeError>); 4] = [
        (CellEncoding::NumericArray, decode_numeric_array),
        (CellEncoding::Hex, decode_bare_hex),
        (CellEncoding::PrefixedHex, decode_prefixed_hex),
        (CellEncoding::Base64, decode_base64),
    ];

    for (encoding, attempt) in attempts {
        match attempt(text) {
            Ok(bytes) => return Some(RecoveredBytes { bytes, encoding }),
            Err(e) => debug!(encoding = encoding.name(), error = %e, "Decode attempt rejected"),
        }
    }

    None
}

fn decode_numeric_array(text: &str) -> Result<Vec<u8>, DecodeError> {
    if !(text.starts_with('[') && text.ends_with(']')) {
        return Err(DecodeError::InvalidNumericArray(
            "not a bracketed array".to_string(),
        ));
    }
    serde_json::from_str::<Vec<u8>>(text).map_err(|e| DecodeError::InvalidNumericArray(e.to_string()))
}

fn decode_bare_hex(text: &str) -> Result<Vec<u8>, DecodeError> {
    if text.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex("odd length".to_string()));
    }
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex("non-hex character".to_string()));
    }
    hex::decode(text).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

fn decode_prefixed_hex(text: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| DecodeError::InvalidHex("missing 0x prefix".to_string()))?;
    if digits.is_empty() {
        return Err(DecodeError::Empty);
    }
    hex::decode(digits).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    BASE64
        .decode(text)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
