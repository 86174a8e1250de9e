//! End-to-end decoding of a raw cell into something displayable.
//!
//! ```text
//! RawCell ──recover_bytes──▶ bytes ──inflate──▶ bytes ──classify──▶ FormatTag
//!                                                   │
//!                                   text-like ──────┴──▶ rtf_to_plain_text
//! ```

use std::borrow::Cow;

use bytes::Bytes;
use tracing::debug;

use crate::format::{classify, is_printable_text, is_utf8_text, FormatTag};

use super::cell::{recover_bytes, RawCell};
use super::inflate::inflate;
use super::rtf::rtf_to_plain_text;

/// Default number of characters kept by [`preview_text`].
pub const DEFAULT_PREVIEW_LIMIT: usize = 4000;

/// Marker appended to truncated previews.
pub const TRUNCATION_MARKER: &str = "\n...[truncated]...";

// =============================================================================
// DecodedArtifact
// =============================================================================

/// The displayable result of decoding a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedArtifact {
    /// Binary payload; `format` always matches `classify(&bytes)`
    Binary { bytes: Bytes, format: FormatTag },

    /// Text payload, with the tag of the bytes it was decoded from
    Text { text: String, source: FormatTag },
}

impl DecodedArtifact {
    /// Format tag of the payload (or of the bytes a text came from).
    pub fn format(&self) -> FormatTag {
        match self {
            DecodedArtifact::Binary { format, .. } => *format,
            DecodedArtifact::Text { source, .. } => *source,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DecodedArtifact::Text { .. })
    }

    /// HTTP content type for emitting this artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            DecodedArtifact::Binary { format, .. } => format.content_type(),
            DecodedArtifact::Text { .. } => "text/plain; charset=utf-8",
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Bytes to display for a cell, or the cell's own text.
enum Resolved<'a> {
    Payload(Vec<u8>),
    Original(&'a str),
}

/// Recover and decompress a cell.
///
/// A textual cell keeps its original text when nothing recognizable comes
/// out of it: no compression envelope, no known signature, and not text
/// (malformed UTF-8 or stray control characters). Short words are often
/// valid hex or base64 by accident.
fn resolve(raw: &RawCell) -> Option<Resolved<'_>> {
    let Some(recovered) = recover_bytes(raw) else {
        return raw.as_text().map(Resolved::Original);
    };

    let inflated = inflate(&recovered.bytes);

    if let RawCell::Text(original) = raw {
        if inflated.envelope.is_none()
            && classify(&inflated.bytes) == FormatTag::UnknownBinary
            && !looks_like_text(&inflated.bytes)
        {
            debug!(
                encoding = recovered.encoding.name(),
                "Recovered bytes are unrecognized, keeping original text"
            );
            return Some(Resolved::Original(original));
        }
    }

    if let Some(envelope) = inflated.envelope {
        debug!(
            encoding = recovered.encoding.name(),
            envelope = envelope.name(),
            compressed = recovered.bytes.len(),
            inflated = inflated.bytes.len(),
            "Inflated cell payload"
        );
    }

    Some(Resolved::Payload(inflated.bytes))
}

/// Printable ASCII, or well-formed UTF-8 in any script.
fn looks_like_text(bytes: &[u8]) -> bool {
    is_printable_text(bytes) || is_utf8_text(bytes)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a cell to text.
///
/// Recovers bytes, inflates them if compressed, and decodes UTF-8 (invalid
/// sequences become U+FFFD). A textual cell that yields nothing usable is
/// returned unchanged. RTF is not converted here; see
/// [`rtf_to_plain_text`].
///
/// Returns `None` only when the cell is binary and cannot be recovered,
/// which does not happen for [`RawCell::Bytes`].
pub fn decode_to_text(raw: &RawCell) -> Option<String> {
    match resolve(raw)? {
        Resolved::Original(text) => Some(text.to_string()),
        Resolved::Payload(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// Decode a cell to a typed artifact.
///
/// RTF and text become [`DecodedArtifact::Text`] (RTF already converted to
/// plain text); everything else is [`DecodedArtifact::Binary`]. Returns
/// `None` for empty or whitespace-only payloads.
pub fn decode_artifact(raw: &RawCell) -> Option<DecodedArtifact> {
    let bytes = match resolve(raw)? {
        Resolved::Original(text) => {
            if text.trim().is_empty() {
                return None;
            }
            let source = classify(text.as_bytes());
            return Some(DecodedArtifact::Text {
                text: rtf_to_plain_text(text).into_owned(),
                source,
            });
        }
        Resolved::Payload(bytes) => bytes,
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let format = classify(&bytes);
    match format {
        FormatTag::Empty => None,
        FormatTag::Rtf => {
            let text = String::from_utf8_lossy(&bytes);
            Some(DecodedArtifact::Text {
                text: rtf_to_plain_text(&text).into_owned(),
                source: format,
            })
        }
        FormatTag::UnknownBinary if looks_like_text(&bytes) => {
            // both text checks require valid UTF-8
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Some(DecodedArtifact::Text {
                text,
                source: format,
            })
        }
        _ => Some(DecodedArtifact::Binary {
            bytes: Bytes::from(bytes),
            format,
        }),
    }
}

/// Truncate a text preview to `limit` characters.
///
/// Truncated previews end with [`TRUNCATION_MARKER`].
pub fn preview_text(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_MARKER)),
    }
}

// =============================================================================
// Tests
// =============================================================================
