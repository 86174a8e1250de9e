//! Best-effort RTF to plain text conversion.
//!
//! Clinical reports are frequently stored as RTF. This is not an RTF
//! parser: control words are stripped with a handful of patterns and the
//! surrounding text is kept. Fonts, tables and embedded objects degrade to
//! whatever text is left between their control words.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::format::detect::RTF_MAGIC;

lazy_static! {
    /// `\uN` with an optional `\'hh` ANSI fallback.
    static ref UNICODE_ESCAPE: Regex = Regex::new(r"\\u(-?\d+)(?:\\'[0-9a-fA-F]{2})?").unwrap();

    static ref PARAGRAPH: Regex = Regex::new(r"\\pard?\b").unwrap();

    /// Backslash, letters, optional signed number, optional delimiter space.
    static ref CONTROL_WORD: Regex = Regex::new(r"\\[a-zA-Z]+-?\d* ?").unwrap();

    static ref HEX_ESCAPE: Regex = Regex::new(r"\\'[0-9a-fA-F]{2}").unwrap();

    static ref GROUP_BRACE: Regex = Regex::new(r"[{}]").unwrap();

    static ref SPACE_BEFORE_NEWLINE: Regex = Regex::new(r"\s+\n").unwrap();

    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Offset applied to negative `\uN` values (RTF stores them as signed 16-bit).
const UNICODE_SIGNED_OFFSET: i64 = 65536;

/// Whether a string starts with the RTF header `{\rtf`.
pub fn is_rtf(text: &str) -> bool {
    text.as_bytes().starts_with(RTF_MAGIC)
}

/// Convert RTF to plain text.
///
/// Text that does not start with `{\rtf` is returned unchanged, so applying
/// this twice is the same as applying it once. Output never starts with
/// `{\rtf` because group braces are removed.
pub fn rtf_to_plain_text(text: &str) -> Cow<'_, str> {
    if !is_rtf(text) {
        return Cow::Borrowed(text);
    }

    let out = UNICODE_ESCAPE.replace_all(text, |caps: &Captures| {
        decode_unicode_escape(&caps[1])
            .map(String::from)
            .unwrap_or_default()
    });
    let out = PARAGRAPH.replace_all(&out, "\n");
    let out = CONTROL_WORD.replace_all(&out, "");
    let out = HEX_ESCAPE.replace_all(&out, "");
    let out = GROUP_BRACE.replace_all(&out, "");
    let out = SPACE_BEFORE_NEWLINE.replace_all(&out, "\n");
    let out = EXCESS_NEWLINES.replace_all(&out, "\n\n");

    Cow::Owned(out.trim().to_string())
}

/// Map the numeric argument of `\uN` to a character.
///
/// Values that do not name a Unicode scalar (surrogates, out of range)
/// produce nothing.
fn decode_unicode_escape(digits: &str) -> Option<char> {
    let code: i64 = digits.parse().ok()?;
    let code = if code < 0 {
        code + UNICODE_SIGNED_OFFSET
    } else {
        code
    };
    u32::try_from(code).ok().and_then(char::from_u32)
}

// =============================================================================
// Tests
// =============================================================================
