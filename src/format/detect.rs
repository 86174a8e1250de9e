//! Magic-byte classification of decoded cell payloads.
//!
//! Classification looks only at the shortest prefix that identifies a
//! format. Nothing is parsed beyond the signature, so a truncated PNG is
//! still a PNG as far as this module is concerned.
//!
//! Supported signatures, checked in order:
//!
//! - **gzip**: `1F 8B`
//! - **PDF**: `%PDF`
//! - **ZIP** (also DOCX/XLSX/PPTX): `PK\x03\x04`
//! - **RTF**: `{\rtf`
//! - **PNG**, **JPEG**, **GIF**, **WebP**, **BMP**, **TIFF**
//! - **DICOM**: `DICM` after the 128-byte preamble

// =============================================================================
// FormatTag
// =============================================================================

/// Detected payload format.
///
/// Classification is pure: the same bytes always produce the same tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// Zero-length input
    Empty,

    /// gzip envelope (`1F 8B`)
    GzipCompressed,

    /// PDF document
    Pdf,

    /// ZIP container, including Office Open XML documents
    ZipArchive,

    /// Rich Text Format document
    Rtf,

    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,

    /// TIFF, either byte order
    Tiff,

    /// DICOM Part 10 file
    Dicom,

    /// None of the known signatures matched
    UnknownBinary,
}

impl FormatTag {
    /// Stable tag name, as reported in API responses.
    pub const fn name(&self) -> &'static str {
        match self {
            FormatTag::Empty => "empty",
            FormatTag::GzipCompressed => "gzip-compressed",
            FormatTag::Pdf => "pdf",
            FormatTag::ZipArchive => "zip-archive",
            FormatTag::Rtf => "rtf",
            FormatTag::Png => "png",
            FormatTag::Jpeg => "jpeg",
            FormatTag::Gif => "gif",
            FormatTag::Webp => "webp",
            FormatTag::Bmp => "bmp",
            FormatTag::Tiff => "tiff",
            FormatTag::Dicom => "dicom",
            FormatTag::UnknownBinary => "unknown-binary",
        }
    }

    /// Whether this tag is one of the raster image formats.
    pub const fn is_image(&self) -> bool {
        matches!(
            self,
            FormatTag::Png
                | FormatTag::Jpeg
                | FormatTag::Gif
                | FormatTag::Webp
                | FormatTag::Bmp
                | FormatTag::Tiff
        )
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Signatures
// =============================================================================

pub(crate) const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
pub(crate) const RTF_MAGIC: &[u8] = b"{\\rtf";
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_MAGIC: &[u8] = b"GIF";
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_MAGIC: &[u8] = b"WEBP";
const BMP_MAGIC: &[u8] = &[0x42, 0x4D];
const TIFF_LE_MAGIC: &[u8] = &[0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];
const DICOM_MAGIC: &[u8] = b"DICM";

/// Offset of the `DICM` marker (after the 128-byte preamble).
const DICOM_MAGIC_OFFSET: usize = 128;

/// Fraction of printable characters above which a buffer is treated as text.
pub const TEXT_PRINTABLE_THRESHOLD: f64 = 0.8;

// =============================================================================
// Classification
// =============================================================================

/// Classify a byte sequence by its leading signature.
///
/// Never fails: zero-length input is [`FormatTag::Empty`] and anything
/// unrecognized is [`FormatTag::UnknownBinary`].
pub fn classify(bytes: &[u8]) -> FormatTag {
    if bytes.is_empty() {
        return FormatTag::Empty;
    }

    if bytes.starts_with(GZIP_MAGIC) {
        FormatTag::GzipCompressed
    } else if bytes.starts_with(PDF_MAGIC) {
        FormatTag::Pdf
    } else if bytes.starts_with(ZIP_MAGIC) {
        FormatTag::ZipArchive
    } else if bytes.starts_with(RTF_MAGIC) {
        FormatTag::Rtf
    } else if bytes.starts_with(PNG_MAGIC) {
        FormatTag::Png
    } else if bytes.starts_with(JPEG_MAGIC) {
        FormatTag::Jpeg
    } else if bytes.starts_with(GIF_MAGIC) {
        FormatTag::Gif
    } else if is_webp(bytes) {
        FormatTag::Webp
    } else if bytes.starts_with(BMP_MAGIC) {
        FormatTag::Bmp
    } else if bytes.starts_with(TIFF_LE_MAGIC) || bytes.starts_with(TIFF_BE_MAGIC) {
        FormatTag::Tiff
    } else if is_dicom(bytes) {
        FormatTag::Dicom
    } else {
        FormatTag::UnknownBinary
    }
}

/// Check for a gzip envelope.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(GZIP_MAGIC)
}

/// `RIFF` container whose form type at offset 8 is `WEBP`.
fn is_webp(bytes: &[u8]) -> bool {
    bytes.starts_with(RIFF_MAGIC) && bytes.get(8..12) == Some(WEBP_MAGIC)
}

fn is_dicom(bytes: &[u8]) -> bool {
    bytes.len() > DICOM_MAGIC_OFFSET + DICOM_MAGIC.len()
        && &bytes[DICOM_MAGIC_OFFSET..DICOM_MAGIC_OFFSET + DICOM_MAGIC.len()] == DICOM_MAGIC
}

// =============================================================================
// Text Heuristic
// =============================================================================

/// Fraction of characters that are printable ASCII (9..=126).
///
/// Returns `None` if the buffer is empty or is not valid UTF-8.
pub fn printable_ratio(bytes: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(bytes).ok()?;

    let mut total = 0usize;
    let mut printable = 0usize;
    for c in text.chars() {
        total += 1;
        if matches!(c as u32, 9..=126) {
            printable += 1;
        }
    }

    if total == 0 {
        return None;
    }
    Some(printable as f64 / total as f64)
}

/// Decide whether a buffer is displayable as text.
///
/// Malformed UTF-8 is treated as binary rather than reported.
pub fn is_printable_text(bytes: &[u8]) -> bool {
    printable_ratio(bytes).is_some_and(|ratio| ratio > TEXT_PRINTABLE_THRESHOLD)
}

/// Whether a buffer is well-formed UTF-8 text in any script.
///
/// Unlike [`is_printable_text`], non-ASCII letters count. The buffer must be
/// non-empty and free of control characters other than tab, CR and LF.
pub fn is_utf8_text(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            !text.is_empty()
                && !text
                    .chars()
                    .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        }
        Err(_) => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
