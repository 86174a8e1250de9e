//! Content-type mapping for decoded payloads.

use super::detect::FormatTag;

/// Fallback content type for anything without a dedicated mapping.
pub const OCTET_STREAM: &str = "application/octet-stream";

impl FormatTag {
    /// HTTP content type used when emitting a payload with this tag.
    pub const fn content_type(&self) -> &'static str {
        match self {
            FormatTag::Png => "image/png",
            FormatTag::Jpeg => "image/jpeg",
            FormatTag::Gif => "image/gif",
            FormatTag::Webp => "image/webp",
            FormatTag::Bmp => "image/bmp",
            FormatTag::Tiff => "image/tiff",
            FormatTag::Dicom => "application/dicom",
            _ => OCTET_STREAM,
        }
    }

    /// Whether a browser can show the payload inline rather than download it.
    pub const fn is_inline_displayable(&self) -> bool {
        self.is_image()
    }
}

/// `Content-Disposition` header value for a payload.
pub fn content_disposition(format: FormatTag) -> &'static str {
    if format.is_inline_displayable() {
        "inline"
    } else {
        "attachment; filename=\"image\""
    }
}

/// SQL data types that usually hold image payloads.
const IMAGE_DATA_TYPES: &[&str] = &["image", "varbinary", "binary", "blob"];

/// Column-name fragments that usually mark image payloads.
const IMAGE_COLUMN_HINTS: &[&str] = &[
    "image", "photo", "img", "picture", "scan", "xray", "ct", "mri",
];

/// Guess whether a column holds images from its SQL type or its name.
///
/// Both checks are case-insensitive substring matches, so this is a hint
/// for viewers choosing which columns to offer, not a guarantee.
pub fn is_image_column(data_type: &str, column_name: &str) -> bool {
    let data_type = data_type.to_ascii_lowercase();
    let column_name = column_name.to_ascii_lowercase();

    IMAGE_DATA_TYPES.iter().any(|t| data_type.contains(t))
        || IMAGE_COLUMN_HINTS.iter().any(|n| column_name.contains(n))
}
