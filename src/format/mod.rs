//! Payload format detection.
//!
//! # Format Detection
//!
//! Use [`detect::classify`] to tag a decoded byte buffer by its magic bytes,
//! and [`detect::is_printable_text`] to decide whether an untagged buffer can
//! be shown as text. [`FormatTag::content_type`] maps a tag to the HTTP
//! content type used when the payload is served.

pub mod detect;
pub mod mime;

pub use detect::{
    classify, is_gzip, is_printable_text, is_utf8_text, printable_ratio, FormatTag,
    TEXT_PRINTABLE_THRESHOLD,
};
pub use mime::{content_disposition, is_image_column, OCTET_STREAM};
