//! # medblob
//!
//! A decoder for medical BLOB columns.
//!
//! Hospital databases store report text and images in binary columns that
//! reach applications in many shapes: native bytes, `0x`-prefixed hex, bare
//! hex dumps, base64, or JSON arrays of byte values. The payload inside is
//! often gzip, zlib or raw-deflate compressed, and report text is frequently
//! RTF. This library turns such a cell into something displayable.
//!
//! ## Pipeline
//!
//! ```text
//! RawCell ─▶ recover_bytes ─▶ inflate ─▶ classify ─┬─▶ Binary { bytes, format }
//!                                                  └─▶ Text   { rtf_to_plain_text }
//! ```
//!
//! ## Architecture
//!
//! - [`mod@format`] - magic-byte sniffing and content-type mapping
//! - [`payload`] - byte recovery, decompression, RTF conversion, artifacts
//! - [`record`] - decoding of health-assessment imaging rows
//! - [`source`] - raw cell retrieval (`CellSource`) and an in-memory source
//! - [`server`] - Axum-based HTTP API
//! - [`inspect`] - reports on dumped imaging responses
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use medblob::{decode_to_text, rtf_to_plain_text, RawCell};
//!
//! let cell = RawCell::from(hex::encode(r"{\rtf1\ansi\par Hello\par}"));
//! let text = decode_to_text(&cell).unwrap();
//! assert_eq!(rtf_to_plain_text(&text), "Hello");
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod inspect;
pub mod payload;
pub mod record;
pub mod server;
pub mod source;

// Re-export commonly used types
pub use config::{Cli, Command, InspectConfig, ServeConfig};
pub use error::{ApiError, DecodeError, InspectError, SourceError};
pub use format::{
    classify, content_disposition, is_gzip, is_image_column, is_printable_text, is_utf8_text,
    printable_ratio, FormatTag, OCTET_STREAM, TEXT_PRINTABLE_THRESHOLD,
};
pub use inspect::{
    extract_json_block, inspect_document, inspect_text, inspect_value, BufferReport, RowReport,
};
pub use payload::{
    decode_artifact, decode_to_text, decompress, inflate, inflate_with_limit, is_rtf, preview_text,
    recover_bytes, rtf_to_plain_text, CellEncoding, DecodedArtifact, Envelope, Inflated, RawCell,
    RecoveredBytes, DEFAULT_PREVIEW_LIMIT, MAX_INFLATED_SIZE, TRUNCATION_MARKER,
};
pub use record::{decode_field, decode_imaging_row, decode_imaging_rows, DecodedField};
pub use server::{create_router, AppState, RouterConfig};
pub use source::{fetch_first, CellLocator, CellSource, MemoryCellSource};
