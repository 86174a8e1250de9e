//! Cell payload normalization.
//!
//! Turns a raw database cell into bytes or text:
//!
//! - [`cell`] - byte recovery from native, hex, base64 and numeric-array cells
//! - [`inflate`] - gzip / zlib / raw-deflate detection and decompression
//! - [`rtf`] - RTF to plain text
//! - [`artifact`] - the full pipeline, producing a [`DecodedArtifact`]
//!
//! Every function here is total over its input: failures fall back to the
//! original value or to `None`, never to an error.

pub mod artifact;
pub mod cell;
pub mod inflate;
pub mod rtf;

pub use artifact::{
    decode_artifact, decode_to_text, preview_text, DecodedArtifact, DEFAULT_PREVIEW_LIMIT,
    TRUNCATION_MARKER,
};
pub use cell::{recover_bytes, CellEncoding, RawCell, RecoveredBytes};
pub use inflate::{decompress, inflate, inflate_with_limit, Envelope, Inflated, MAX_INFLATED_SIZE};
pub use rtf::{is_rtf, rtf_to_plain_text};
