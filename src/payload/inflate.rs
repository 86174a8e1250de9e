//! Opportunistic decompression of recovered cell bytes.
//!
//! Upstream storage does not record which compression variant was used, so
//! the variant is inferred:
//!
//! 1. gzip, when the buffer starts with `1F 8B`
//! 2. otherwise zlib, then raw deflate
//!
//! A buffer that does not inflate, or whose output would exceed
//! [`MAX_INFLATED_SIZE`], is returned unchanged. Decompression is a
//! best-effort step and never reports an error to the caller.

use std::io::Read;

use flate2::read::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use tracing::debug;

use crate::error::DecodeError;
use crate::format::{classify, is_gzip, is_printable_text, is_utf8_text, FormatTag};

/// Compression envelope stripped from a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Gzip,
    Zlib,
    RawDeflate,
}

impl Envelope {
    pub const fn name(&self) -> &'static str {
        match self {
            Envelope::Gzip => "gzip",
            Envelope::Zlib => "zlib",
            Envelope::RawDeflate => "raw-deflate",
        }
    }
}

/// Initial output buffer size for zlib/deflate streams.
const MIN_INFLATE_CAPACITY: usize = 256;

/// Largest inflated payload kept (64 MiB). Larger streams pass through.
pub const MAX_INFLATED_SIZE: usize = 64 * 1024 * 1024;

/// Result of [`inflate`]: the output bytes and the envelope that was removed.
///
/// `envelope` is `None` when the input was passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inflated {
    pub bytes: Vec<u8>,
    pub envelope: Option<Envelope>,
}

/// Decompress a buffer if it is gzip, zlib or raw-deflate compressed.
///
/// Returns the original bytes when no variant inflates.
pub fn decompress(bytes: &[u8]) -> Vec<u8> {
    inflate(bytes).bytes
}

/// Decompress a buffer, reporting which envelope was stripped.
///
/// Gzip input that fails to inflate is returned unchanged without trying
/// the other variants. Buffers carrying a known uncompressed signature
/// (PNG, PDF, RTF, ...) are never fed to the deflate decoders, and raw
/// deflate is skipped for text since it has no header to verify.
pub fn inflate(bytes: &[u8]) -> Inflated {
    inflate_with_limit(bytes, MAX_INFLATED_SIZE)
}

/// [`inflate`] with an explicit cap on the inflated size.
pub fn inflate_with_limit(bytes: &[u8], max_output: usize) -> Inflated {
    if bytes.is_empty() {
        return passthrough(bytes);
    }

    if is_gzip(bytes) {
        return match gunzip(bytes, max_output) {
            Ok(out) => Inflated {
                bytes: out,
                envelope: Some(Envelope::Gzip),
            },
            Err(e) => {
                debug!(error = %e, "gzip signature present but inflate failed");
                passthrough(bytes)
            }
        };
    }

    if classify(bytes) != FormatTag::UnknownBinary {
        return passthrough(bytes);
    }

    match zlib_inflate(bytes, max_output) {
        Ok(out) => {
            return Inflated {
                bytes: out,
                envelope: Some(Envelope::Zlib),
            }
        }
        Err(e) => debug!(error = %e, "zlib inflate rejected"),
    }

    if is_printable_text(bytes) || is_utf8_text(bytes) {
        return passthrough(bytes);
    }

    match raw_inflate(bytes, max_output) {
        Ok(out) => Inflated {
            bytes: out,
            envelope: Some(Envelope::RawDeflate),
        },
        Err(e) => {
            debug!(error = %e, "raw deflate rejected");
            passthrough(bytes)
        }
    }
}

fn passthrough(bytes: &[u8]) -> Inflated {
    Inflated {
        bytes: bytes.to_vec(),
        envelope: None,
    }
}

fn gunzip(bytes: &[u8], max_output: usize) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .take((max_output as u64).saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| inflate_error(Envelope::Gzip, e))?;

    if out.len() > max_output {
        return Err(DecodeError::OutputLimit {
            envelope: Envelope::Gzip.name(),
            limit: max_output,
        });
    }
    Ok(out)
}

fn zlib_inflate(bytes: &[u8], max_output: usize) -> Result<Vec<u8>, DecodeError> {
    inflate_stream(bytes, Envelope::Zlib, max_output)
}

/// Raw deflate has no header or checksum, so a decode must also produce
/// something to count.
fn raw_inflate(bytes: &[u8], max_output: usize) -> Result<Vec<u8>, DecodeError> {
    let out = inflate_stream(bytes, Envelope::RawDeflate, max_output)?;
    if out.is_empty() {
        return Err(DecodeError::Inflate {
            envelope: Envelope::RawDeflate.name(),
            message: "empty output".to_string(),
        });
    }
    Ok(out)
}

/// Inflate a zlib or raw deflate stream.
///
/// The stream must reach its end marker and consume the whole input;
/// running out of input early, leaving trailing bytes or producing more
/// than `max_output` bytes is a failure.
fn inflate_stream(
    bytes: &[u8],
    envelope: Envelope,
    max_output: usize,
) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = Decompress::new(envelope == Envelope::Zlib);
    let capacity = bytes
        .len()
        .saturating_mul(4)
        .max(MIN_INFLATE_CAPACITY)
        .min(max_output.saturating_add(1));
    let mut out = Vec::with_capacity(capacity);

    loop {
        let consumed = decoder.total_in() as usize;
        let status = decoder
            .decompress_vec(&bytes[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| DecodeError::Inflate {
                envelope: envelope.name(),
                message: e.to_string(),
            })?;

        if out.len() > max_output {
            return Err(DecodeError::OutputLimit {
                envelope: envelope.name(),
                limit: max_output,
            });
        }

        if status == Status::StreamEnd {
            break;
        }

        // Output space left over means the decoder starved on input
        if out.len() < out.capacity() {
            return Err(DecodeError::Inflate {
                envelope: envelope.name(),
                message: "truncated stream".to_string(),
            });
        }
        let room = max_output.saturating_add(1) - out.len();
        out.reserve(out.capacity().min(room));
    }

    if decoder.total_in() != bytes.len() as u64 {
        return Err(DecodeError::Inflate {
            envelope: envelope.name(),
            message: format!(
                "stream ended after {} of {} bytes",
                decoder.total_in(),
                bytes.len()
            ),
        });
    }

    Ok(out)
}

fn inflate_error(envelope: Envelope, e: std::io::Error) -> DecodeError {
    DecodeError::Inflate {
        envelope: envelope.name(),
        message: e.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
