use thiserror::Error;

/// Reasons a single decode attempt was rejected.
///
/// These never escape the public decode functions, which are total over
/// their input. They exist so each fall-through can be logged with a cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input had nothing to decode
    #[error("Empty input")]
    Empty,

    /// Text was not a JSON array of integers in 0..=255
    #[error("Invalid numeric array: {0}")]
    InvalidNumericArray(String),

    /// Text was not valid hexadecimal
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Text was not valid base64
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// A gzip/zlib/deflate stream could not be inflated
    #[error("Inflate failed ({envelope}): {message}")]
    Inflate {
        envelope: &'static str,
        message: String,
    },

    /// Inflated output grew past the configured cap
    #[error("Inflated output exceeds {limit} bytes ({envelope})")]
    OutputLimit { envelope: &'static str, limit: usize },
}

/// Errors returned by a cell source when fetching raw values.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Table or row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Table or column name is not a safe SQL identifier
    #[error("Invalid identifier for {field}: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },

    /// The backing store failed
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter was missing or empty
    #[error("Missing required parameters: {0}")]
    MissingParameters(String),

    /// The requested cell is NULL, absent, or decodes to nothing
    #[error("{0}")]
    NotFound(String),

    /// The cell source failed
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors raised while inspecting a dumped API response.
#[derive(Debug, Error)]
pub enum InspectError {
    /// No `{ ... }` block in the input
    #[error("No JSON block found in input")]
    NoJsonBlock,

    /// The block between the first `{` and the last `}` is not valid JSON
    #[error("Invalid JSON block: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The input file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
