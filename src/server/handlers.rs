//! HTTP request handlers for the medblob decode API.
//!
//! # Endpoints
//!
//! - `GET /api/database-viewer/image` - Decode a cell and emit its payload
//! - `GET /api/database-viewer/text` - Decode a cell to text
//! - `POST /api/decode` - Decode a JSON value supplied in the body
//! - `POST /api/decode/imaging` - Decode the report fields of imaging rows
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ApiError, SourceError};
use crate::format::content_disposition;
use crate::payload::{decode_artifact, decode_to_text, rtf_to_plain_text, DecodedArtifact, RawCell};
use crate::record::decode_imaging_rows;
use crate::source::{CellLocator, CellSource};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the cell source.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: CellSource> {
    /// Where raw cells are fetched from
    pub source: Arc<S>,

    /// Cache-Control max-age in seconds for emitted payloads (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl<S: CellSource> AppState<S> {
    /// Create a new application state with the given source.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            cache_max_age: 3600,
        }
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(source: S, cache_max_age: u32) -> Self {
        Self {
            source: Arc::new(source),
            cache_max_age,
        }
    }
}

impl<S: CellSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the image endpoint.
///
/// All fields are optional at the extractor level so that a missing
/// parameter produces an API envelope rather than a bare rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageQueryParams {
    pub table_name: Option<String>,
    pub id_column: Option<String>,
    pub id_value: Option<String>,
    pub image_column: Option<String>,
}

impl ImageQueryParams {
    /// Build a locator, rejecting missing or unsafe parameters.
    pub fn locator(&self) -> Result<CellLocator, ApiError> {
        build_locator(
            &self.table_name,
            &self.id_column,
            &self.id_value,
            ("imageColumn", &self.image_column),
        )
    }
}

/// Query parameters for the text endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextQueryParams {
    pub table_name: Option<String>,
    pub id_column: Option<String>,
    pub id_value: Option<String>,
    pub column: Option<String>,
}

impl TextQueryParams {
    /// Build a locator, rejecting missing or unsafe parameters.
    pub fn locator(&self) -> Result<CellLocator, ApiError> {
        build_locator(
            &self.table_name,
            &self.id_column,
            &self.id_value,
            ("column", &self.column),
        )
    }
}

fn build_locator(
    table_name: &Option<String>,
    id_column: &Option<String>,
    id_value: &Option<String>,
    (column_param, column): (&str, &Option<String>),
) -> Result<CellLocator, ApiError> {
    let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).is_some();

    let missing: Vec<&str> = [
        ("tableName", table_name),
        ("idColumn", id_column),
        ("idValue", id_value),
        (column_param, column),
    ]
    .into_iter()
    .filter(|(_, value)| !present(*value))
    .map(|(name, _)| name)
    .collect();

    match (table_name, id_column, id_value, column) {
        (Some(table), Some(id_column), Some(id_value), Some(column)) if missing.is_empty() => {
            Ok(CellLocator::new(table, id_column, id_value, column)?)
        }
        _ => Err(ApiError::MissingParameters(missing.join(", "))),
    }
}

/// Body of `POST /api/decode`.
#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    /// Cell value as read from a database driver or dump
    #[serde(default)]
    pub value: Value,
}

/// Body of `POST /api/decode/imaging`.
#[derive(Debug, Deserialize)]
pub struct DecodeImagingRequest {
    pub rows: Vec<Value>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Envelope wrapping every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    /// Human-readable status message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response carrying data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Error type identifier (e.g., "not_found", "invalid_request")
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: error.into(),
        }
    }
}

/// Decoded text of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedTextResponse {
    /// Format tag of the recovered, decompressed payload
    pub format: Option<&'static str>,

    /// Decoded text, RTF markup intact
    pub text: Option<String>,

    /// Decoded text with RTF converted to plain text
    pub plain: Option<String>,
}

impl DecodedTextResponse {
    /// Decode a raw cell.
    pub fn from_cell(cell: &RawCell) -> Self {
        let text = decode_to_text(cell);
        let plain = text
            .as_deref()
            .map(|text| rtf_to_plain_text(text).into_owned());
        let format = decode_artifact(cell).map(|artifact| artifact.format().name());

        Self {
            format,
            text,
            plain,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to HTTP response.
///
/// - 404s are logged at DEBUG level (common and expected)
/// - other 4xx errors are logged at WARN level
/// - 5xx errors are logged at ERROR level
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::MissingParameters(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Source(SourceError::InvalidIdentifier { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_identifier")
            }
            ApiError::Source(SourceError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Source(SourceError::Backend(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "source_error")
            }
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image requests.
///
/// # Endpoint
///
/// `GET /api/database-viewer/image?tableName=..&idColumn=..&idValue=..&imageColumn=..`
///
/// # Response
///
/// - `200 OK`: the decoded payload with `Content-Type` from its format tag.
///   Text payloads (RTF, UTF-8 text) are returned in a JSON envelope shaped like
///   the text endpoint's.
/// - `400 Bad Request`: missing parameter or unsafe identifier
/// - `404 Not Found`: table missing, cell NULL, or payload empty
///
/// # Headers
///
/// - `Content-Type: <format content type>`
/// - `Content-Length: <payload length>`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `Content-Disposition: inline` for images, `attachment; filename="image"` otherwise
pub async fn image_handler<S: CellSource>(
    State(state): State<AppState<S>>,
    Query(params): Query<ImageQueryParams>,
) -> Result<Response, ApiError> {
    let locator = params.locator()?;

    let cell = state.source.fetch(&locator).await?;
    let artifact = cell
        .as_ref()
        .and_then(decode_artifact)
        .ok_or_else(|| ApiError::NotFound(format!("Image not found: {locator}")))?;

    match artifact {
        DecodedArtifact::Binary { bytes, format } => {
            debug!(
                locator = %locator,
                format = format.name(),
                size = bytes.len(),
                "Serving binary payload"
            );

            let headers = [
                (header::CONTENT_TYPE, format.content_type().to_string()),
                (header::CONTENT_LENGTH, bytes.len().to_string()),
                (
                    header::CACHE_CONTROL,
                    format!("public, max-age={}", state.cache_max_age),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    content_disposition(format).to_string(),
                ),
            ];
            Ok((headers, bytes).into_response())
        }
        DecodedArtifact::Text { source, .. } => {
            debug!(locator = %locator, format = source.name(), "Serving text payload");

            let data = cell
                .as_ref()
                .map(DecodedTextResponse::from_cell)
                .unwrap_or_default();
            Ok(Json(ApiResponse::ok("Payload is text", data)).into_response())
        }
    }
}

/// Handle text requests.
///
/// # Endpoint
///
/// `GET /api/database-viewer/text?tableName=..&idColumn=..&idValue=..&column=..`
///
/// # Response
///
/// Envelope with `data = { format, text, plain }`; 404 when the cell is NULL.
pub async fn text_handler<S: CellSource>(
    State(state): State<AppState<S>>,
    Query(params): Query<TextQueryParams>,
) -> Result<Json<ApiResponse<DecodedTextResponse>>, ApiError> {
    let locator = params.locator()?;

    let cell = state
        .source
        .fetch(&locator)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cell not found: {locator}")))?;

    Ok(Json(ApiResponse::ok(
        "Decoded cell",
        DecodedTextResponse::from_cell(&cell),
    )))
}

/// Handle ad-hoc decode requests.
///
/// # Endpoint
///
/// `POST /api/decode` with body `{ "value": <any JSON> }`
///
/// Always succeeds; fields are `null` when nothing could be decoded.
pub async fn decode_handler(
    Json(request): Json<DecodeRequest>,
) -> Json<ApiResponse<DecodedTextResponse>> {
    let data = RawCell::from_json(&request.value)
        .map(|cell| DecodedTextResponse::from_cell(&cell))
        .unwrap_or_default();

    Json(ApiResponse::ok("Decoded value", data))
}

/// Handle imaging row decode requests.
///
/// # Endpoint
///
/// `POST /api/decode/imaging` with body `{ "rows": [ {...}, ... ] }`
pub async fn decode_imaging_handler(
    Json(request): Json<DecodeImagingRequest>,
) -> Json<ApiResponse<Vec<Value>>> {
    let rows = decode_imaging_rows(&request.rows);
    Json(ApiResponse::ok(format!("Decoded {} rows", rows.len()), rows))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
