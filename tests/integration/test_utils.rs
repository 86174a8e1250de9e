//! Test utilities for integration tests.
//!
//! Provides a call-counting cell source, a source that always fails, payload
//! fixtures, and helpers for driving the router.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use medblob::error::SourceError;
use medblob::payload::RawCell;
use medblob::source::{CellLocator, CellSource, MemoryCellSource};

// =============================================================================
// Mock Cell Sources
// =============================================================================

/// Memory-backed source that counts fetches.
pub struct MockCellSource {
    inner: MemoryCellSource,
    fetch_count: Arc<AtomicUsize>,
}

impl MockCellSource {
    pub fn new() -> Self {
        Self {
            inner: MemoryCellSource::new(),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a row to a table.
    pub fn with_row(mut self, table: &str, row: Value) -> Self {
        self.inner = self.inner.with_row(table, row);
        self
    }

    /// Handle for reading the fetch count after the source is moved.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_count)
    }
}

impl Default for MockCellSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CellSource for MockCellSource {
    async fn fetch(&self, locator: &CellLocator) -> Result<Option<RawCell>, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(locator).await
    }
}

/// Source whose backend is always down.
pub struct FailingCellSource;

#[async_trait]
impl CellSource for FailingCellSource {
    async fn fetch(&self, _locator: &CellLocator) -> Result<Option<RawCell>, SourceError> {
        Err(SourceError::Backend("connection refused".to_string()))
    }
}

// =============================================================================
// Payload Fixtures
// =============================================================================

/// RTF report as stored by the imaging system.
pub const SAMPLE_RTF: &str = r"{\rtf1\ansi\deff0\pard Gan: b\u236\'ecnh th\u432\'3f\u7901\'3fng\par}";

/// Plain text of [`SAMPLE_RTF`].
pub const SAMPLE_RTF_PLAIN: &str = "Gan: bình thường";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn raw_deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// PNG signature followed by filler.
pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R']);
    data.extend_from_slice(&[0x42; 32]);
    data
}

/// JPEG SOI marker followed by filler.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(&[0x17; 64]);
    data
}

/// 128-byte preamble, `DICM`, then filler.
pub fn dicom_bytes() -> Vec<u8> {
    let mut data = vec![0u8; 128];
    data.extend_from_slice(b"DICM");
    data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x55, 0x4C]);
    data
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Send a GET request and collect the response.
pub async fn get(router: Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

/// Send a JSON POST request and collect the response.
pub async fn post_json(router: Router, uri: &str, body: &Value) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

/// Parse a response body as JSON.
pub fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("response body should be JSON")
}
