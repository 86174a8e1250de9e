//! API integration tests for cell decoding and error handling.
//!
//! Tests verify:
//! - Binary payloads served with content type, disposition and cache headers
//! - Text payloads returned inside the JSON envelope
//! - Error cases (missing parameters, unsafe identifiers, missing cells, backend failures)
//! - POST decode endpoints
//! - CORS preflight

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use medblob::{create_router, RouterConfig};

use super::test_utils::{
    dicom_bytes, get, gzip, jpeg_bytes, json_body, png_bytes, post_json, FailingCellSource,
    MockCellSource, SAMPLE_RTF, SAMPLE_RTF_PLAIN,
};

const TABLE: &str = "CN_ImagingResultData";

fn image_uri(id: &str, column: &str) -> String {
    format!(
        "/api/database-viewer/image?tableName={TABLE}&idColumn=Id&idValue={id}&imageColumn={column}"
    )
}

fn text_uri(id: &str, column: &str) -> String {
    format!("/api/database-viewer/text?tableName={TABLE}&idColumn=Id&idValue={id}&column={column}")
}

fn sample_source() -> MockCellSource {
    MockCellSource::new()
        .with_row(
            TABLE,
            json!({
                "Id": 1,
                "Photo": format!("0x{}", hex::encode_upper(png_bytes())),
                "Report": hex::encode(gzip(SAMPLE_RTF.as_bytes())),
                "Empty": null,
                "Blank": "",
                "Spaces": "   ",
                "Note": hex::encode("Kết luận: gan bình thường"),
            }),
        )
        .with_row(
            TABLE,
            json!({
                "Id": 2,
                "Photo": jpeg_bytes(),
                "Scan": { "type": "Buffer", "data": gzip(&dicom_bytes()) },
            }),
        )
}

fn router() -> axum::Router {
    create_router(sample_source(), RouterConfig::new().with_tracing(false))
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(router(), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Image Endpoint
// =============================================================================

#[tokio::test]
async fn test_image_prefixed_hex_png() {
    let (status, headers, body) = get(router(), &image_uri("1", "Photo")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "image/png");
    assert_eq!(headers.get("content-disposition").unwrap(), "inline");
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(
        headers.get("content-length").unwrap(),
        &png_bytes().len().to_string()
    );
    assert_eq!(&body[..], &png_bytes()[..]);
}

#[tokio::test]
async fn test_image_byte_array_jpeg() {
    let (status, headers, body) = get(router(), &image_uri("2", "Photo")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "image/jpeg");
    assert_eq!(&body[..], &jpeg_bytes()[..]);
}

#[tokio::test]
async fn test_image_gzipped_dicom_is_attachment() {
    let (status, headers, body) = get(router(), &image_uri("2", "Scan")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "application/dicom");
    assert_eq!(
        headers.get("content-disposition").unwrap(),
        "attachment; filename=\"image\""
    );
    assert_eq!(&body[..], &dicom_bytes()[..]);
}

#[tokio::test]
async fn test_image_custom_cache_max_age() {
    let router = create_router(
        sample_source(),
        RouterConfig::new().with_cache_max_age(120).with_tracing(false),
    );
    let (_, headers, _) = get(router, &image_uri("1", "Photo")).await;
    assert_eq!(headers.get("cache-control").unwrap(), "public, max-age=120");
}

#[tokio::test]
async fn test_image_text_payload_returns_envelope() {
    let (status, headers, body) = get(router(), &image_uri("1", "Report")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body = json_body(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["format"], "rtf");
    assert_eq!(body["data"]["text"], SAMPLE_RTF);
    assert_eq!(body["data"]["plain"], SAMPLE_RTF_PLAIN);
}

#[tokio::test]
async fn test_image_hex_utf8_text_payload() {
    let (status, _, body) = get(router(), &image_uri("1", "Note")).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["data"]["text"], "Kết luận: gan bình thường");
    assert_eq!(body["data"]["plain"], "Kết luận: gan bình thường");
}

#[tokio::test]
async fn test_image_blank_string_cell_is_not_found() {
    for column in ["Blank", "Spaces"] {
        let (status, _, body) = get(router(), &image_uri("1", column)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"], "not_found");
    }
}

#[tokio::test]
async fn test_image_null_cell_is_not_found() {
    let (status, _, body) = get(router(), &image_uri("1", "Empty")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json_body(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_image_missing_row_and_table() {
    let (status, _, _) = get(router(), &image_uri("99", "Photo")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(
        router(),
        "/api/database-viewer/image?tableName=Nope&idColumn=Id&idValue=1&imageColumn=Photo",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_missing_parameters() {
    let (status, _, body) = get(router(), "/api/database-viewer/image?tableName=T").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json_body(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("idColumn, idValue, imageColumn"));
}

#[tokio::test]
async fn test_image_unsafe_identifier() {
    let (status, _, body) = get(
        router(),
        "/api/database-viewer/image?tableName=T%3BDROP&idColumn=Id&idValue=1&imageColumn=Photo",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "invalid_identifier");
}

#[tokio::test]
async fn test_image_backend_failure() {
    let router = create_router(FailingCellSource, RouterConfig::new().with_tracing(false));
    let (status, _, body) = get(router, &image_uri("1", "Photo")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&body);
    assert_eq!(body["error"], "source_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_single_fetch_per_request() {
    let source = sample_source();
    let counter = source.fetch_counter();
    let router = create_router(source, RouterConfig::new().with_tracing(false));

    let (status, _, _) = get(router, &image_uri("1", "Photo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Text Endpoint
// =============================================================================

#[tokio::test]
async fn test_text_gzipped_rtf() {
    let (status, _, body) = get(router(), &text_uri("1", "Report")).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["format"], "rtf");
    assert_eq!(body["data"]["text"], SAMPLE_RTF);
    assert_eq!(body["data"]["plain"], SAMPLE_RTF_PLAIN);
}

#[tokio::test]
async fn test_text_hex_utf8_text() {
    let (status, _, body) = get(router(), &text_uri("1", "Note")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body)["data"]["plain"],
        "Kết luận: gan bình thường"
    );
}

#[tokio::test]
async fn test_text_missing_column_parameter() {
    let (status, _, _) = get(
        router(),
        "/api/database-viewer/text?tableName=T&idColumn=Id&idValue=1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_text_null_cell_is_not_found() {
    let (status, _, _) = get(router(), &text_uri("1", "Empty")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Decode Endpoints
// =============================================================================

#[tokio::test]
async fn test_decode_hex_gzip_text() {
    let original = "Kết quả: Bình thường";
    let value = json!({ "value": hex::encode(gzip(original.as_bytes())) });

    let (status, _, body) = post_json(router(), "/api/decode", &value).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["data"]["text"], original);
    assert_eq!(body["data"]["plain"], original);
}

#[tokio::test]
async fn test_decode_unrecognized_string_unchanged() {
    let value = json!({ "value": "not-valid-base64-or-hex!!!" });
    let (_, _, body) = post_json(router(), "/api/decode", &value).await;

    let body = json_body(&body);
    assert_eq!(body["data"]["text"], "not-valid-base64-or-hex!!!");
    assert_eq!(body["data"]["plain"], "not-valid-base64-or-hex!!!");
}

#[tokio::test]
async fn test_decode_null_value() {
    let (status, _, body) = post_json(router(), "/api/decode", &json!({ "value": null })).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["data"],
        json!({ "format": null, "text": null, "plain": null })
    );
}

#[tokio::test]
async fn test_decode_node_buffer() {
    let value = json!({ "value": { "type": "Buffer", "data": png_bytes() } });
    let (_, _, body) = post_json(router(), "/api/decode", &value).await;
    assert_eq!(json_body(&body)["data"]["format"], "png");
}

#[tokio::test]
async fn test_decode_imaging_rows() {
    let rows = json!({
        "rows": [
            {
                "ImagingResultId": 7,
                "ResultData": hex::encode(gzip(SAMPLE_RTF.as_bytes())),
                "ConclusionData": null,
                "Suggestion": "Follow up in 6 months",
            }
        ]
    });

    let (status, _, body) = post_json(router(), "/api/decode/imaging", &rows).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["message"], "Decoded 1 rows");
    let row = &body["data"][0];
    assert_eq!(row["ImagingResultId"], 7);
    assert_eq!(row["ResultPlain"], SAMPLE_RTF_PLAIN);
    assert_eq!(row["ConclusionText"], Value::Null);
    assert_eq!(row["SuggestionPlain"], "Follow up in 6 months");
}

#[tokio::test]
async fn test_decode_rejects_malformed_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/decode/imaging")
        .header("content-type", "application/json")
        .body(Body::from("{ \"rows\": 5 }"))
        .unwrap();

    let response = router().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_preflight_any_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/decode")
        .header("origin", "https://viewer.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
