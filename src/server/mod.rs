//! HTTP server layer for medblob.
//!
//! Emits decoded cells over HTTP: binary payloads as raw bytes with a
//! content type taken from their format tag, text payloads inside a JSON
//! envelope `{ success, message, data }`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        GET /api/database-viewer/{image,text}  POST /api/decode  │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (requests, envelopes)    │  │   (router, CORS, tracing)   │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                     CellSource + payload decoding
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    decode_handler, decode_imaging_handler, health_handler, image_handler, text_handler,
    ApiResponse, AppState, DecodeImagingRequest, DecodeRequest, DecodedTextResponse,
    ErrorResponse, HealthResponse, ImageQueryParams, TextQueryParams,
};
pub use routes::{create_router, RouterConfig};
