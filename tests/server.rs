#![cfg(feature = "server")]
//! HTTP-level tests for the upload API and the embedded UI.
//!
//! These run everywhere: uploads are in-memory PNG/JPEG images (no pdfium
//! needed) and the model is a local axum stand-in that records every
//! request body it receives. PDF uploads need a pdfium library and are
//! covered in `tests/e2e.rs`.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode, Uri};
use axum::Router;
use dashcompare::server::{router, AppState};
use dashcompare::{CompareConfig, GeminiClient};
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;
use tower::ServiceExt;

// ── Test helpers ─────────────────────────────────────────────────────────

/// Requests seen by the mock model: (uri, body) pairs.
type Seen = Arc<Mutex<Vec<(String, String)>>>;

/// Spawn a local stand-in for the generateContent endpoint.
///
/// Responds to every request with the given status and body, recording
/// what it was sent. Returns the base URL to hand to the client.
async fn spawn_mock_model(status: StatusCode, reply: String) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);

    let app = Router::new().fallback(move |uri: Uri, body: String| {
        let record = Arc::clone(&record);
        let reply = reply.clone();
        async move {
            record.lock().unwrap().push((uri.to_string(), body));
            (status, reply)
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock serve");
    });

    (format!("http://{addr}"), seen)
}

/// A canned successful generateContent response.
fn model_reply(verdict: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"text": verdict}], "role": "model"},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 1042,
            "candidatesTokenCount": 256,
            "totalTokenCount": 1298
        }
    })
    .to_string()
}

fn app(base_url: &str, api_key: &str) -> Router {
    let client = GeminiClient::new(api_key)
        .expect("client")
        .with_base_url(base_url);
    router(AppState::new(client, CompareConfig::default()))
}

fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png");
    buf
}

fn jpeg_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    buf
}

/// One multipart part: (field name, filename, content type, bytes).
type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

const BOUNDARY: &str = "dashcompare-test-boundary";

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{name}\"");
        if let Some(f) = filename {
            disposition.push_str(&format!("; filename=\"{f}\""));
        }
        body.extend_from_slice(format!("{disposition}\r\n").as_bytes());
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_compare(app: Router, parts: &[Part<'_>]) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/compare")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("build request");

    let response = app.oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).expect("response is JSON");
    (status, json)
}

// ── UI and health ────────────────────────────────────────────────────────

#[tokio::test]
async fn index_page_serves_the_upload_ui() {
    let (base, _) = spawn_mock_model(StatusCode::OK, model_reply("ok")).await;
    let response = app(&base, "test-key")
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Dashboard Comparison Application"));
    assert!(html.contains("Compare PDFs"));
    // The picker must only offer the supported formats.
    assert!(html.contains(r#"accept=".pdf,.png,.jpg,.jpeg""#));
}

#[tokio::test]
async fn health_reports_the_crate_version() {
    let (base, _) = spawn_mock_model(StatusCode::OK, model_reply("ok")).await;
    let response = app(&base, "test-key")
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// ── The happy path ───────────────────────────────────────────────────────

#[tokio::test]
async fn compare_returns_the_verdict_verbatim() {
    let verdict = "1. **Text Similarity**: 72/100\n\nWeighted overall similarity score: 81.5/100";
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply(verdict)).await;

    let first = png_bytes(8, 4, [220, 40, 40]);
    let second = png_bytes(6, 6, [40, 40, 220]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[
            ("file1", Some("before.png"), Some("image/png"), &first),
            ("file2", Some("after.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    // The verdict must arrive untouched, whitespace and markdown included.
    assert_eq!(json["verdict"], verdict);

    assert_eq!(json["first"]["caption"], "PDF 1 - Dashboard");
    assert_eq!(json["second"]["caption"], "PDF 2 - Dashboard");
    assert_eq!(json["first"]["width"], 8);
    assert_eq!(json["first"]["height"], 4);
    assert_eq!(json["second"]["width"], 6);
    assert_eq!(json["second"]["height"], 6);
    for slot in ["first", "second"] {
        let uri = json[slot]["dataUri"].as_str().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"), "got: {uri}");
    }

    // Token usage from the API flows into the stats block.
    assert_eq!(json["stats"]["prompt_tokens"], 1042);
    assert_eq!(json["stats"]["completion_tokens"], 256);

    // Exactly one model call: rubric text plus the two images, in order.
    let calls = seen.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (uri, body) = &calls[0];
    assert!(
        uri.contains("/v1beta/models/gemini-1.5-pro-latest:generateContent"),
        "got: {uri}"
    );
    assert!(body.contains("Compare these two dashboard images"));
    assert!(body.contains("Text Similarity"));
    assert!(body.contains("weighted overall similarity score"));
    assert_eq!(body.matches("inlineData").count(), 2);
    assert_eq!(body.matches("image/png").count(), 2);
}

#[tokio::test]
async fn jpeg_and_png_uploads_can_be_mixed() {
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply("close enough")).await;

    let first = jpeg_bytes(10, 5, [10, 200, 10]);
    let second = png_bytes(10, 5, [10, 10, 200]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[
            ("file1", Some("before.jpg"), Some("image/jpeg"), &first),
            ("file2", Some("after.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["verdict"], "close enough");
    // JPEG input is re-encoded: the model still receives PNG only.
    let calls = seen.lock().unwrap();
    assert_eq!(calls[0].1.matches("image/png").count(), 2);
    assert_eq!(calls[0].1.matches("image/jpeg").count(), 0);
}

#[tokio::test]
async fn unknown_multipart_fields_are_ignored() {
    let (base, _) = spawn_mock_model(StatusCode::OK, model_reply("ok")).await;

    let first = png_bytes(4, 4, [1, 2, 3]);
    let second = png_bytes(4, 4, [3, 2, 1]);
    let (status, _) = post_compare(
        app(&base, "test-key"),
        &[
            ("note", None, None, b"not a file"),
            ("file1", Some("a.png"), Some("image/png"), &first),
            ("file2", Some("b.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

// ── Upload validation ────────────────────────────────────────────────────

#[tokio::test]
async fn a_missing_second_upload_never_reaches_the_model() {
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply("unreached")).await;

    let only = png_bytes(4, 4, [9, 9, 9]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[("file1", Some("only.png"), Some("image/png"), &only)],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "missing_input");
    assert_eq!(json["message"], "Please upload both PDF files for comparison.");
    assert_eq!(seen.lock().unwrap().len(), 0, "model must not be called");
}

#[tokio::test]
async fn an_empty_form_is_rejected_the_same_way() {
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply("unreached")).await;

    let (status, json) = post_compare(app(&base, "test-key"), &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "missing_input");
    assert_eq!(seen.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn unsupported_upload_types_are_rejected() {
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply("unreached")).await;

    let gif: &[u8] = b"GIF89a_not_really";
    let other = png_bytes(4, 4, [1, 1, 1]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[
            ("file1", Some("chart.gif"), Some("image/gif"), gif),
            ("file2", Some("b.png"), Some("image/png"), &other),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "unsupported_media_type");
    assert!(json["message"].as_str().unwrap().contains("File 1"));
    assert_eq!(seen.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn undecodable_image_bytes_are_rejected() {
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply("unreached")).await;

    let garbage = b"definitely not a png";
    let fine = png_bytes(4, 4, [5, 5, 5]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[
            ("file1", Some("broken.png"), Some("image/png"), garbage),
            ("file2", Some("b.png"), Some("image/png"), &fine),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "image_decode");
    assert!(json["message"].as_str().unwrap().contains("File 1"));
    assert_eq!(seen.lock().unwrap().len(), 0);
}

// ── Model-side failures ──────────────────────────────────────────────────

#[tokio::test]
async fn a_model_server_error_maps_to_bad_gateway() {
    let (base, _) = spawn_mock_model(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"error": {"message": "backend exploded"}}"#.to_string(),
    )
    .await;

    let first = png_bytes(4, 4, [1, 2, 3]);
    let second = png_bytes(4, 4, [3, 2, 1]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[
            ("file1", Some("a.png"), Some("image/png"), &first),
            ("file2", Some("b.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "model_error");
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("HTTP 500"), "got: {message}");
}

#[tokio::test]
async fn rejected_credentials_map_to_model_auth() {
    let (base, _) = spawn_mock_model(
        StatusCode::FORBIDDEN,
        r#"{"error": {"message": "API key not valid"}}"#.to_string(),
    )
    .await;

    let first = png_bytes(4, 4, [1, 2, 3]);
    let second = png_bytes(4, 4, [3, 2, 1]);
    let (status, json) = post_compare(
        app(&base, "bad-key"),
        &[
            ("file1", Some("a.png"), Some("image/png"), &first),
            ("file2", Some("b.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "model_auth");
}

#[tokio::test]
async fn a_reply_without_text_maps_to_model_response() {
    let (base, _) = spawn_mock_model(
        StatusCode::OK,
        r#"{"candidates": [{"finishReason": "SAFETY"}]}"#.to_string(),
    )
    .await;

    let first = png_bytes(4, 4, [1, 2, 3]);
    let second = png_bytes(4, 4, [3, 2, 1]);
    let (status, json) = post_compare(
        app(&base, "test-key"),
        &[
            ("file1", Some("a.png"), Some("image/png"), &first),
            ("file2", Some("b.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "model_response");
    assert!(json["message"].as_str().unwrap().contains("SAFETY"));
}

#[tokio::test]
async fn a_missing_api_key_fails_without_calling_the_model() {
    let (base, seen) = spawn_mock_model(StatusCode::OK, model_reply("unreached")).await;

    let first = png_bytes(4, 4, [1, 2, 3]);
    let second = png_bytes(4, 4, [3, 2, 1]);
    let (status, json) = post_compare(
        app(&base, ""),
        &[
            ("file1", Some("a.png"), Some("image/png"), &first),
            ("file2", Some("b.png"), Some("image/png"), &second),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "api_key_missing");
    assert!(json["message"].as_str().unwrap().contains("GEMINI_API_KEY"));
    assert_eq!(seen.lock().unwrap().len(), 0);
}
