//! HTTP-level tests for both routers.
//!
//! A stub thumbnailer stands in for pdfium and LibreOffice, so these run
//! anywhere. It routes by suffix like the real pipeline and returns a small
//! real PNG.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::Value;
use tower::ServiceExt;

use docthumb::pipeline::encode;
use docthumb::{api, DocumentFormat, DocumentService, ServiceConfig, ThumbError, Thumbnailer};

const BOUNDARY: &str = "docthumb-test-boundary";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Suffix routing like the real pipeline; filenames containing "broken"
/// fail the way an unreadable PDF would, and ones containing "slow" take
/// as long as a real Office conversion might.
struct StubThumbnailer;

#[async_trait]
impl Thumbnailer for StubThumbnailer {
    async fn thumbnail(&self, _bytes: Vec<u8>, filename: &str) -> Result<Vec<u8>, ThumbError> {
        if DocumentFormat::from_filename(filename).is_none() {
            return Err(ThumbError::UnsupportedFormat {
                filename: filename.to_string(),
            });
        }
        if filename.contains("slow") {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        if filename.contains("broken") {
            return Err(ThumbError::InvalidDocument {
                detail: "stub".into(),
            });
        }
        Ok(stub_png())
    }

    fn converter(&self) -> String {
        "/stub/soffice".into()
    }
}

fn stub_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
    encode::encode_png(&DynamicImage::ImageRgba8(img)).unwrap()
}

struct App {
    _root: tempfile::TempDir,
    router: Router,
    service: DocumentService,
}

fn persistent_app(max_file_size: usize) -> App {
    let root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .storage_dir(root.path())
        .max_file_size(max_file_size)
        .build()
        .unwrap();

    let service = DocumentService::new(
        Arc::new(docthumb::JsonFileStore::new(config.metadata_file())),
        Arc::new(StubThumbnailer),
        docthumb::storage::BlobStore::new(config.documents_dir(), config.thumbnails_dir()),
        config.max_file_size,
    );
    std::fs::create_dir_all(config.documents_dir()).unwrap();
    std::fs::create_dir_all(config.thumbnails_dir()).unwrap();

    let router = api::persistent_router(service.clone(), Arc::new(config));
    App {
        _root: root,
        router,
        service,
    }
}

fn stateless_app() -> Router {
    let config = ServiceConfig::builder().max_file_size(1024).build().unwrap();
    api::stateless_router(Arc::new(StubThumbnailer), Arc::new(config))
}

/// Encode a multipart body. `filename: None` makes a plain text field.
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

async fn send_json(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(router, req).await;
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("non-JSON body ({e}): {}", String::from_utf8_lossy(&body)));
    (status, json)
}

async fn upload(router: &Router, uri: &str, filename: &str, data: &[u8]) -> (StatusCode, Value) {
    send_json(router, upload_request(uri, &[("file", Some(filename), data)])).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// ── Persistent service ───────────────────────────────────────────────────────

#[tokio::test]
async fn upload_then_fetch_original_and_thumbnail() {
    let app = persistent_app(1024);
    let original = b"%PDF-1.7 pretend".to_vec();

    let (status, body) = upload(&app.router, "/upload", "report.pdf", &original).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["original_filename"], "report.pdf");
    assert_eq!(body["duplicate_replaced"], false);
    let doc_id = body["doc_id"].as_str().unwrap().to_string();
    assert_eq!(body["original_file_url"], format!("/documents/{doc_id}.pdf"));
    assert_eq!(body["thumbnail_url"], format!("/thumbnails/{doc_id}.png"));
    assert!(body["uploaded_at"].as_str().unwrap().ends_with('Z'));

    let (status, _, served) = send(&app.router, get(&format!("/documents/{doc_id}.pdf"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served.as_ref(), original.as_slice());

    let (status, headers, png) = send(&app.router, get(&format!("/thumbnails/{doc_id}.png"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 3));
}

#[tokio::test]
async fn duplicate_name_is_409_until_replace_is_requested() {
    let app = persistent_app(1024);
    let (_, first) = upload(&app.router, "/upload", "deck.pptx", b"v1").await;
    let first_id = first["doc_id"].as_str().unwrap().to_string();

    let (status, body) = upload(&app.router, "/upload", "deck.pptx", b"v2").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "File with this name already exists");
    assert_eq!(body["existing_doc_id"], first_id.as_str());
    assert_eq!(body["existing_uploaded_at"], first["uploaded_at"]);

    let (status, body) = upload(&app.router, "/upload?replace_existing=true", "deck.pptx", b"v2").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["duplicate_replaced"], true);

    let (status, _, _) = send(&app.router, get(&format!("/documents/{first_id}.pptx"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = send_json(&app.router, get("/files")).await;
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn replace_flag_is_accepted_as_a_form_field() {
    let app = persistent_app(1024);
    upload(&app.router, "/upload", "memo.docx", b"v1").await;

    let req = upload_request(
        "/upload",
        &[
            ("replace_existing", None, &b"true"[..]),
            ("file", Some("memo.docx"), &b"v2"[..]),
        ],
    );
    let (status, body) = send_json(&app.router, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["duplicate_replaced"], true);
}

#[tokio::test]
async fn size_limit_boundary() {
    let app = persistent_app(16);

    let (status, _) = upload(&app.router, "/upload", "exact.pdf", &[7u8; 16]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = upload(&app.router, "/upload", "over.pdf", &[7u8; 17]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "File too large. Max 0MB.");
}

#[tokio::test]
async fn body_past_the_request_limit_is_413() {
    let app = persistent_app(16);
    let huge = vec![0u8; api::body_limit(16) + 1024];
    let (status, _, _) = send(
        &app.router,
        upload_request("/upload", &[("file", Some("huge.pdf"), huge.as_slice())]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.service.record_count().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_upload_is_400() {
    let app = persistent_app(1024);
    let (status, body) = upload(&app.router, "/upload", "empty.pdf", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Empty file upload.");
}

#[tokio::test]
async fn missing_file_field_is_400() {
    let app = persistent_app(1024);
    let req = upload_request("/upload", &[("other", None, &b"x"[..])]);
    let (status, body) = send_json(&app.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn unsupported_format_is_400_and_nothing_is_kept() {
    let app = persistent_app(1024);
    let (status, body) = upload(&app.router, "/upload", "notes.txt", b"hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported file type");
    assert_eq!(body["filename"], "notes.txt");
    assert_eq!(
        body["supported_formats"],
        serde_json::json!(["PDF", "DOC", "DOCX", "PPT", "PPTX"])
    );

    let stored = std::fs::read_dir(app.service.blobs().documents_dir())
        .unwrap()
        .count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn failed_conversion_is_rolled_back() {
    let app = persistent_app(1024);
    let (status, _) = upload(&app.router, "/upload", "broken.pdf", b"garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listing) = send_json(&app.router, get("/files")).await;
    assert_eq!(listing["total"], 0);
    let (_, check) = send_json(&app.router, get("/check-duplicate/broken.pdf")).await;
    assert_eq!(check["exists"], false);
}

#[tokio::test]
async fn client_disconnect_mid_conversion_leaves_no_orphan() {
    let app = persistent_app(1024);
    let request = upload_request("/upload", &[("file", Some("slow-deck.pptx"), &b"deck"[..])]);

    let dropped = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        app.router.clone().oneshot(request),
    )
    .await;
    assert!(dropped.is_err(), "conversion should still be running");

    let mut listing = Value::Null;
    for _ in 0..100 {
        (_, listing) = send_json(&app.router, get("/files")).await;
        if listing["total"] == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(listing["total"], 1, "{listing}");
    let stored = std::fs::read_dir(app.service.blobs().documents_dir())
        .unwrap()
        .count();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn check_duplicate_and_listing() {
    let app = persistent_app(1024);
    let (_, check) = send_json(&app.router, get("/check-duplicate/a.pdf")).await;
    assert_eq!(check["exists"], false);
    assert_eq!(check["message"], "Filename is available for upload");

    let (_, a) = upload(&app.router, "/upload", "a.pdf", b"1").await;
    let (_, b) = upload(&app.router, "/upload", "b.ppt", b"2").await;

    let (status, check) = send_json(&app.router, get("/check-duplicate/a.pdf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["exists"], true);
    assert_eq!(check["existing_doc_id"], a["doc_id"]);
    assert_eq!(check["existing_file_url"], a["original_file_url"]);
    assert_eq!(check["existing_thumbnail_url"], a["thumbnail_url"]);

    let (_, listing) = send_json(&app.router, get("/files")).await;
    assert_eq!(listing["total"], 2);
    let files = listing["files"].as_array().unwrap();
    assert_eq!(files[0]["doc_id"], a["doc_id"]);
    assert_eq!(files[1]["filename"], "b.ppt");
    assert_eq!(files[1]["file_url"], b["original_file_url"]);
}

#[tokio::test]
async fn delete_then_delete_again() {
    let app = persistent_app(1024);
    let (_, up) = upload(&app.router, "/upload", "gone.pdf", b"bytes").await;
    let doc_id = up["doc_id"].as_str().unwrap();

    let (status, body) = send_json(&app.router, delete(&format!("/delete/{doc_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert_eq!(body["removed_files"].as_array().unwrap().len(), 2);

    let (status, _, _) = send(&app.router, get(&format!("/thumbnails/{doc_id}.png"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app.router, delete(&format!("/delete/{doc_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(doc_id));

    let (_, health) = send_json(&app.router, get("/health")).await;
    assert_eq!(health["total_files"], 0);
}

#[tokio::test]
async fn health_and_root() {
    let app = persistent_app(1024);
    upload(&app.router, "/upload", "a.pdf", b"1").await;

    let (status, health) = send_json(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["total_files"], 1);
    assert_eq!(health["soffice_cmd"], "/stub/soffice");
    assert_eq!(health["max_file_size"], 1024);

    let (_, root) = send_json(&app.router, get("/")).await;
    assert_eq!(root["service"], "On-Prem Document Thumbnail API");
    assert!(root["endpoints"]["POST /upload"].is_string());
    assert_eq!(root["supported_formats"][0], "PDF");
}

// ── Stateless service ────────────────────────────────────────────────────────

#[tokio::test]
async fn stateless_thumbnail_returns_raw_png() {
    let router = stateless_app();
    let req = upload_request("/thumbnail", &[("file", Some("slides.pptx"), &b"pptx"[..])]);
    let (status, headers, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(body.as_ref(), stub_png().as_slice());
}

#[tokio::test]
async fn stateless_base64_envelope_describes_the_png() {
    let router = stateless_app();
    let req = upload_request("/thumbnail-base64", &[("file", Some("report.pdf"), &b"%PDF"[..])]);
    let (status, body) = send_json(&router, req).await;
    assert_eq!(status, StatusCode::OK);

    let png = stub_png();
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["mime"], "image/png");
    assert_eq!(body["size_bytes"], png.len());
    assert_eq!(body["sha256"], encode::sha256_hex(&png));
    assert_eq!(body["png_base64"], encode::to_base64(&png));
    assert!(body["generated_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn stateless_errors_use_the_same_bodies() {
    let router = stateless_app();

    let req = upload_request("/thumbnail", &[("file", Some("sheet.xlsx"), &b"x"[..])]);
    let (status, body) = send_json(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported file type");

    let req = upload_request("/thumbnail-base64", &[("file", Some("a.pdf"), &b""[..])]);
    let (status, _) = send_json(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let big = vec![1u8; 1025];
    let req = upload_request("/thumbnail", &[("file", Some("a.pdf"), big.as_slice())]);
    let (status, _) = send_json(&router, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn stateless_health_has_no_storage_fields() {
    let router = stateless_app();
    let (status, health) = send_json(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(health.get("storage_dir").is_none());
    assert!(health.get("total_files").is_none());

    let (_, root) = send_json(&router, get("/")).await;
    assert!(root["endpoints"]["POST /thumbnail-base64"].is_string());
    assert!(root["endpoints"].get("POST /upload").is_none());
}
