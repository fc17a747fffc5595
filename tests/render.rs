//! Rendering tests against a real pdfium library.
//!
//! They bind pdfium from `PDFIUM_LIB_PATH`, `./`, or the system library and
//! print a SKIP line when none can be bound, so CI without pdfium stays green.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test render -- --nocapture

use docthumb::pipeline::office::OfficeConverter;
use docthumb::pipeline::render::{render_first_page, PdfiumEngine, RENDER_SCALE};
use docthumb::{ThumbError, ThumbnailPipeline};
use pdfium_render::prelude::*;
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn engine() -> PdfiumEngine {
    match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(path) => PdfiumEngine::at_path(path),
        None => PdfiumEngine::system(),
    }
}

/// Skip this test if pdfium cannot be bound.
macro_rules! skip_unless_pdfium {
    () => {{
        let engine = engine();
        match engine.shared() {
            Ok(pdfium) => (engine, pdfium),
            Err(e) => {
                println!("SKIP — pdfium unavailable: {e}");
                return;
            }
        }
    }};
}

/// A PDF with `pages` blank A4 pages, and the first page's size in points.
fn blank_pdf(pdfium: &Pdfium, pages: usize) -> (Vec<u8>, Option<(f32, f32)>) {
    let mut document = pdfium.create_new_pdf().unwrap();
    for _ in 0..pages {
        document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
    }
    let size = document
        .pages()
        .get(0)
        .ok()
        .map(|p| (p.width().value, p.height().value));
    (document.save_to_bytes().unwrap(), size)
}

fn assert_close(actual: u32, expected: f32) {
    assert!(
        (actual as f32 - expected).abs() <= 2.0,
        "expected ≈{expected}, got {actual}"
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_page_is_rendered_at_twice_its_size() {
    let (engine, pdfium) = skip_unless_pdfium!();
    let (pdf, size) = blank_pdf(&pdfium, 3);
    let (w, h) = size.unwrap();

    let png = render_first_page(pdf, &engine).await.unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let image = image::load_from_memory(&png).unwrap();
    assert_close(image.width(), w * RENDER_SCALE);
    assert_close(image.height(), h * RENDER_SCALE);
}

#[tokio::test]
async fn concurrent_renders_share_one_library() {
    let (engine, pdfium) = skip_unless_pdfium!();
    let (first, _) = blank_pdf(&pdfium, 1);
    let (second, _) = blank_pdf(&pdfium, 2);

    let (a, b) = tokio::join!(
        render_first_page(first, &engine),
        render_first_page(second, &engine)
    );
    assert!(image::load_from_memory(&a.unwrap()).is_ok());
    assert!(image::load_from_memory(&b.unwrap()).is_ok());

    // Both renders are done; the library must still be usable.
    let (third, _) = blank_pdf(&pdfium, 1);
    assert!(render_first_page(third, &engine).await.is_ok());
}

#[tokio::test]
async fn zero_page_pdf_is_empty_document() {
    let (engine, pdfium) = skip_unless_pdfium!();
    let (pdf, _) = blank_pdf(&pdfium, 0);

    let err = render_first_page(pdf, &engine).await.unwrap_err();
    assert!(matches!(err, ThumbError::EmptyDocument), "got {err:?}");
}

#[tokio::test]
async fn non_pdf_bytes_are_invalid_document() {
    let (engine, _pdfium) = skip_unless_pdfium!();

    let err = render_first_page(b"definitely not a pdf".to_vec(), &engine)
        .await
        .unwrap_err();
    assert!(matches!(err, ThumbError::InvalidDocument { .. }), "got {err:?}");
}

#[tokio::test]
async fn pipeline_routes_uppercase_pdf_to_the_renderer() {
    let (engine, pdfium) = skip_unless_pdfium!();
    let (pdf, _) = blank_pdf(&pdfium, 1);

    let pipeline = ThumbnailPipeline::new(
        engine,
        OfficeConverter::new("/nonexistent/soffice", Duration::from_secs(1)),
    );
    let png = pipeline.route(pdf, "SCAN.PDF").await.unwrap();
    assert!(image::load_from_memory(&png).is_ok());
}
