//! PDF rasterisation: page one of a PDF to PNG bytes via pdfium.
//!
//! pdfium is synchronous, so rendering runs on the blocking pool through
//! `tokio::task::spawn_blocking`. The library itself is process-global:
//! `FPDF_InitLibrary` runs once and every render shares that instance. The
//! page is drawn at [`RENDER_SCALE`] times its native point size with no
//! size cap.

use crate::error::ThumbError;
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Linear zoom applied to page one. Width and height both double.
pub const RENDER_SCALE: f32 = 2.0;

/// The one initialised pdfium instance. Dropping a `Pdfium` calls
/// `FPDF_DestroyLibrary`, so it is created once and never released.
static PDFIUM: Mutex<Option<Arc<Pdfium>>> = Mutex::new(None);

/// How to locate the pdfium shared library.
///
/// The library is bound lazily on the first render. A failed bind is not
/// cached: that request gets [`ThumbError::EngineUnavailable`] and the next
/// one tries again, so a library installed after startup is picked up
/// without a restart. Once bound, the instance is shared by every engine in
/// the process and later engines' paths are not consulted.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    lib_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// Bind to the library at `path` only.
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            lib_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Search next to the working directory, then the system library path.
    pub fn system() -> Self {
        Self::default()
    }

    /// Explicit library path, if one was configured.
    pub fn lib_path(&self) -> Option<&Path> {
        self.lib_path.as_deref()
    }

    /// The process-wide pdfium instance, binding it on first use.
    pub fn shared(&self) -> Result<Arc<Pdfium>, ThumbError> {
        let mut slot = PDFIUM
            .lock()
            .map_err(|e| ThumbError::Internal(format!("pdfium lock poisoned: {}", e)))?;
        if let Some(pdfium) = slot.as_ref() {
            return Ok(Arc::clone(pdfium));
        }

        let pdfium = Arc::new(Pdfium::new(self.load_bindings()?));
        info!(lib_path = ?self.lib_path, "pdfium bound");
        *slot = Some(Arc::clone(&pdfium));
        Ok(pdfium)
    }

    /// Load the shared library without initialising it.
    fn load_bindings(&self) -> Result<Box<dyn PdfiumLibraryBindings>, ThumbError> {
        match &self.lib_path {
            Some(path) => Pdfium::bind_to_library(path).map_err(|e| {
                ThumbError::EngineUnavailable(format!("{}: {:?}", path.display(), e))
            }),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|local| {
                    Pdfium::bind_to_system_library().map_err(|system| {
                        ThumbError::EngineUnavailable(format!(
                            "working directory: {:?}; system library: {:?}",
                            local, system
                        ))
                    })
                }),
        }
    }
}

/// Render page one of `pdf_bytes` to PNG at [`RENDER_SCALE`].
///
/// # Errors
/// - [`ThumbError::InvalidDocument`] — bytes are not a PDF pdfium can open
/// - [`ThumbError::EmptyDocument`] — the PDF has zero pages
/// - [`ThumbError::EngineUnavailable`] — pdfium could not be bound
pub async fn render_first_page(
    pdf_bytes: Vec<u8>,
    engine: &PdfiumEngine,
) -> Result<Vec<u8>, ThumbError> {
    let engine = engine.clone();

    tokio::task::spawn_blocking(move || render_first_page_blocking(&engine, &pdf_bytes))
        .await
        .map_err(|e| ThumbError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of first-page rendering.
pub fn render_first_page_blocking(
    engine: &PdfiumEngine,
    pdf_bytes: &[u8],
) -> Result<Vec<u8>, ThumbError> {
    let pdfium = engine.shared()?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| ThumbError::InvalidDocument {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages == 0 {
        return Err(ThumbError::EmptyDocument);
    }
    debug!("PDF loaded: {} pages", total_pages);

    let page = pages
        .get(0)
        .map_err(|e| ThumbError::RasterisationFailed {
            detail: format!("{:?}", e),
        })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ThumbError::RasterisationFailed {
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    let png = encode::encode_png(&image).map_err(|e| ThumbError::RasterisationFailed {
        detail: format!("PNG encoding failed: {}", e),
    })?;

    info!(
        width = image.width(),
        height = image.height(),
        bytes = png.len(),
        "Rendered first page"
    );
    Ok(png)
}
