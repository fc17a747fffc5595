//! Format routing: pick the conversion path from the client filename.
//!
//! Routing is purely suffix-based and case-insensitive. No magic-byte
//! sniffing happens here; a mislabelled file is routed by its claimed
//! extension and then fails inside the renderer or the office converter.

use crate::config::ServiceConfig;
use crate::error::ThumbError;
use crate::pipeline::office::OfficeConverter;
use crate::pipeline::render::{self, PdfiumEngine};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Every format the router accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Pptx,
    Ppt,
}

impl DocumentFormat {
    /// Checked in this order, so `.docx` is never mistaken for `.doc`.
    const ROUTING_ORDER: [DocumentFormat; 5] = [
        DocumentFormat::Pdf,
        DocumentFormat::Docx,
        DocumentFormat::Doc,
        DocumentFormat::Pptx,
        DocumentFormat::Ppt,
    ];

    /// Classify `filename` by suffix, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        Self::ROUTING_ORDER
            .into_iter()
            .find(|f| lower.ends_with(f.extension()))
    }

    /// Extension with its leading dot, exactly as handed to soffice.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => ".pdf",
            DocumentFormat::Docx => ".docx",
            DocumentFormat::Doc => ".doc",
            DocumentFormat::Pptx => ".pptx",
            DocumentFormat::Ppt => ".ppt",
        }
    }

    /// True for formats that go through LibreOffice first.
    pub fn needs_office_conversion(self) -> bool {
        !matches!(self, DocumentFormat::Pdf)
    }
}

/// Anything that turns an uploaded document into a first-page PNG.
///
/// The service layer and the HTTP handlers only see this trait, so tests can
/// substitute a stub and a different backend can be plugged in without
/// touching upload bookkeeping.
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    /// Produce PNG bytes for `file_bytes`, routed by `filename`.
    async fn thumbnail(&self, file_bytes: Vec<u8>, filename: &str) -> Result<Vec<u8>, ThumbError>;

    /// Human-readable description of the external converter, for `/health`.
    fn converter(&self) -> String {
        String::new()
    }
}

/// The production pipeline: pdfium for PDFs, LibreOffice + pdfium for
/// Office formats.
#[derive(Debug, Clone)]
pub struct ThumbnailPipeline {
    engine: PdfiumEngine,
    office: OfficeConverter,
}

impl ThumbnailPipeline {
    pub fn new(engine: PdfiumEngine, office: OfficeConverter) -> Self {
        Self { engine, office }
    }

    /// Build the pipeline described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let engine = match &config.pdfium_lib_path {
            Some(path) => PdfiumEngine::at_path(path),
            None => PdfiumEngine::system(),
        };
        let office = OfficeConverter::new(
            &config.soffice_cmd,
            Duration::from_secs(config.conversion_timeout_secs),
        );
        Self::new(engine, office)
    }

    /// Route `file_bytes` by `filename` and return the first-page PNG.
    ///
    /// # Errors
    /// [`ThumbError::UnsupportedFormat`] for any other suffix (including
    /// none); otherwise whatever the chosen path returns.
    pub async fn route(&self, file_bytes: Vec<u8>, filename: &str) -> Result<Vec<u8>, ThumbError> {
        let format = DocumentFormat::from_filename(filename).ok_or_else(|| {
            ThumbError::UnsupportedFormat {
                filename: filename.to_string(),
            }
        })?;
        info!(filename, ?format, "Generating thumbnail");

        if format.needs_office_conversion() {
            self.office
                .convert_first_page(&file_bytes, format.extension(), &self.engine)
                .await
        } else {
            render::render_first_page(file_bytes, &self.engine).await
        }
    }
}

#[async_trait]
impl Thumbnailer for ThumbnailPipeline {
    async fn thumbnail(&self, file_bytes: Vec<u8>, filename: &str) -> Result<Vec<u8>, ThumbError> {
        self.route(file_bytes, filename).await
    }

    fn converter(&self) -> String {
        self.office.soffice_cmd().display().to_string()
    }
}
