//! # docthumb
//!
//! First-page PNG thumbnails for PDF and Office documents, served over HTTP.
//!
//! PDFs are rasterised with pdfium. Word and PowerPoint files (`.doc`,
//! `.docx`, `.ppt`, `.pptx`) are first converted to PDF by a headless
//! LibreOffice process and then rendered the same way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Route    pick a path from the filename suffix
//!  ├─ 2. Convert  Office formats only: soffice --convert-to pdf (timeout)
//!  ├─ 3. Render   page one via pdfium at 2× scale (spawn_blocking)
//!  └─ 4. Encode   PNG bytes (raw, base64 envelope, or written to disk)
//! ```
//!
//! ## Deployment shapes
//!
//! | Shape | Router | Stores files |
//! |-------|--------|--------------|
//! | persistent | [`api::persistent_router`] | originals, thumbnails, `metadata.json` |
//! | stateless  | [`api::stateless_router`]  | nothing |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docthumb::{api, DocumentService, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder().storage_dir("./storage").build()?;
//!     let service = DocumentService::from_config(&config);
//!     service.prepare().await?;
//!
//!     let app = api::persistent_router(service, Arc::new(config.clone()));
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docthumb` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod service;
pub mod storage;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{ThumbError, SUPPORTED_FORMATS};
pub use output::{
    DeleteOutcome, DuplicateCheck, FileEntry, FileListing, ThumbnailEnvelope, UploadOutcome,
};
pub use pipeline::route::{DocumentFormat, ThumbnailPipeline, Thumbnailer};
pub use service::DocumentService;
pub use store::{DocumentRecord, JsonFileStore, MemoryStore, MetadataStore};
