//! Pipeline stages for document-to-thumbnail conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the rendering backend can change without touching routing or the
//! office converter.
//!
//! ## Data Flow
//!
//! ```text
//!                 ┌──────── .pdf ────────┐
//! route ──────────┤                      ├──▶ render ──▶ encode
//! (extension)     └─ .doc/.docx/.ppt/x ──┘     (pdfium)   (PNG)
//!                        office
//!                   (soffice → PDF)
//! ```
//!
//! 1. [`route`]  — classify the client filename and dispatch; also hosts the
//!    [`route::Thumbnailer`] seam used by the service layer
//! 2. [`office`] — write a scratch copy, run LibreOffice headless with a
//!    timeout, find the produced PDF, clean up unconditionally
//! 3. [`render`] — rasterise page one at 2× through pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 4. [`encode`] — PNG-encode the raster, plus base64/sha256 helpers for the
//!    stateless JSON envelope

pub mod encode;
pub mod office;
pub mod render;
pub mod route;
