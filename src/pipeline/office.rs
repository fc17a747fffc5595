//! Office → PDF conversion through a headless LibreOffice process.
//!
//! One call owns one [`Scratch`]: a temp copy of the upload carrying its
//! original extension (soffice picks the import filter from it), an empty
//! output directory, and a private LibreOffice profile directory. The scratch
//! is released on every exit path before the converted PDF is rendered.
//!
//! ```text
//! bytes ──▶ Scratch::create ──▶ soffice --headless --convert-to pdf
//!                                   │  (timeout, kill_on_drop)
//!                                   ▼
//!                               locate_pdf ──▶ read ──▶ Scratch::release
//! ```

use crate::error::ThumbError;
use crate::pipeline::render::{self, PdfiumEngine};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use tempfile::{NamedTempFile, TempDir};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Extensions that need an external conversion before rendering.
pub const OFFICE_EXTENSIONS: [&str; 4] = [".doc", ".docx", ".ppt", ".pptx"];

const SCRATCH_PREFIX: &str = "docthumb-";

// ── Scratch space ────────────────────────────────────────────────────────

/// Temp resources for one conversion.
///
/// Names come from `tempfile`, so concurrent conversions never share a path
/// and releasing one scratch never touches another's files.
#[derive(Debug)]
pub struct Scratch {
    input: NamedTempFile,
    out_dir: TempDir,
    profile_dir: TempDir,
}

impl Scratch {
    /// Write `bytes` to a fresh temp file ending in `extension` and create
    /// the empty output and profile directories.
    pub fn create(bytes: &[u8], extension: &str) -> Result<Self, ThumbError> {
        let tmp = std::env::temp_dir();

        let mut input = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(extension)
            .tempfile()
            .map_err(|e| ThumbError::storage(&tmp, e))?;
        input
            .write_all(bytes)
            .and_then(|_| input.flush())
            .map_err(|e| ThumbError::storage(input.path(), e))?;

        let out_dir = tempfile::Builder::new()
            .prefix("docthumb-out-")
            .tempdir()
            .map_err(|e| ThumbError::storage(&tmp, e))?;
        let profile_dir = tempfile::Builder::new()
            .prefix("docthumb-profile-")
            .tempdir()
            .map_err(|e| ThumbError::storage(&tmp, e))?;

        Ok(Self {
            input,
            out_dir,
            profile_dir,
        })
    }

    pub fn input_path(&self) -> &Path {
        self.input.path()
    }

    pub fn out_dir(&self) -> &Path {
        self.out_dir.path()
    }

    pub fn profile_dir(&self) -> &Path {
        self.profile_dir.path()
    }

    /// Remove every scratch resource. Failures are logged, never raised.
    ///
    /// Returns `true` when everything was removed. If this is never reached
    /// (panic unwinding), the `tempfile` guards still delete on drop.
    pub fn release(self) -> bool {
        let Scratch {
            input,
            out_dir,
            profile_dir,
        } = self;
        let input_path = input.path().to_path_buf();
        let mut clean = true;

        if let Err(e) = input.close() {
            warn!(path = %input_path.display(), "Failed to remove scratch input: {}", e);
            clean = false;
        }
        for dir in [out_dir, profile_dir] {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), "Failed to remove scratch directory: {}", e);
                clean = false;
            }
        }
        clean
    }
}

// ── Converter ────────────────────────────────────────────────────────────

/// Runs LibreOffice headless to turn Office documents into PDF.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    soffice_cmd: PathBuf,
    timeout: Duration,
}

impl OfficeConverter {
    pub fn new(soffice_cmd: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            soffice_cmd: soffice_cmd.as_ref().to_path_buf(),
            timeout,
        }
    }

    pub fn soffice_cmd(&self) -> &Path {
        &self.soffice_cmd
    }

    /// Convert an Office document and render its first page to PNG.
    ///
    /// Renderer failures on the converted PDF propagate unchanged.
    pub async fn convert_first_page(
        &self,
        file_bytes: &[u8],
        extension: &str,
        engine: &PdfiumEngine,
    ) -> Result<Vec<u8>, ThumbError> {
        let pdf = self.convert_to_pdf(file_bytes, extension).await?;
        let png = render::render_first_page(pdf, engine).await?;
        info!(extension, "Thumbnail generated from office document");
        Ok(png)
    }

    /// Convert an Office document to PDF bytes.
    ///
    /// # Errors
    /// - [`ThumbError::ConversionTimeout`] — soffice ran past the timeout
    /// - [`ThumbError::ConversionFailed`] — soffice could not start or exited non-zero
    /// - [`ThumbError::ConversionProducedNoOutput`] — soffice wrote no PDF
    pub async fn convert_to_pdf(
        &self,
        file_bytes: &[u8],
        extension: &str,
    ) -> Result<Vec<u8>, ThumbError> {
        let scratch = Scratch::create(file_bytes, extension)?;
        let result = self.run(&scratch).await;
        scratch.release();
        result
    }

    async fn run(&self, scratch: &Scratch) -> Result<Vec<u8>, ThumbError> {
        let input = scratch.input_path();
        info!(
            input = %input.display(),
            soffice = %self.soffice_cmd.display(),
            "Converting office document to PDF"
        );

        let mut cmd = Command::new(&self.soffice_cmd);
        cmd.arg(format!(
            "-env:UserInstallation={}",
            file_url(scratch.profile_dir())
        ))
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(scratch.out_dir())
        .arg(input)
        .stdin(Stdio::null())
        .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                error!(secs = self.timeout.as_secs(), "LibreOffice/soffice timed out");
                return Err(ThumbError::ConversionTimeout {
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                error!("Failed to launch {}: {}", self.soffice_cmd.display(), e);
                return Err(ThumbError::ConversionFailed {
                    code: None,
                    stderr: format!("failed to launch {}: {}", self.soffice_cmd.display(), e),
                });
            }
            Ok(Ok(output)) => output,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            error!(status = %output.status, "LibreOffice/soffice failed: {}", stderr);
            return Err(ThumbError::ConversionFailed {
                code: output.status.code(),
                stderr,
            });
        }

        let pdf_path = match locate_pdf(scratch.out_dir(), input).await? {
            Some(path) => path,
            None => {
                error!("No PDF produced by soffice");
                return Err(ThumbError::ConversionProducedNoOutput { stderr });
            }
        };
        debug!(pdf = %pdf_path.display(), "Located converted PDF");

        tokio::fs::read(&pdf_path)
            .await
            .map_err(|e| ThumbError::storage(&pdf_path, e))
    }
}

/// Find the PDF soffice wrote for `input` inside `out_dir`.
///
/// Checks `{input stem}.pdf` first; otherwise picks the most recently
/// modified `*.pdf` (any case) in the directory. `None` if there is none.
pub async fn locate_pdf(out_dir: &Path, input: &Path) -> Result<Option<PathBuf>, ThumbError> {
    if let Some(stem) = input.file_stem() {
        let expected = out_dir.join(format!("{}.pdf", stem.to_string_lossy()));
        if tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Ok(Some(expected));
        }
    }

    let mut entries = tokio::fs::read_dir(out_dir)
        .await
        .map_err(|e| ThumbError::storage(out_dir, e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ThumbError::storage(out_dir, e))?
    {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".pdf") {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, entry.path()));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// `file://` URL form of a local directory, as LibreOffice expects for
/// `-env:UserInstallation`.
fn file_url(path: &Path) -> String {
    let p = path.to_string_lossy().replace('\\', "/").replace(' ', "%20");
    if p.starts_with('/') {
        format!("file://{p}")
    } else {
        format!("file:///{p}")
    }
}
