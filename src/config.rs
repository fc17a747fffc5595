//! Configuration for the thumbnail service.
//!
//! Every knob the service reads lives in [`ServiceConfig`], built via
//! [`ServiceConfigBuilder`]. The CLI maps its flags (and their environment
//! fallbacks) onto the builder; tests construct configs directly.
//!
//! # Storage layout
//!
//! ```text
//! {storage_dir}/
//!   documents/      {doc_id}{ext}   original uploads
//!   thumbnails/     {doc_id}.png    rendered first pages
//!   metadata.json                   doc_id → record index
//! ```

use crate::error::ThumbError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default maximum upload size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Default wall-clock limit for one external office conversion.
pub const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 30;

/// Upper bound accepted for the conversion timeout.
pub const MAX_CONVERSION_TIMEOUT_SECS: u64 = 600;

/// Default LibreOffice executable for the build platform.
#[cfg(target_os = "windows")]
pub const DEFAULT_SOFFICE_CMD: &str = "C:\\Program Files\\LibreOffice\\program\\soffice.exe";
/// Default LibreOffice executable for the build platform.
#[cfg(target_os = "macos")]
pub const DEFAULT_SOFFICE_CMD: &str = "/Applications/LibreOffice.app/Contents/MacOS/soffice";
/// Default LibreOffice executable for the build platform.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_SOFFICE_CMD: &str = "/usr/bin/soffice";

/// Configuration for both the persistent and the stateless service.
///
/// Built via [`ServiceConfig::builder()`] or [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use docthumb::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .storage_dir("/var/lib/docthumb")
///     .max_file_size(10 * 1024 * 1024)
///     .conversion_timeout_secs(40)
///     .build()
///     .unwrap();
/// assert!(config.metadata_file().ends_with("metadata.json"));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    /// Root directory holding documents, thumbnails and the metadata index.
    /// Default: `./storage`.
    pub storage_dir: PathBuf,

    /// Largest accepted upload in bytes. A payload of exactly this size is
    /// accepted; one byte more is rejected. Default: 50 MiB.
    pub max_file_size: usize,

    /// LibreOffice executable used for Office → PDF conversion.
    pub soffice_cmd: PathBuf,

    /// Hard timeout for one `soffice` run, in seconds. Default: 30.
    pub conversion_timeout_secs: u64,

    /// Origins allowed by CORS. `*` allows any origin. Default: `["*"]`.
    pub cors_allow_origins: Vec<String>,

    /// Explicit pdfium library to bind. When unset, the renderer looks next
    /// to the working directory and then for a system-wide library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Bind address. Default: `0.0.0.0`.
    pub host: String,

    /// Listen port. Default: 8000.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./storage"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            soffice_cmd: PathBuf::from(DEFAULT_SOFFICE_CMD),
            conversion_timeout_secs: DEFAULT_CONVERSION_TIMEOUT_SECS,
            cors_allow_origins: vec!["*".to_string()],
            pdfium_lib_path: None,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory of original uploads.
    pub fn documents_dir(&self) -> PathBuf {
        self.storage_dir.join("documents")
    }

    /// Directory of rendered PNG thumbnails.
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.storage_dir.join("thumbnails")
    }

    /// The JSON metadata index.
    pub fn metadata_file(&self) -> PathBuf {
        self.storage_dir.join("metadata.json")
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when any origin is allowed.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_allow_origins.iter().any(|o| o == "*")
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn storage_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.storage_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn soffice_cmd(mut self, cmd: impl AsRef<Path>) -> Self {
        self.config.soffice_cmd = cmd.as_ref().to_path_buf();
        self
    }

    pub fn conversion_timeout_secs(mut self, secs: u64) -> Self {
        self.config.conversion_timeout_secs = secs;
        self
    }

    /// Set allowed origins from a comma-separated list, e.g.
    /// `"https://a.example,https://b.example"`.
    pub fn cors_allow_origins(mut self, origins: &str) -> Self {
        self.config.cors_allow_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.pdfium_lib_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ThumbError> {
        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(ThumbError::InvalidConfig(
                "max_file_size must be ≥ 1 byte".into(),
            ));
        }
        if c.conversion_timeout_secs == 0 || c.conversion_timeout_secs > MAX_CONVERSION_TIMEOUT_SECS
        {
            return Err(ThumbError::InvalidConfig(format!(
                "conversion timeout must be 1–{MAX_CONVERSION_TIMEOUT_SECS}s, got {}",
                c.conversion_timeout_secs
            )));
        }
        if c.soffice_cmd.as_os_str().is_empty() {
            return Err(ThumbError::InvalidConfig(
                "soffice command must not be empty".into(),
            ));
        }
        if c.cors_allow_origins.is_empty() {
            return Err(ThumbError::InvalidConfig(
                "at least one CORS origin is required (use '*' for any)".into(),
            ));
        }
        Ok(self.config)
    }
}
