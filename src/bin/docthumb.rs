//! CLI binary for docthumb.
//!
//! A thin shim over the library crate: `serve` maps flags to a
//! `ServiceConfig` and runs one of the two routers, `render` thumbnails a
//! single local file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docthumb::config::{DEFAULT_CONVERSION_TIMEOUT_SECS, DEFAULT_MAX_FILE_SIZE, DEFAULT_SOFFICE_CMD};
use docthumb::{api, DocumentService, ServiceConfig, ThumbnailEnvelope, ThumbnailPipeline};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Persistent service on :8000, files under ./storage
  docthumb serve

  # Stateless service on another port
  docthumb serve --stateless --port 9000

  # Thumbnail one file locally
  docthumb render slides.pptx -o slides.png

  # Same, as the JSON envelope the stateless service returns
  docthumb render report.pdf --json

ENVIRONMENT VARIABLES:
  BASE_STORAGE_DIR         Storage root (documents/, thumbnails/, metadata.json)
  MAX_FILE_SIZE            Largest accepted upload in bytes
  SOFFICE_CMD              LibreOffice executable
  CORS_ALLOW_ORIGINS       Comma-separated origins, or * for any
  CONVERSION_TIMEOUT_SECS  Hard limit for one soffice run
  PDFIUM_LIB_PATH          Path to libpdfium; otherwise ./ then the system library
  HOST, PORT               Listen address
  RUST_LOG                 Log filter, overrides --verbose/--quiet
"#;

#[derive(Parser, Debug)]
#[command(
    name = "docthumb",
    version,
    about = "First-page PNG thumbnails for PDF and Office documents",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root directory for stored documents, thumbnails and metadata.
    #[arg(long, global = true, env = "BASE_STORAGE_DIR", default_value = "./storage")]
    storage_dir: PathBuf,

    /// Largest accepted upload, in bytes.
    #[arg(long, global = true, env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: usize,

    /// LibreOffice executable used for Office → PDF conversion.
    #[arg(long, global = true, env = "SOFFICE_CMD", default_value = DEFAULT_SOFFICE_CMD)]
    soffice_cmd: PathBuf,

    /// Comma-separated CORS origins, or `*` for any.
    #[arg(long, global = true, env = "CORS_ALLOW_ORIGINS", default_value = "*")]
    cors_allow_origins: String,

    /// Hard timeout for one soffice run, in seconds.
    #[arg(
        long,
        global = true,
        env = "CONVERSION_TIMEOUT_SECS",
        default_value_t = DEFAULT_CONVERSION_TIMEOUT_SECS
    )]
    conversion_timeout: u64,

    /// Explicit pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    #[arg(long, global = true, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, global = true, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Debug-level logging.
    #[arg(short, long, global = true, env = "DOCTHUMB_VERBOSE")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Return thumbnails in the response and store nothing.
        #[arg(long)]
        stateless: bool,
    },
    /// Thumbnail one local file.
    Render {
        /// PDF, DOC, DOCX, PPT or PPTX file.
        input: PathBuf,

        /// Where to write the PNG. Default: the input path with a `.png`
        /// extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the base64 JSON envelope to stdout instead of writing a file.
        #[arg(long, conflicts_with = "output")]
        json: bool,
    },
}

impl Cli {
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut builder = ServiceConfig::builder()
            .storage_dir(&self.storage_dir)
            .max_file_size(self.max_file_size)
            .soffice_cmd(&self.soffice_cmd)
            .conversion_timeout_secs(self.conversion_timeout)
            .cors_allow_origins(&self.cors_allow_origins)
            .host(self.host.clone())
            .port(self.port);
        if let Some(ref lib) = self.pdfium_lib {
            builder = builder.pdfium_lib_path(lib);
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.service_config()?;

    match cli.command {
        Command::Serve { stateless } => serve(config, stateless).await,
        Command::Render {
            ref input,
            ref output,
            json,
        } => render(&config, input, output.as_deref(), json).await,
    }
}

async fn serve(config: ServiceConfig, stateless: bool) -> Result<()> {
    let addr = config.bind_addr();
    let shared = Arc::new(config.clone());

    let app = if stateless {
        api::stateless_router(Arc::new(ThumbnailPipeline::from_config(&config)), shared)
    } else {
        let service = DocumentService::from_config(&config);
        service.prepare().await.with_context(|| {
            format!(
                "Failed to create storage directories under {}",
                config.storage_dir.display()
            )
        })?;
        api::persistent_router(service, shared)
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let mode = if stateless { "stateless" } else { "persistent" };
    info!(
        address = %addr,
        mode,
        storage_dir = %config.storage_dir.display(),
        soffice = %config.soffice_cmd.display(),
        "docthumb listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("docthumb shut down");
    Ok(())
}

async fn render(
    config: &ServiceConfig,
    input: &Path,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", input.display()))?;

    let pipeline = ThumbnailPipeline::from_config(config);
    let png = pipeline
        .route(bytes, &filename)
        .await
        .with_context(|| format!("Failed to thumbnail {}", input.display()))?;

    if json {
        let envelope = ThumbnailEnvelope::new(&filename, &png);
        println!(
            "{}",
            serde_json::to_string_pretty(&envelope).context("Failed to serialize envelope")?
        );
        return Ok(());
    }

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("png"));
    tokio::fs::write(&out, &png)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(output = %out.display(), bytes = png.len(), "Thumbnail written");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
