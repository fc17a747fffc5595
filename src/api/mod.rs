//! axum routers for the two deployment shapes.
//!
//! ```text
//! persistent                          stateless
//! ──────────                          ─────────
//! POST   /upload                      POST /thumbnail
//! GET    /check-duplicate/{filename}  POST /thumbnail-base64
//! GET    /files                       GET  /health
//! DELETE /delete/{doc_id}             GET  /
//! GET    /documents/*  (static)
//! GET    /thumbnails/* (static)
//! GET    /health
//! GET    /
//! ```

pub mod documents;
pub mod error;
pub mod form;
pub mod health;
pub mod schemas;
pub mod thumbnail;

use crate::config::ServiceConfig;
use crate::pipeline::route::Thumbnailer;
use crate::service::DocumentService;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Room for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Request body limit for a given maximum file size.
///
/// Larger than the file limit so that a file just over it still reaches the
/// handler and gets the regular "too large" error.
pub fn body_limit(max_file_size: usize) -> usize {
    max_file_size.saturating_add(MULTIPART_OVERHEAD)
}

#[derive(Clone)]
pub struct PersistentState {
    pub service: DocumentService,
    pub config: Arc<ServiceConfig>,
    pub body_limit: usize,
}

#[derive(Clone)]
pub struct StatelessState {
    pub thumbnailer: Arc<dyn Thumbnailer>,
    pub config: Arc<ServiceConfig>,
    pub body_limit: usize,
}

/// Router for the storing service. Originals and thumbnails are served
/// straight from the blob directories.
pub fn persistent_router(service: DocumentService, config: Arc<ServiceConfig>) -> Router {
    let limit = body_limit(service.max_file_size());
    let documents = ServeDir::new(service.blobs().documents_dir());
    let thumbnails = ServeDir::new(service.blobs().thumbnails_dir());
    let cors = cors_layer(&config);

    let state = PersistentState {
        service,
        config,
        body_limit: limit,
    };

    Router::new()
        .route("/", get(health::persistent_root))
        .route("/health", get(health::persistent_health))
        .route("/upload", post(documents::upload))
        .route("/check-duplicate/{filename}", get(documents::check_duplicate))
        .route("/files", get(documents::list_files))
        .route("/delete/{doc_id}", delete(documents::delete))
        .with_state(state)
        .nest_service("/documents", documents)
        .nest_service("/thumbnails", thumbnails)
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Router for the non-storing service.
pub fn stateless_router(thumbnailer: Arc<dyn Thumbnailer>, config: Arc<ServiceConfig>) -> Router {
    let limit = body_limit(config.max_file_size);
    let cors = cors_layer(&config);

    let state = StatelessState {
        thumbnailer,
        config,
        body_limit: limit,
    };

    Router::new()
        .route("/", get(health::stateless_root))
        .route("/health", get(health::stateless_health))
        .route("/thumbnail", post(thumbnail::thumbnail))
        .route("/thumbnail-base64", post(thumbnail::thumbnail_base64))
        .with_state(state)
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// `*` allows any origin without credentials. An explicit list allows
/// credentials and mirrors the requested method and headers.
pub fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin: {}", e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
