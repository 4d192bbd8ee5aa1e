//! HTTP transport for the two operations (`server` feature).
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `POST /api/transcribe-image` | JSON body → [`ConversionResult`](crate::ConversionResult) |
//! | `POST /api/convert-file` | multipart upload → `{ "markdownContent": … }` |
//! | `GET /health` | `{ "status": "ok" }` |
//!
//! Handlers share an [`AppState`] built once at startup; nothing in it is
//! mutated while serving.

pub mod error;
pub mod routes;

use crate::config::ServiceConfig;
use crate::dispatch::Extractors;
use crate::error::Page2MdError;
use crate::pipeline::llm::{LlmGateway, TranscriptGateway};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared, read-only state of the service.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub gateway: Arc<dyn TranscriptGateway>,
    pub extractors: Extractors,
}

impl AppState {
    /// Production state: [`LlmGateway`] and the default extractors.
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self {
            gateway: Arc::new(LlmGateway::new(Arc::clone(&config))),
            config,
            extractors: Extractors::default(),
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn TranscriptGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_extractors(mut self, extractors: Extractors) -> Self {
        self.extractors = extractors;
        self
    }
}

/// Build the router with tracing, CORS and the body limit applied.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/transcribe-image", post(routes::transcribe_image))
        .route("/api/convert-file", post(routes::convert_file))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), Page2MdError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Listening on http://{} (default model {}, upload limit {} bytes)",
        listener.local_addr()?,
        state.config.default_model,
        state.config.max_upload_bytes
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
