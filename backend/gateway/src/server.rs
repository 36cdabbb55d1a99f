//! Main HTTP gateway server and routing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use listscan_config::{ScanConfig, UploadConfig};
use listscan_core::VisionModel;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::{auth, client_config, health_api, ocr_api};

/// Live config; replaced wholesale on reload.
pub type SharedConfig = Arc<RwLock<ScanConfig>>;

/// Headroom on top of the base64-expanded image for the rest of the JSON body.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub config: SharedConfig,
    /// `None` when no API key is configured; recognition then fails with
    /// `NO_API_KEY`.
    pub model: Option<Arc<dyn VisionModel>>,
    pub access_token: Option<Arc<str>>,
    pub public_dir: PathBuf,
}

impl GatewayState {
    pub fn new(config: ScanConfig, model: Option<Arc<dyn VisionModel>>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            model,
            access_token: None,
            public_dir: PathBuf::from("public"),
        }
    }

    /// Blank tokens leave the gate open.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token
            .filter(|t| !t.trim().is_empty())
            .map(Arc::from);
        self
    }

    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }
}

/// Largest request body accepted, sized for a base64 image at the upload limit.
pub fn body_limit_for(upload: &UploadConfig) -> usize {
    upload.max_size_bytes().saturating_mul(4) / 3 + BODY_OVERHEAD_BYTES
}

/// Build the router. The body limit is fixed when the router is built.
pub fn build_router(state: GatewayState, body_limit: usize) -> Router {
    let static_files = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/api/ocr", post(ocr_api::recognize))
        .route("/config.json", get(client_config::get_client_config))
        .route("/healthz", get(health_api::get_health))
        .fallback_service(static_files)
        .layer(from_fn_with_state(state.clone(), auth::access_gate))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the Axum HTTP server for the gateway.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let body_limit = body_limit_for(&state.config.read().await.upload);
    let gated = state.access_token.is_some();
    let app = build_router(state, body_limit);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, body_limit, access_gate = gated, "Gateway HTTP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
