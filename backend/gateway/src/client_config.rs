//! Client-safe config view (`GET /config.json`).
//!
//! The browser client reads its default concurrency, thinking toggle and
//! upload limits from here. Prompts and model names are never exposed.

use axum::extract::State;
use axum::Json;
use listscan_config::ClientConfig;

use crate::server::GatewayState;

pub async fn get_client_config(State(state): State<GatewayState>) -> Json<ClientConfig> {
    Json(state.config.read().await.client_view())
}
