//! Recognition endpoint (`POST /api/ocr`).
//!
//! Rejections found before any model call are plain JSON errors. Once the
//! request is accepted the response is an NDJSON stream of progress events
//! ending in one `result` or `error` line.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use listscan_core::{ProgressEvent, RecognitionRequest};
use listscan_pipeline::ndjson_stream;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::ApiError;
use crate::server::GatewayState;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Handler for `POST /api/ocr`.
pub async fn recognize(
    State(state): State<GatewayState>,
    payload: Result<Json<RecognitionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected recognition request body");
            return ApiError::from_rejection(rejection).into_response();
        }
    };

    // One snapshot per request; reloads apply to the next request.
    let config = state.config.read().await.clone();

    match listscan_pipeline::start(state.model.clone(), config, request) {
        Ok(events) => stream_events(events),
        Err(err) => {
            warn!(code = err.code(), error = %err, "Rejected recognition request");
            ApiError::from(err).into_response()
        }
    }
}

fn stream_events(events: mpsc::Receiver<ProgressEvent>) -> Response {
    (
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(ndjson_stream(events)),
    )
        .into_response()
}
