//! Gateway access gate.
//!
//! When an access token is configured, API calls must carry it in the
//! `X-Access-Token` header and the client page must be opened with
//! `?token=...`. Other static assets stay public so the page can load its
//! scripts and styles once admitted.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;
use crate::server::GatewayState;

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

const LOCKED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Access restricted</title>
    <style>
        body { font-family: -apple-system, "Helvetica Neue", Arial, sans-serif; background: #f5f5f7;
               min-height: 100vh; margin: 0; display: flex; align-items: center; justify-content: center; }
        .card { background: #fff; border-radius: 18px; padding: 48px; max-width: 500px; text-align: center;
                box-shadow: 0 4px 24px rgba(0, 0, 0, 0.06); }
        h1 { color: #1d1d1f; font-size: 32px; margin: 0 0 12px; }
        p { color: #86868b; font-size: 17px; }
        code { background: #f5f5f7; border-radius: 12px; padding: 12px 16px; display: inline-block; }
    </style>
</head>
<body>
    <div class="card">
        <h1>Access restricted</h1>
        <p>This service requires a valid access token.</p>
        <code>?token=your_token</code>
    </div>
</body>
</html>"#;

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Constant-time token comparison.
pub fn token_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn is_page(path: &str) -> bool {
    path == "/" || path == "/index.html"
}

fn query_token(uri: &Uri) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.token)
}

fn locked_page() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        LOCKED_PAGE,
    )
        .into_response()
}

pub async fn access_gate(State(state): State<GatewayState>, req: Request<Body>, next: Next) -> Response {
    let Some(expected) = state.access_token.as_deref() else {
        return next.run(req).await;
    };
    let path = req.uri().path();

    if path.starts_with("/api/") {
        let provided = req
            .headers()
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if !provided.is_some_and(|token| token_matches(token, expected)) {
            warn!(path, "Rejected API call without a valid access token");
            return ApiError::unauthorized().into_response();
        }
    } else if is_page(path) {
        let provided = query_token(req.uri());
        if !provided.is_some_and(|token| token_matches(&token, expected)) {
            warn!(path, "Rejected page load without a valid access token");
            return locked_page();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison() {
        assert!(token_matches("abc", "abc"));
        assert!(!token_matches("abd", "abc"));
        assert!(!token_matches("ab", "abc"));
        assert!(!token_matches("", "abc"));
    }

    #[test]
    fn token_is_read_from_query() {
        let uri: Uri = "/?lang=en&token=a%20b".parse().unwrap();
        assert_eq!(query_token(&uri).as_deref(), Some("a b"));
        let uri: Uri = "/index.html".parse().unwrap();
        assert_eq!(query_token(&uri), None);
    }
}
