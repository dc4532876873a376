//! Request middleware: shared-secret check and access logging.

use crate::server::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Whether `headers` carry the expected key. Always `true` when no key is
/// configured.
pub fn api_key_is_valid(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    let Some(candidate) = headers.get(API_KEY_HEADER) else {
        return false;
    };
    !expected.is_empty() && candidate.as_bytes() == expected.as_bytes()
}

/// Reject requests without the configured `X-API-Key` before any handler runs.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !api_key_is_valid(request.headers(), state.api_key.as_deref()) {
        warn!(
            "rejected {} {}: missing or invalid API key",
            request.method(),
            request.uri().path()
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid or missing API key"})),
        )
            .into_response();
    }
    next.run(request).await
}

pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    info!("{method} {path} -> {}", response.status().as_u16());
    response
}
