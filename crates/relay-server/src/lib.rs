//! HTTP surface of the relay.
//!
//! `POST <webhook path>` takes a JSON alert and answers with the execution
//! report. Malformed input is rejected with 400 (415 for a non-JSON content
//! type) before anything is recorded; every business failure is a 200 with
//! `success: false`.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use relay_core::traits::{Persistence, SignalStore};
use relay_engine::SignalOrchestrator;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    orchestrator: SignalOrchestrator,
    store: Arc<dyn Persistence>,
}

/// Build the router: webhook, `/health` and `/signals/{id}`.
pub fn router(
    orchestrator: SignalOrchestrator,
    store: Arc<dyn Persistence>,
    webhook_path: &str,
) -> Router {
    Router::new()
        .route(webhook_path, post(webhook))
        .route("/health", get(health))
        .route("/signals/{id}", get(signal))
        .with_state(AppState { orchestrator, store })
}

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Relay listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

fn rejection(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    warn!("Rejected alert ({}): {}", status, message);
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_json(&headers) {
        return rejection(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content-Type must be application/json",
        );
    }

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => return rejection(StatusCode::BAD_REQUEST, format!("Malformed JSON: {e}")),
    };

    match state.orchestrator.handle(raw).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) if e.is_client_error() => rejection(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            error!("Alert handling failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn signal(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.store.signal(id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": format!("Signal {id} not found") })),
        )
            .into_response(),
        Err(e) => {
            error!("Signal lookup {} failed: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_json_content_types() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/vnd.alert+json"));
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }
}
