// 🌐 REST API - preview and finalize over HTTP (axum)

use crate::error::ImportError;
use crate::finalizer::{finalize, EntityStore, FinalizeOutcome, ImportSummary};
use crate::importer::{preview, PreviewReport};
use crate::staging::SqliteStagingStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    staging: Arc<Mutex<SqliteStagingStore>>,
    store: Arc<Mutex<EntityStore>>,
}

impl AppState {
    pub fn new(staging: SqliteStagingStore, store: EntityStore) -> Self {
        AppState {
            staging: Arc::new(Mutex::new(staging)),
            store: Arc::new(Mutex::new(store)),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn fail(status: StatusCode, message: impl Into<String>) -> Response {
        let body = ApiResponse::<T> {
            success: false,
            data: None,
            error: Some(message.into()),
        };
        (status, Json(body)).into_response()
    }
}

fn error_response<T: Serialize>(err: ImportError) -> Response {
    match err {
        ImportError::Csv(e) => ApiResponse::<T>::fail(StatusCode::BAD_REQUEST, format!("Invalid CSV: {}", e)),
        other => {
            error!(error = %other, "request failed");
            ApiResponse::<T>::fail(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/imports/preview - Validate CSV body and stage accepted rows
async fn preview_import(State(state): State<AppState>, body: String) -> Response {
    let staging = lock(&state.staging);

    match preview(body.as_bytes(), &*staging) {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::ok(report))).into_response(),
        Err(e) => error_response::<PreviewReport>(e),
    }
}

/// POST /api/imports/:batch_id/finalize - Commit a staged batch
async fn finalize_import(State(state): State<AppState>, Path(batch_id): Path<String>) -> Response {
    let staging = lock(&state.staging);
    let mut store = lock(&state.store);

    match finalize(&*staging, &mut store, &batch_id) {
        Ok(FinalizeOutcome::Completed(summary)) => {
            (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response()
        }
        Ok(outcome @ FinalizeOutcome::NotFound) => ApiResponse::<ImportSummary>::fail(
            StatusCode::NOT_FOUND,
            outcome.message().unwrap_or_default(),
        ),
        Ok(outcome @ FinalizeOutcome::NothingToImport) => ApiResponse::<ImportSummary>::fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            outcome.message().unwrap_or_default(),
        ),
        Err(e) => error_response::<ImportSummary>(e),
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/imports/preview", post(preview_import))
        .route("/imports/:batch_id/finalize", post(finalize_import))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rusqlite::Connection;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(
            SqliteStagingStore::from_connection(Connection::open_in_memory().unwrap()).unwrap(),
            EntityStore::from_connection(Connection::open_in_memory().unwrap()).unwrap(),
        )
    }

    async fn send(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_preview_then_finalize() {
        let state = test_state();
        let csv = "building_name,street_address,unit,city,state,zip_code\n\
                   Tower,1 Main St,2,Boston,MA,02134\n\
                   Tower,1 Main St,2,Boston,MA,0213\n";

        let (status, json) = send(router(state.clone()), "/api/imports/preview", csv).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["rows"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"]["errors"].as_array().unwrap().len(), 1);
        let batch_id = json["data"]["batch_id"].as_str().unwrap().to_string();

        let uri = format!("/api/imports/{}/finalize", batch_id);
        let (status, json) = send(router(state.clone()), &uri, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["imported"], 1);
        assert_eq!(json["data"]["skipped"], 0);

        let (status, json) = send(router(state), &uri, "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Import batch not found. Please upload again.");
    }

    #[tokio::test]
    async fn test_finalize_empty_batch() {
        let state = test_state();
        let (_, json) = send(router(state.clone()), "/api/imports/preview", "building_name\nTower\n").await;
        let batch_id = json["data"]["batch_id"].as_str().unwrap().to_string();

        let uri = format!("/api/imports/{}/finalize", batch_id);
        let (status, json) = send(router(state), &uri, "").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Nothing to import.");
    }
}
