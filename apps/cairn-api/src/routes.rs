use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use cairn_domain::SearchResult;
use cairn_service::{AggregateMetrics, IngestRequest, IngestResponse, SearchRequest, ServiceError};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/search", post(search))
        .route("/v1/ingest", post(ingest))
        .route("/v1/metrics", get(metrics))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResult>, ApiError> {
    let response = state.service.search(payload).await?;
    Ok(Json(response))
}

async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let response = state.service.ingest(payload).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct MetricsParams {
    window: Option<usize>,
}

async fn metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> Result<Json<AggregateMetrics>, ApiError> {
    let response = state.service.aggregate_metrics(params.window).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: String,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_code: String,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::InvalidRequest { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            ServiceError::Retrieval { .. } => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "retrieval_unavailable", message)
            }
            ServiceError::Generation { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "generation_failed", message)
            }
            ServiceError::Provider { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message)
            }
            ServiceError::Storage { .. } => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_code: self.error_code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
