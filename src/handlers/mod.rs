//! # API Handlers
//!
//! HTTP endpoint handlers for the job board API.

pub mod admin;
pub mod apply;
pub mod engagement;
pub mod jobs;
pub mod payments;
pub mod types;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::warn;

use crate::db;
use crate::models::ServiceInfo;
use crate::server::AppState;
use types::StatusResponse;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness and database reachability
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy", body = StatusResponse),
        (status = 503, description = "Database is unreachable", body = StatusResponse)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    match db::health_check(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::new("ok"))),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusResponse::new("unavailable")),
            )
        }
    }
}
