//! # Admin Handlers
//!
//! Moderation endpoints. Every route here sits behind
//! [`admin_auth_middleware`](crate::auth::admin_auth_middleware).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::handlers::types::{JobInfo, StatusResponse};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct JobIdPath {
    /// Internal job id
    #[param(example = 42)]
    pub id: i32,
}

/// Postings waiting for moderation, newest first
#[utoipa::path(
    get,
    path = "/admin/jobs/pending",
    responses(
        (status = 200, description = "Unapproved postings", body = Vec<JobInfo>),
        (status = 401, description = "Missing or invalid admin token", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_pending(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<JobInfo>>, ApiError> {
    let jobs = state.lifecycle.pending_approval().await?;
    Ok(Json(jobs.into_iter().map(JobInfo::from).collect()))
}

/// Approve a posting on its current tier
#[utoipa::path(
    post,
    path = "/admin/jobs/{id}/approve",
    params(JobIdPath),
    responses(
        (status = 200, description = "Posting approved", body = StatusResponse),
        (status = 401, description = "Missing or invalid admin token", body = ApiError),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn approve_job(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(JobIdPath { id }): Path<JobIdPath>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.lifecycle.approve(id).await?;
    info!(job_id = id, "Admin approved job");
    Ok(Json(StatusResponse::new("approved")))
}

/// Take a posting off the board
#[utoipa::path(
    post,
    path = "/admin/jobs/{id}/disapprove",
    params(JobIdPath),
    responses(
        (status = 200, description = "Posting disapproved", body = StatusResponse),
        (status = 401, description = "Missing or invalid admin token", body = ApiError),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn disapprove_job(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(JobIdPath { id }): Path<JobIdPath>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.lifecycle.disapprove(id).await?;
    info!(job_id = id, "Admin disapproved job");
    Ok(Json(StatusResponse::new("disapproved")))
}

/// Delete a posting with its tokens, events and purchases
#[utoipa::path(
    delete,
    path = "/admin/jobs/{id}",
    params(JobIdPath),
    responses(
        (status = 204, description = "Posting deleted"),
        (status = 401, description = "Missing or invalid admin token", body = ApiError),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_job(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(JobIdPath { id }): Path<JobIdPath>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle.permanent_delete(id).await?;
    info!(job_id = id, "Admin deleted job");
    Ok(StatusCode::NO_CONTENT)
}
