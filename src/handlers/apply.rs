//! Quick-apply endpoints.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, BoardError};
use crate::handlers::types::StatusResponse;
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExternalIdPath {
    /// Public identifier of the posting
    pub external_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ApplyTokenPath {
    pub token: String,
}

/// Application for a quick-apply posting
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyBody {
    #[schema(example = "candidate@example.com")]
    pub email: String,
    /// CV file, base64 encoded
    pub cv_base64: String,
}

/// Acknowledgement that a confirmation email is on its way
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplyResponse {
    #[schema(example = "confirmation_sent")]
    pub status: String,
    /// Hours the confirmation link stays valid
    pub expires_in_hours: i64,
}

/// Apply to a posting with a CV
#[utoipa::path(
    post,
    path = "/apply/{external_id}",
    params(ExternalIdPath),
    request_body = ApplyBody,
    responses(
        (status = 202, description = "Application held until the candidate confirms", body = ApplyResponse),
        (status = 400, description = "Invalid email or CV, or posting does not take quick applications", body = ApiError),
        (status = 404, description = "No approved posting with this id", body = ApiError),
        (status = 502, description = "Confirmation email could not be sent", body = ApiError)
    ),
    tag = "apply"
)]
pub async fn apply(
    State(state): State<AppState>,
    Path(ExternalIdPath { external_id }): Path<ExternalIdPath>,
    payload: Result<Json<ApplyBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApplyResponse>), ApiError> {
    let Json(body) = payload?;
    let cv = STANDARD
        .decode(body.cv_base64.trim())
        .map_err(|_| BoardError::invalid_field("cv_base64", "must be base64 encoded"))?;

    state.quick_apply.apply(&external_id, &body.email, cv).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApplyResponse {
            status: "confirmation_sent".to_string(),
            expires_in_hours: crate::apply::APPLY_TOKEN_TTL_HOURS,
        }),
    ))
}

/// Confirm an application and forward it to the employer
#[utoipa::path(
    post,
    path = "/apply/confirm/{token}",
    params(ApplyTokenPath),
    responses(
        (status = 200, description = "Application forwarded", body = StatusResponse),
        (status = 404, description = "Unknown, expired or already used token", body = ApiError),
        (status = 502, description = "Application could not be forwarded", body = ApiError)
    ),
    tag = "apply"
)]
pub async fn confirm_application(
    State(state): State<AppState>,
    Path(ApplyTokenPath { token }): Path<ApplyTokenPath>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.quick_apply.confirm(&token).await?;
    Ok(Json(StatusResponse::new("forwarded")))
}
