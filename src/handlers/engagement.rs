//! Clickout tracking.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Redirect,
};
use serde::Deserialize;
use tracing::warn;
use url::Url;
use utoipa::IntoParams;

use crate::error::{ApiError, BoardError};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClickoutParams {
    /// External id of the posting
    pub j: String,
}

/// Count a clickout and send the visitor to the employer
///
/// Postings whose how-to-apply is a URL redirect there; quick-apply postings
/// redirect to their page on the board.
#[utoipa::path(
    get,
    path = "/clickout",
    params(ClickoutParams),
    responses(
        (status = 303, description = "Redirect to the application target"),
        (status = 404, description = "No approved posting with this id", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn clickout(
    State(state): State<AppState>,
    params: Result<Query<ClickoutParams>, QueryRejection>,
) -> Result<Redirect, ApiError> {
    let Query(params) = params?;
    let job = state
        .jobs
        .find_by_external_id(&params.j)
        .await?
        .filter(|job| job.is_approved())
        .ok_or(BoardError::not_found("job"))?;

    if let Err(e) = state.engagement.track_clickout(job.id).await {
        warn!(job_id = job.id, error = %e, "Failed to record clickout");
    }

    let target = match Url::parse(job.how_to_apply.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => format!("/jobs/{}", job.slug),
    };
    Ok(Redirect::to(&target))
}
