//! # Job Handlers
//!
//! Public listing and detail pages, draft submission, and the token-guarded
//! edit and manage endpoints used by advertisers.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, BoardError};
use crate::geo;
use crate::handlers::types::{DailyStatsInfo, JobInfo, PurchaseInfo};
use crate::lifecycle::{JobDraft, JobState};
use crate::mail::Email;
use crate::models::{AdTier, CurrencyCode, job};
use crate::search::SearchRequest;
use crate::server::AppState;

/// Listing filters. Short names keep shared search URLs compact.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Location filter
    #[param(example = "Berlin")]
    pub l: Option<String>,
    /// Skill or keyword filter
    #[param(example = "rust")]
    pub t: Option<String>,
    /// 1-based page number
    #[param(example = 1)]
    pub p: Option<i64>,
}

/// One page of search results
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub jobs: Vec<JobInfo>,
    /// Approved pinned postings, shown above the results
    pub pinned: Vec<JobInfo>,
    /// Total matches across all pages
    pub total: u64,
    pub page: u64,
    pub page_links: Vec<u64>,
    /// No results matched the location; remote postings are shown instead
    pub remote_fallback: bool,
}

/// Slug path parameter
#[derive(Debug, Deserialize, IntoParams)]
pub struct SlugPath {
    #[param(example = "senior-rust-engineer-acme-1700000000")]
    pub slug: String,
}

/// Edit token path parameter
#[derive(Debug, Deserialize, IntoParams)]
pub struct EditTokenPath {
    /// Token issued when the posting was submitted
    pub token: String,
}

/// A stored draft and the link secret for managing it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateJobResponse {
    pub job: JobInfo,
    pub edit_token: String,
}

/// Price of a purchasable tier
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TierPrice {
    pub tier: AdTier,
    /// Minor currency units
    pub amount: i64,
    #[schema(example = "€59.00")]
    pub display: String,
}

/// Everything an advertiser sees on the manage page
#[derive(Debug, Serialize, ToSchema)]
pub struct ManageResponse {
    pub job: JobInfo,
    pub state: JobState,
    pub is_pinned: bool,
    pub purchases: Vec<PurchaseInfo>,
    pub page_views: u64,
    pub clickouts: u64,
    /// Clickouts per view in percent, absent until both are non-zero
    pub conversion_rate: Option<String>,
    pub daily: Vec<DailyStatsInfo>,
    /// Currency prices are quoted in for this visitor
    pub currency: CurrencyCode,
    pub prices: Vec<TierPrice>,
}

/// Search approved postings
#[utoipa::path(
    get,
    path = "/jobs",
    params(SearchParams),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Invalid query", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn search_jobs(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;

    let outcome = state
        .search
        .search(SearchRequest {
            location: params.l.unwrap_or_default(),
            skill: params.t.unwrap_or_default(),
            page: params.p.unwrap_or(1),
            page_size: state.config.jobs_per_page,
        })
        .await?;

    Ok(Json(SearchResponse {
        jobs: outcome.jobs.into_iter().map(JobInfo::from).collect(),
        pinned: outcome.pinned.into_iter().map(JobInfo::from).collect(),
        total: outcome.total,
        page: outcome.page,
        page_links: outcome.page_links,
        remote_fallback: outcome.remote_fallback,
    }))
}

/// Show an approved posting and count the view
#[utoipa::path(
    get,
    path = "/jobs/{slug}",
    params(SlugPath),
    responses(
        (status = 200, description = "Job posting", body = JobInfo),
        (status = 404, description = "No approved posting with this slug", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(SlugPath { slug }): Path<SlugPath>,
) -> Result<Json<JobInfo>, ApiError> {
    let job = state
        .jobs
        .find_approved_by_slug(&slug)
        .await?
        .ok_or(BoardError::not_found("job"))?;

    if let Err(e) = state.engagement.track_view(job.id).await {
        warn!(job_id = job.id, error = %e, "Failed to record page view");
    }

    Ok(Json(JobInfo::from(job)))
}

/// Submit a new posting for review
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = JobDraft,
    responses(
        (status = 201, description = "Draft stored", body = CreateJobResponse),
        (status = 400, description = "Submission is invalid", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let Json(draft) = payload?;
    let saved = state.lifecycle.save_draft(draft).await?;

    let manage_url = format!(
        "{}/manage/{}",
        state.config.site_url.trim_end_matches('/'),
        saved.edit_token.token
    );
    notify_submission(&state, &saved.job, &manage_url).await;

    info!(job_id = saved.job.id, "Job submitted");
    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job: JobInfo::from(saved.job),
            edit_token: saved.edit_token.token,
        }),
    ))
}

/// Replace a posting's content using its edit token
#[utoipa::path(
    put,
    path = "/edit/{token}",
    params(EditTokenPath),
    request_body = JobDraft,
    responses(
        (status = 200, description = "Posting updated", body = JobInfo),
        (status = 400, description = "Submission is invalid", body = ApiError),
        (status = 404, description = "Unknown edit token", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn update_job(
    State(state): State<AppState>,
    Path(EditTokenPath { token }): Path<EditTokenPath>,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Result<Json<JobInfo>, ApiError> {
    let Json(draft) = payload?;
    let job = state.lifecycle.update_by_token(&token, draft).await?;
    Ok(Json(JobInfo::from(job)))
}

/// Manage page for the advertiser holding the edit token
#[utoipa::path(
    get,
    path = "/manage/{token}",
    params(EditTokenPath),
    responses(
        (status = 200, description = "Posting status, purchases and engagement", body = ManageResponse),
        (status = 404, description = "Unknown edit token", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn manage_job(
    State(state): State<AppState>,
    Path(EditTokenPath { token }): Path<EditTokenPath>,
    headers: HeaderMap,
) -> Result<Json<ManageResponse>, ApiError> {
    let job = state
        .jobs
        .find_by_edit_token(&token)
        .await?
        .ok_or(BoardError::not_found("job"))?;

    let job_state = state.lifecycle.state_of(&job).await?;
    let purchases = state.purchases.list_for_job(job.id).await?;
    let stats = state.engagement.stats(job.id).await?;
    let currency = geo::currency_for_request(state.currency.as_ref(), &headers).await;

    let prices = [
        AdTier::WithCompanyLogo,
        AdTier::SponsoredBackground,
        AdTier::SponsoredPinnedFor7Days,
        AdTier::SponsoredPinnedFor30Days,
    ]
    .into_iter()
    .filter_map(|tier| {
        state
            .lifecycle
            .quote(tier)
            .ok()
            .map(|amount| TierPrice {
                tier,
                amount,
                display: format!("{}{:.2}", currency.symbol(), amount as f64 / 100.0),
            })
    })
    .collect();

    Ok(Json(ManageResponse {
        is_pinned: job.is_pinned(),
        job: JobInfo::from(job),
        state: job_state,
        purchases: purchases.into_iter().map(PurchaseInfo::from).collect(),
        page_views: stats.page_views,
        clickouts: stats.clickouts,
        conversion_rate: stats.conversion_rate,
        daily: stats.daily.into_iter().map(DailyStatsInfo::from).collect(),
        currency,
        prices,
    }))
}

/// Send the manage link to the advertiser and a review notice to the admin.
/// Failures are logged; the draft is already stored.
async fn notify_submission(state: &AppState, job: &job::Model, manage_url: &str) {
    let from = state.config.email_from.clone();
    let messages = [
        Email::new(
            from.clone(),
            job.company_email.as_str(),
            format!("Your job posting: {}", job.job_title),
            format!(
                "Thanks for posting {} at {}. Edit, promote and track your posting here: {}",
                job.job_title, job.company, manage_url
            ),
        ),
        Email::new(
            from,
            state.config.admin_email.as_str(),
            format!("New job awaiting approval: {} at {}", job.job_title, job.company),
            format!("Job {} ({}) was submitted for review.", job.id, job.slug),
        ),
    ];

    for message in messages {
        if let Err(e) = state.mailer.send(message).await {
            warn!(job_id = job.id, error = %e, "Failed to send submission email");
        }
    }
}
