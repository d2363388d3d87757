//! # Common API Types
//!
//! Response shapes shared by several handlers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{AdTier, job, purchase_event};
use crate::repositories::DailyEngagement;
use crate::search::RankedJob;

/// Public view of a job posting
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    #[schema(example = "b7f1c0de9a4e4e0f8d1f3c2a5b6d7e8f")]
    pub external_id: String,
    #[schema(example = "senior-go-engineer-acme-1700000000")]
    pub slug: String,
    pub job_title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub location: String,
    #[schema(example = "$60k - $90k")]
    pub salary_range: String,
    pub description: String,
    pub perks: Option<String>,
    pub interview_process: Option<String>,
    pub how_to_apply: String,
    pub ad_tier: AdTier,
    pub company_icon_id: Option<String>,
    /// Applications go through the board's quick-apply flow
    pub is_quick_apply: bool,
    #[schema(example = "2026-01-10T09:00:00Z")]
    pub created_at: String,
    pub approved_at: Option<String>,
}

impl From<job::Model> for JobInfo {
    fn from(model: job::Model) -> Self {
        let is_quick_apply = model.is_quick_apply();
        Self {
            external_id: model.external_id,
            slug: model.slug,
            job_title: model.job_title,
            company: model.company,
            company_url: model.company_url,
            location: model.location,
            salary_range: model.salary_range,
            description: model.description,
            perks: model.perks,
            interview_process: model.interview_process,
            how_to_apply: model.how_to_apply,
            ad_tier: model.ad_type,
            company_icon_id: model.company_icon_id,
            is_quick_apply,
            created_at: model.created_at.to_rfc3339(),
            approved_at: model.approved_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

impl From<RankedJob> for JobInfo {
    fn from(ranked: RankedJob) -> Self {
        JobInfo {
            is_quick_apply: ranked.is_quick_apply,
            ..JobInfo::from(ranked.job)
        }
    }
}

/// A checkout recorded against a posting
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseInfo {
    pub session_id: String,
    /// Minor currency units
    pub amount: i64,
    #[schema(example = "USD")]
    pub currency: String,
    pub description: String,
    pub ad_tier: AdTier,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<purchase_event::Model> for PurchaseInfo {
    fn from(model: purchase_event::Model) -> Self {
        Self {
            session_id: model.session_id,
            amount: model.amount,
            currency: model.currency,
            description: model.description,
            ad_tier: model.ad_type,
            created_at: model.created_at.to_rfc3339(),
            completed_at: model.completed_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Engagement on one day (UTC)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyStatsInfo {
    #[schema(value_type = String, example = "2026-01-10")]
    pub date: NaiveDate,
    pub page_views: u64,
    pub clickouts: u64,
}

impl From<DailyEngagement> for DailyStatsInfo {
    fn from(day: DailyEngagement) -> Self {
        Self {
            date: day.date,
            page_views: day.page_views,
            clickouts: day.clickouts,
        }
    }
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "ok")]
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}
