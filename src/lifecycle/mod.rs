//! # Ad Lifecycle
//!
//! Drafts, payment initiation, tier promotion, admin moderation and the
//! demotion sweep. A posting moves through:
//!
//! ```text
//! PendingApproval --checkout--> PaymentPending --confirmed--> Approved / ApprovedPromoted
//!        |                                                         |
//!        +--------------admin approve----------------------------->+
//!                                                                  |
//!                         pin expired (demote_expired) --> Approved (Basic)
//! ```
//!
//! Transitions that can race are conditional updates in [`JobRepository`];
//! this module interprets their affected-row counts.

pub mod salary;
pub mod slug;
pub mod validation;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use rand::Rng;
use sea_orm::{ActiveValue::Set, DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::PricingConfig;
use crate::error::{BoardError, BoardResult};
use crate::models::{AdTier, CurrencyCode, edit_token, job, purchase_event};
use crate::repositories::{
    EditTokenRepository, JobRepository, NewPurchaseEvent, PurchaseEventRepository,
};

pub use salary::salary_range;
pub use slug::{job_slug, slugify};
pub use validation::{JobDraft, ValidDraft, is_email};

/// Random URL-safe token with 256 bits of entropy.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    base64_url::encode(&bytes)
}

/// Lifecycle state derived from a posting's stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    PendingApproval,
    PaymentPending,
    Approved,
    ApprovedPromoted,
}

impl JobState {
    pub fn derive(job: &job::Model, has_open_session: bool) -> Self {
        match (job.is_approved(), job.is_pinned(), has_open_session) {
            (true, true, _) => JobState::ApprovedPromoted,
            (true, false, _) => JobState::Approved,
            (false, _, true) => JobState::PaymentPending,
            (false, _, false) => JobState::PendingApproval,
        }
    }
}

/// What a confirmed purchase did to its posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TierOutcome {
    /// The posting was unapproved and is now live on the purchased tier.
    Approved,
    /// The posting was live on a lower tier and was promoted.
    Upgraded,
    /// The posting already had an equal or better tier.
    Unchanged,
}

/// A freshly stored draft and the token that lets its owner edit it.
#[derive(Debug, Clone)]
pub struct SavedDraft {
    pub job: job::Model,
    pub edit_token: edit_token::Model,
}

/// Rows reset to Basic per pinned tier by one demotion sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DemotionReport {
    pub pinned_30_days: u64,
    pub pinned_7_days: u64,
}

impl DemotionReport {
    pub fn total(&self) -> u64 {
        self.pinned_30_days + self.pinned_7_days
    }
}

/// Drives postings through their lifecycle.
#[derive(Clone)]
pub struct AdLifecycle {
    db: Arc<DatabaseConnection>,
    jobs: JobRepository,
    purchases: PurchaseEventRepository,
    pricing: PricingConfig,
}

impl AdLifecycle {
    pub fn new(db: Arc<DatabaseConnection>, pricing: PricingConfig) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            purchases: PurchaseEventRepository::new(db.clone()),
            db,
            pricing,
        }
    }

    /// Validate and store a new posting together with its edit token.
    #[instrument(skip_all, fields(company = %draft.company))]
    pub async fn save_draft(&self, draft: JobDraft) -> BoardResult<SavedDraft> {
        let draft = draft.validate()?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let job = JobRepository::insert(
            &txn,
            job::ActiveModel {
                external_id: Set(uuid::Uuid::new_v4().simple().to_string()),
                slug: Set(job_slug(&draft.job_title, &draft.company, now.timestamp())),
                ad_type: Set(AdTier::Basic),
                created_at: Set(now),
                approved_at: Set(None),
                ..draft_columns(draft)
            },
        )
        .await?;
        let edit_token = EditTokenRepository::insert(&txn, &generate_token(), job.id, now).await?;
        txn.commit().await?;

        counter!("jobboard_drafts_saved_total").increment(1);
        info!(job_id = job.id, slug = %job.slug, "Stored job draft");
        Ok(SavedDraft { job, edit_token })
    }

    /// Replace the editable fields of the posting `token` was issued for.
    /// Slug, tier and approval are left as they are.
    #[instrument(skip_all)]
    pub async fn update_by_token(&self, token: &str, draft: JobDraft) -> BoardResult<job::Model> {
        let draft = draft.validate()?;
        let existing = self
            .jobs
            .find_by_edit_token(token)
            .await?
            .ok_or(BoardError::not_found("job"))?;

        let mut active = draft_columns(draft);
        active.id = Set(existing.id);
        let updated = self.jobs.update(active).await?;

        info!(job_id = updated.id, "Updated job via edit token");
        Ok(updated)
    }

    /// Price of `tier` in minor units. Basic is free and cannot be bought.
    pub fn quote(&self, tier: AdTier) -> BoardResult<i64> {
        self.pricing
            .price_for(tier)
            .ok_or_else(|| BoardError::invalid_field("tier", "tier cannot be purchased"))
    }

    /// Record a checkout session opened for `job_id`. The posting itself is
    /// not touched until the gateway confirms payment.
    #[instrument(skip(self, email), fields(tier = tier.as_str()))]
    pub async fn initiate_payment(
        &self,
        job_id: i32,
        session_id: &str,
        tier: AdTier,
        currency: CurrencyCode,
        email: &str,
    ) -> BoardResult<purchase_event::Model> {
        let amount = self.quote(tier)?;
        if session_id.trim().is_empty() {
            return Err(BoardError::invalid_field("session_id", "is required"));
        }
        if self.jobs.find_by_id(job_id).await?.is_none() {
            return Err(BoardError::not_found("job"));
        }

        let event = self
            .purchases
            .create(
                NewPurchaseEvent {
                    session_id: session_id.to_string(),
                    amount,
                    currency: currency.code().to_string(),
                    description: tier.description().to_string(),
                    tier,
                    email: email.to_string(),
                    job_id,
                },
                Utc::now(),
            )
            .await?;

        counter!("jobboard_checkouts_started_total", "tier" => tier.as_str()).increment(1);
        Ok(event)
    }

    /// Apply a paid tier: approve an unapproved posting on that tier, or
    /// promote a live one when `tier` ranks above its current tier.
    #[instrument(skip_all, fields(job_id = job.id, tier = tier.as_str()))]
    pub async fn apply_confirmed_tier(
        &self,
        job: &job::Model,
        tier: AdTier,
    ) -> BoardResult<TierOutcome> {
        if !job.is_approved() {
            let rows = self.jobs.approve_with_tier(job.id, tier, Utc::now()).await?;
            if rows == 1 {
                counter!("jobboard_tier_transitions_total", "outcome" => "approved").increment(1);
                return Ok(TierOutcome::Approved);
            }
            // Approved concurrently; fall through to the promotion rule.
            warn!("Job was approved while applying confirmed tier");
        } else if tier.rank() <= job.ad_type.rank() {
            return Ok(TierOutcome::Unchanged);
        }

        let rows = self.jobs.upgrade_tier(job.id, tier).await?;
        if rows == 1 {
            counter!("jobboard_tier_transitions_total", "outcome" => "upgraded").increment(1);
            Ok(TierOutcome::Upgraded)
        } else {
            Ok(TierOutcome::Unchanged)
        }
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, job_id: i32) -> BoardResult<()> {
        if self.jobs.approve(job_id, Utc::now()).await? == 0 {
            return Err(BoardError::not_found("job"));
        }
        info!("Job approved");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn disapprove(&self, job_id: i32) -> BoardResult<()> {
        if self.jobs.disapprove(job_id).await? == 0 {
            return Err(BoardError::not_found("job"));
        }
        info!("Job disapproved");
        Ok(())
    }

    /// Reset pinned postings whose pin period has elapsed back to Basic.
    #[instrument(skip(self))]
    pub async fn demote_expired(&self, now: DateTime<Utc>) -> BoardResult<DemotionReport> {
        let mut report = DemotionReport::default();
        for tier in AdTier::PINNED {
            let Some(duration) = tier.pin_duration() else {
                continue;
            };
            let demoted = self.jobs.demote_approved_before(tier, now - duration).await?;
            match tier {
                AdTier::SponsoredPinnedFor30Days => report.pinned_30_days = demoted,
                AdTier::SponsoredPinnedFor7Days => report.pinned_7_days = demoted,
                AdTier::Basic | AdTier::SponsoredBackground | AdTier::WithCompanyLogo => {}
            }
            counter!("jobboard_jobs_demoted_total", "tier" => tier.as_str()).increment(demoted);
        }

        if report.total() > 0 {
            info!(
                pinned_30_days = report.pinned_30_days,
                pinned_7_days = report.pinned_7_days,
                "Demoted expired pinned jobs"
            );
        }
        Ok(report)
    }

    /// Remove a posting and everything that references it.
    #[instrument(skip(self))]
    pub async fn permanent_delete(&self, job_id: i32) -> BoardResult<()> {
        if !self.jobs.delete_cascade(job_id).await? {
            return Err(BoardError::not_found("job"));
        }
        info!("Job permanently deleted");
        Ok(())
    }

    pub async fn state_of(&self, job: &job::Model) -> BoardResult<JobState> {
        let open = if job.is_approved() {
            false
        } else {
            self.purchases.has_open_session(job.id).await?
        };
        Ok(JobState::derive(job, open))
    }

    pub async fn pending_approval(&self) -> BoardResult<Vec<job::Model>> {
        Ok(self.jobs.find_pending_approval().await?)
    }
}

/// Editable columns of a posting, taken from a validated draft.
fn draft_columns(draft: ValidDraft) -> job::ActiveModel {
    let range = salary_range(draft.salary_min, draft.salary_max, &draft.salary_currency);
    job::ActiveModel {
        job_title: Set(draft.job_title),
        company: Set(draft.company),
        company_url: Set(draft.company_url),
        company_email: Set(draft.company_email),
        location: Set(draft.location),
        salary_min: Set(draft.salary_min),
        salary_max: Set(draft.salary_max),
        salary_currency: Set(draft.salary_currency),
        salary_range: Set(range),
        description: Set(draft.description),
        perks: Set(draft.perks),
        interview_process: Set(draft.interview_process),
        how_to_apply: Set(draft.how_to_apply),
        company_icon_id: Set(draft.company_icon_id),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with(approved: bool, tier: AdTier) -> job::Model {
        let now = Utc::now();
        job::Model {
            id: 1,
            external_id: "ext".into(),
            job_title: "Rust Engineer".into(),
            company: "Acme".into(),
            company_url: None,
            company_email: "hr@acme.example".into(),
            location: "Remote".into(),
            salary_min: 1,
            salary_max: 2,
            salary_currency: "$".into(),
            salary_range: "$1 - $2".into(),
            description: "desc".into(),
            perks: None,
            interview_process: None,
            how_to_apply: "hr@acme.example".into(),
            slug: "rust-engineer-acme-1".into(),
            ad_type: tier,
            company_icon_id: None,
            created_at: now,
            approved_at: approved.then_some(now),
        }
    }

    #[test]
    fn derives_state_from_approval_tier_and_open_session() {
        assert_eq!(
            JobState::derive(&job_with(false, AdTier::Basic), false),
            JobState::PendingApproval
        );
        assert_eq!(
            JobState::derive(&job_with(false, AdTier::Basic), true),
            JobState::PaymentPending
        );
        assert_eq!(
            JobState::derive(&job_with(true, AdTier::SponsoredBackground), false),
            JobState::Approved
        );
        assert_eq!(
            JobState::derive(&job_with(true, AdTier::SponsoredPinnedFor7Days), true),
            JobState::ApprovedPromoted
        );
    }

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn demotion_report_total() {
        let report = DemotionReport {
            pinned_30_days: 2,
            pinned_7_days: 3,
        };
        assert_eq!(report.total(), 5);
    }
}
