//! # Quick Apply
//!
//! Candidates apply to postings whose how-to-apply is an email address by
//! uploading a CV. The application is held behind a token mailed to the
//! candidate; confirming it forwards the CV to the employer. Unconfirmed
//! tokens expire after [`APPLY_TOKEN_TTL_HOURS`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

use crate::error::{BoardError, BoardResult};
use crate::lifecycle::{generate_token, is_email};
use crate::mail::{Attachment, Email, Mailer};
use crate::models::job;
use crate::repositories::{ApplyTokenRepository, JobRepository};

pub use crate::repositories::apply_token::APPLY_TOKEN_TTL_HOURS;

/// Largest CV accepted, in bytes.
pub const MAX_CV_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct QuickApply {
    jobs: JobRepository,
    tokens: ApplyTokenRepository,
    mailer: Arc<dyn Mailer>,
    email_from: String,
    site_url: String,
}

impl QuickApply {
    pub fn new(
        db: Arc<DatabaseConnection>,
        mailer: Arc<dyn Mailer>,
        email_from: String,
        site_url: String,
    ) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            tokens: ApplyTokenRepository::new(db),
            mailer,
            email_from,
            site_url,
        }
    }

    /// Hold an application and mail the candidate a confirmation link.
    /// Returns the apply token.
    #[instrument(skip(self, email, cv), fields(cv_bytes = cv.len()))]
    pub async fn apply(&self, external_id: &str, email: &str, cv: Vec<u8>) -> BoardResult<String> {
        let email = email.trim();
        if !is_email(email) {
            return Err(BoardError::invalid_field(
                "email",
                "must be a valid email address",
            ));
        }
        if cv.is_empty() {
            return Err(BoardError::invalid_field("cv", "is required"));
        }
        if cv.len() > MAX_CV_BYTES {
            return Err(BoardError::invalid_field(
                "cv",
                format!("must be at most {} bytes", MAX_CV_BYTES),
            ));
        }

        let job = self
            .jobs
            .find_by_external_id(external_id)
            .await?
            .filter(job::Model::is_approved)
            .ok_or(BoardError::not_found("job"))?;
        if !job.is_quick_apply() {
            return Err(BoardError::validation(
                "This job does not accept applications through the board",
            ));
        }

        let token = generate_token();
        self.tokens
            .create(&token, job.id, email, cv, Utc::now())
            .await?;

        let confirmation = Email::new(
            self.email_from.clone(),
            email,
            format!("Confirm your application for {} at {}", job.job_title, job.company),
            format!(
                "Please confirm your application within {} hours: {}/apply/confirm/{}",
                APPLY_TOKEN_TTL_HOURS,
                self.site_url.trim_end_matches('/'),
                token
            ),
        );
        self.mailer.send(confirmation).await.map_err(|e| {
            warn!(job_id = job.id, error = %e, "Failed to send application confirmation");
            BoardError::upstream("mailer", e.to_string())
        })?;

        counter!("jobboard_applications_total", "stage" => "submitted").increment(1);
        info!(job_id = job.id, "Application awaiting confirmation");
        Ok(token)
    }

    /// Confirm a held application and forward the CV to the employer. The
    /// token is only spent once the CV has been handed to the mailer, so a
    /// failed delivery can be retried with the same link.
    #[instrument(skip_all)]
    pub async fn confirm(&self, token: &str) -> BoardResult<job::Model> {
        let (application, job) = self
            .tokens
            .find_pending_with_job(token, Utc::now())
            .await?
            .ok_or(BoardError::not_found("apply token"))?;

        let forward = Email::new(
            self.email_from.clone(),
            job.how_to_apply.trim(),
            format!("New application for {}", job.job_title),
            format!(
                "{} applied for {} through the job board. Their CV is attached; reply to this candidate at {}.",
                application.email, job.job_title, application.email
            ),
        )
        .with_attachment(Attachment {
            filename: "cv.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: application.cv,
        });
        self.mailer.send(forward).await.map_err(|e| {
            warn!(job_id = job.id, error = %e, "Failed to forward application");
            BoardError::upstream("mailer", e.to_string())
        })?;

        if self.tokens.confirm(token, Utc::now()).await? != 1 {
            // A concurrent confirmation of the same token forwarded it too.
            warn!(job_id = job.id, "Apply token was confirmed concurrently");
        }

        counter!("jobboard_applications_total", "stage" => "confirmed").increment(1);
        info!(job_id = job.id, "Application forwarded");
        Ok(job)
    }

    /// Delete tokens that expired or were confirmed.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> BoardResult<u64> {
        Ok(self.tokens.delete_expired(now).await?)
    }
}
