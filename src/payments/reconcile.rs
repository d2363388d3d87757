//! # Payment Reconciliation
//!
//! Applies a gateway-confirmed checkout to its posting exactly once.
//!
//! The completion flag on the purchase event is flipped with a conditional
//! update before the tier is touched, so a replayed or concurrent delivery of
//! the same confirmation can never apply the tier twice. A delivery for an
//! already completed session re-runs the tier policy, which is itself a
//! compare-and-swap, so a confirmation interrupted between the two steps is
//! finished by the gateway's retry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

use crate::error::{BoardError, BoardResult};
use crate::lifecycle::{AdLifecycle, TierOutcome};
use crate::mail::{Email, Mailer};
use crate::models::{AdTier, job, purchase_event};
use crate::repositories::{JobRepository, PurchaseEventRepository};

/// Result of confirming a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Applied {
        job_id: i32,
        tier: AdTier,
        outcome: TierOutcome,
    },
    /// The session was completed by an earlier delivery and its tier is
    /// already in place; nothing changed.
    AlreadyProcessed,
}

/// Matches gateway confirmations to pending purchase events.
#[derive(Clone)]
pub struct PaymentReconciler {
    jobs: JobRepository,
    purchases: PurchaseEventRepository,
    lifecycle: AdLifecycle,
    mailer: Arc<dyn Mailer>,
    email_from: String,
    site_url: String,
}

impl PaymentReconciler {
    pub fn new(
        db: Arc<DatabaseConnection>,
        lifecycle: AdLifecycle,
        mailer: Arc<dyn Mailer>,
        email_from: String,
        site_url: String,
    ) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            purchases: PurchaseEventRepository::new(db),
            lifecycle,
            mailer,
            email_from,
            site_url,
        }
    }

    #[instrument(skip(self))]
    pub async fn confirm(&self, session_id: &str) -> BoardResult<ConfirmOutcome> {
        let event = self
            .purchases
            .find_by_session_id(session_id)
            .await?
            .ok_or(BoardError::not_found("purchase event"))?;

        if event.is_completed() {
            return self.resume_completed(&event, Utc::now()).await;
        }

        let rows = self.purchases.mark_completed(session_id, Utc::now()).await?;
        if rows != 1 {
            counter!("jobboard_payment_confirmations_total", "result" => "integrity_error")
                .increment(1);
            return Err(BoardError::Integrity(format!(
                "completing session {} affected {} rows, expected 1",
                session_id, rows
            )));
        }

        let job = self.job_for_session(session_id).await?;
        let outcome = self.lifecycle.apply_confirmed_tier(&job, event.ad_type).await?;
        counter!("jobboard_payment_confirmations_total", "result" => "applied").increment(1);
        info!(
            job_id = job.id,
            tier = event.ad_type.as_str(),
            ?outcome,
            "Applied confirmed payment"
        );

        let receipt = Email::new(
            self.email_from.clone(),
            event.email.clone(),
            format!("Payment received for {} at {}", job.job_title, job.company),
            format!(
                "Thanks for your purchase: {} ({} {:.2}).\n\nYour job ad: {}/jobs/{}",
                event.description,
                event.currency,
                event.amount as f64 / 100.0,
                self.site_url.trim_end_matches('/'),
                job.slug
            ),
        );
        if let Err(e) = self.mailer.send(receipt).await {
            warn!(job_id = job.id, error = %e, "Failed to send payment receipt");
        }

        Ok(ConfirmOutcome::Applied {
            job_id: job.id,
            tier: event.ad_type,
            outcome,
        })
    }

    /// Finish the tier half of a completed session. No receipt is sent here:
    /// the submitter was either mailed by the first delivery or the tier was
    /// never applied and this is the retry that applies it.
    async fn resume_completed(
        &self,
        event: &purchase_event::Model,
        now: DateTime<Utc>,
    ) -> BoardResult<ConfirmOutcome> {
        if pin_lapsed(event, now) {
            info!("Checkout session already processed; pin period has lapsed");
            counter!("jobboard_payment_confirmations_total", "result" => "duplicate")
                .increment(1);
            return Ok(ConfirmOutcome::AlreadyProcessed);
        }

        let job = self.job_for_session(&event.session_id).await?;
        let outcome = self.lifecycle.apply_confirmed_tier(&job, event.ad_type).await?;
        if outcome == TierOutcome::Unchanged {
            info!("Checkout session already processed");
            counter!("jobboard_payment_confirmations_total", "result" => "duplicate")
                .increment(1);
            return Ok(ConfirmOutcome::AlreadyProcessed);
        }

        counter!("jobboard_payment_confirmations_total", "result" => "recovered").increment(1);
        warn!(
            job_id = job.id,
            tier = event.ad_type.as_str(),
            ?outcome,
            "Applied tier for a session completed by an interrupted delivery"
        );
        Ok(ConfirmOutcome::Applied {
            job_id: job.id,
            tier: event.ad_type,
            outcome,
        })
    }

    /// The posting a completed session paid for. A completed session without
    /// a posting is a broken reference, not an unknown session.
    async fn job_for_session(&self, session_id: &str) -> BoardResult<job::Model> {
        self.jobs.find_by_session_id(session_id).await?.ok_or_else(|| {
            counter!("jobboard_payment_confirmations_total", "result" => "integrity_error")
                .increment(1);
            BoardError::Integrity(format!("completed session {} has no job posting", session_id))
        })
    }
}

/// A pinned purchase whose pin period ran out since completion must not be
/// re-applied on top of the demotion that ended it.
fn pin_lapsed(event: &purchase_event::Model, now: DateTime<Utc>) -> bool {
    match (event.ad_type.pin_duration(), event.completed_at) {
        (Some(duration), Some(completed_at)) => completed_at + duration <= now,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(tier: AdTier, completed_at: Option<DateTime<Utc>>) -> purchase_event::Model {
        purchase_event::Model {
            id: 1,
            session_id: "cs_1".to_string(),
            amount: 19900,
            currency: "USD".to_string(),
            description: tier.description().to_string(),
            ad_type: tier,
            email: "billing@acme.example".to_string(),
            job_id: 1,
            created_at: Utc::now(),
            completed_at,
        }
    }

    #[test]
    fn pin_lapses_after_its_duration() {
        let now = Utc::now();
        let old = Some(now - Duration::days(31));
        let recent = Some(now - Duration::days(1));

        assert!(pin_lapsed(&event(AdTier::SponsoredPinnedFor30Days, old), now));
        assert!(!pin_lapsed(&event(AdTier::SponsoredPinnedFor30Days, recent), now));
        let week_ago = Some(now - Duration::days(7));
        assert!(pin_lapsed(&event(AdTier::SponsoredPinnedFor7Days, week_ago), now));
        assert!(!pin_lapsed(&event(AdTier::SponsoredBackground, old), now));
        assert!(!pin_lapsed(&event(AdTier::SponsoredPinnedFor30Days, None), now));
    }
}
