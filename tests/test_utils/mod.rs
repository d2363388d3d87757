//! Test utilities for database and API testing.
//!
//! In-memory SQLite databases with migrations applied, job fixtures, and
//! recording collaborators for mail and payments.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobboard::{
    config::AppConfig,
    geo::FixedCurrency,
    lifecycle::{AdLifecycle, JobDraft, SavedDraft},
    mail::{Email, MailError, Mailer},
    models::{AdTier, CurrencyCode, job},
    payments::{
        CheckoutRequest, CheckoutSession, GatewayEvent, PaymentConfirmation, PaymentGateway,
        VerificationError, VerificationResult, signature,
    },
    repositories::JobRepository,
    server::AppState,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection};
use serde_json::json;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database and returns it behind an Arc.
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Configuration with admin and webhook secrets set.
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        admin_tokens: vec![ADMIN_TOKEN.to_string()],
        site_url: "https://board.example".to_string(),
        stripe_secret_key: Some("sk_test_123".to_string()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        jobs_per_page: 10,
        ..Default::default()
    }
}

pub fn draft(title: &str, company: &str, location: &str, description: &str) -> JobDraft {
    JobDraft {
        job_title: title.to_string(),
        company: company.to_string(),
        company_url: Some(format!("https://{}.example", company.to_lowercase())),
        company_email: format!("hiring@{}.example", company.to_lowercase()),
        location: location.to_string(),
        salary_min: "50000".to_string(),
        salary_max: "80000".to_string(),
        salary_currency: "$".to_string(),
        description: description.to_string(),
        perks: None,
        interview_process: None,
        how_to_apply: format!("https://{}.example/careers", company.to_lowercase()),
        company_icon_id: None,
    }
}

pub fn lifecycle(db: &Arc<DatabaseConnection>) -> AdLifecycle {
    AdLifecycle::new(db.clone(), test_config().pricing)
}

/// Store a draft and approve it on `tier`.
pub async fn create_approved_job(
    db: &Arc<DatabaseConnection>,
    draft: JobDraft,
    tier: AdTier,
) -> Result<job::Model> {
    let saved = lifecycle(db).save_draft(draft).await?;
    JobRepository::new(db.clone())
        .approve_with_tier(saved.job.id, tier, Utc::now())
        .await?;
    reload_job(db, saved.job.id).await
}

pub async fn create_draft(db: &Arc<DatabaseConnection>, draft: JobDraft) -> Result<SavedDraft> {
    Ok(lifecycle(db).save_draft(draft).await?)
}

pub async fn reload_job(db: &Arc<DatabaseConnection>, id: i32) -> Result<job::Model> {
    JobRepository::new(db.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("job {} not found", id))
}

pub async fn set_created_at(
    db: &Arc<DatabaseConnection>,
    id: i32,
    at: DateTime<Utc>,
) -> Result<()> {
    job::ActiveModel {
        id: Set(id),
        created_at: Set(at),
        ..Default::default()
    }
    .update(db.as_ref())
    .await?;
    Ok(())
}

pub async fn set_approved_at(
    db: &Arc<DatabaseConnection>,
    id: i32,
    at: DateTime<Utc>,
) -> Result<()> {
    job::ActiveModel {
        id: Set(id),
        approved_at: Set(Some(at)),
        ..Default::default()
    }
    .update(db.as_ref())
    .await?;
    Ok(())
}

/// Mailer that keeps every message and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Delivery("mail server unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(email);
        Ok(())
    }
}

/// Gateway that hands out sequential session ids and verifies webhooks with
/// the real signature scheme.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl FakeGateway {
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> jobboard::error::BoardResult<CheckoutSession> {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        requests.push(request.clone());
        let session_id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSession {
            url: Some(format!("https://pay.example/{}", session_id)),
            session_id,
        })
    }

    fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> VerificationResult<GatewayEvent> {
        signature::verify_signature(payload, signature_header, WEBHOOK_SECRET, 300)?;
        let event: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;
        let event_type = event["type"].as_str().unwrap_or_default().to_string();
        if event_type != "checkout.session.completed" {
            return Ok(GatewayEvent::Ignored { event_type });
        }
        Ok(GatewayEvent::CheckoutCompleted(PaymentConfirmation {
            event_id: event["id"].as_str().unwrap_or_default().to_string(),
            session_id: event["data"]["object"]["id"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        }))
    }
}

/// Application state around the recording collaborators.
pub fn test_state(
    db: Arc<DatabaseConnection>,
    mailer: Arc<RecordingMailer>,
    gateway: Arc<FakeGateway>,
) -> AppState {
    AppState::new(
        Arc::new(test_config()),
        db,
        gateway,
        mailer,
        Arc::new(FixedCurrency(CurrencyCode::Eur)),
    )
}

pub fn completed_event(session_id: &str) -> String {
    json!({
        "id": format!("evt_{}", session_id),
        "type": "checkout.session.completed",
        "data": {"object": {"id": session_id}}
    })
    .to_string()
}

/// `Stripe-Signature` header for `body` signed now with the test secret.
pub fn signature_header(body: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    signature::sign(body.as_bytes(), WEBHOOK_SECRET, now).expect("signing succeeds")
}
