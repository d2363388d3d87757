//! Payment confirmation is applied exactly once.

use std::sync::Arc;

use anyhow::Result;
use jobboard::error::BoardError;
use jobboard::lifecycle::TierOutcome;
use jobboard::models::{AdTier, CurrencyCode};
use jobboard::payments::{ConfirmOutcome, PaymentReconciler};
use jobboard::repositories::PurchaseEventRepository;
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection};

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{
    RecordingMailer, create_approved_job, create_draft, draft, lifecycle, reload_job,
    setup_test_db_arc,
};

fn reconciler(db: &Arc<DatabaseConnection>, mailer: Arc<RecordingMailer>) -> PaymentReconciler {
    PaymentReconciler::new(
        db.clone(),
        lifecycle(db),
        mailer,
        "team@board.example".to_string(),
        "https://board.example".to_string(),
    )
}

#[tokio::test]
async fn confirmation_approves_and_sends_receipt() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let mailer = Arc::new(RecordingMailer::default());
    let saved = create_draft(&db, draft("Go Engineer", "Acme", "Berlin", "Go.")).await?;
    lifecycle(&db)
        .initiate_payment(
            saved.job.id,
            "cs_paid",
            AdTier::SponsoredPinnedFor30Days,
            CurrencyCode::Eur,
            "billing@acme.example",
        )
        .await?;

    let outcome = reconciler(&db, mailer.clone()).confirm("cs_paid").await?;

    assert_eq!(
        outcome,
        ConfirmOutcome::Applied {
            job_id: saved.job.id,
            tier: AdTier::SponsoredPinnedFor30Days,
            outcome: TierOutcome::Approved,
        }
    );
    let job = reload_job(&db, saved.job.id).await?;
    assert!(job.approved_at.is_some());
    assert_eq!(job.ad_type, AdTier::SponsoredPinnedFor30Days);

    let event = PurchaseEventRepository::new(db.clone())
        .find_by_session_id("cs_paid")
        .await?
        .expect("purchase event exists");
    assert!(event.completed_at.is_some());

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "billing@acme.example");
    assert!(sent[0].body.contains("EUR 199.00"));
    assert!(sent[0].body.contains(&job.slug));
    Ok(())
}

#[tokio::test]
async fn replayed_confirmation_changes_nothing() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let mailer = Arc::new(RecordingMailer::default());
    let saved = create_draft(&db, draft("Go Engineer", "Acme", "Berlin", "Go.")).await?;
    lifecycle(&db)
        .initiate_payment(
            saved.job.id,
            "cs_once",
            AdTier::SponsoredPinnedFor7Days,
            CurrencyCode::Usd,
            "billing@acme.example",
        )
        .await?;
    let reconciler = reconciler(&db, mailer.clone());

    reconciler.confirm("cs_once").await?;
    let approved_at = reload_job(&db, saved.job.id).await?.approved_at;

    assert_eq!(
        reconciler.confirm("cs_once").await?,
        ConfirmOutcome::AlreadyProcessed
    );
    let job = reload_job(&db, saved.job.id).await?;
    assert_eq!(job.approved_at, approved_at);
    assert_eq!(mailer.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn confirmation_upgrades_live_posting() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let job = create_approved_job(
        &db,
        draft("Go Engineer", "Acme", "Berlin", "Go."),
        AdTier::WithCompanyLogo,
    )
    .await?;
    lifecycle(&db)
        .initiate_payment(
            job.id,
            "cs_upgrade",
            AdTier::SponsoredBackground,
            CurrencyCode::Usd,
            "billing@acme.example",
        )
        .await?;

    let outcome = reconciler(&db, Arc::new(RecordingMailer::default()))
        .confirm("cs_upgrade")
        .await?;

    assert!(matches!(
        outcome,
        ConfirmOutcome::Applied {
            outcome: TierOutcome::Upgraded,
            ..
        }
    ));
    let reloaded = reload_job(&db, job.id).await?;
    assert_eq!(reloaded.ad_type, AdTier::SponsoredBackground);
    assert_eq!(reloaded.approved_at, job.approved_at);
    Ok(())
}

#[tokio::test]
async fn unknown_session_is_not_found() -> Result<()> {
    let db = setup_test_db_arc().await?;

    let err = reconciler(&db, Arc::new(RecordingMailer::default()))
        .confirm("cs_missing")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn receipt_failure_does_not_undo_confirmation() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let mailer = Arc::new(RecordingMailer::default());
    mailer.fail_deliveries(true);
    let saved = create_draft(&db, draft("Go Engineer", "Acme", "Berlin", "Go.")).await?;
    lifecycle(&db)
        .initiate_payment(
            saved.job.id,
            "cs_nomail",
            AdTier::WithCompanyLogo,
            CurrencyCode::Usd,
            "billing@acme.example",
        )
        .await?;

    let outcome = reconciler(&db, mailer.clone()).confirm("cs_nomail").await?;

    assert!(matches!(outcome, ConfirmOutcome::Applied { .. }));
    assert!(reload_job(&db, saved.job.id).await?.approved_at.is_some());
    assert!(mailer.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn interrupted_confirmation_is_finished_by_retry() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let mailer = Arc::new(RecordingMailer::default());
    let saved = create_draft(&db, draft("Go Engineer", "Acme", "Berlin", "Go.")).await?;
    lifecycle(&db)
        .initiate_payment(
            saved.job.id,
            "cs_crash",
            AdTier::SponsoredPinnedFor30Days,
            CurrencyCode::Usd,
            "billing@acme.example",
        )
        .await?;
    // Completion committed, tier never applied.
    let rows = PurchaseEventRepository::new(db.clone())
        .mark_completed("cs_crash", Utc::now())
        .await?;
    assert_eq!(rows, 1);

    let outcome = reconciler(&db, mailer.clone()).confirm("cs_crash").await?;

    assert_eq!(
        outcome,
        ConfirmOutcome::Applied {
            job_id: saved.job.id,
            tier: AdTier::SponsoredPinnedFor30Days,
            outcome: TierOutcome::Approved,
        }
    );
    let job = reload_job(&db, saved.job.id).await?;
    assert!(job.approved_at.is_some());
    assert_eq!(job.ad_type, AdTier::SponsoredPinnedFor30Days);
    assert!(mailer.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn replayed_upgrade_of_approved_basic_job_keeps_pinned_tier() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let mailer = Arc::new(RecordingMailer::default());
    let job = create_approved_job(
        &db,
        draft("Go Engineer", "Acme", "Berlin", "Go."),
        AdTier::Basic,
    )
    .await?;
    lifecycle(&db)
        .initiate_payment(
            job.id,
            "cs_pin",
            AdTier::SponsoredPinnedFor30Days,
            CurrencyCode::Usd,
            "billing@acme.example",
        )
        .await?;
    let reconciler = reconciler(&db, mailer.clone());

    let first = reconciler.confirm("cs_pin").await?;
    assert!(matches!(
        first,
        ConfirmOutcome::Applied {
            outcome: TierOutcome::Upgraded,
            ..
        }
    ));
    let second = reconciler.confirm("cs_pin").await?;

    assert_eq!(second, ConfirmOutcome::AlreadyProcessed);
    let reloaded = reload_job(&db, job.id).await?;
    assert_eq!(reloaded.ad_type, AdTier::SponsoredPinnedFor30Days);
    assert_eq!(reloaded.approved_at, job.approved_at);
    assert_eq!(mailer.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn completed_session_without_job_is_an_integrity_error() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let saved = create_draft(&db, draft("Go Engineer", "Acme", "Berlin", "Go.")).await?;
    lifecycle(&db)
        .initiate_payment(
            saved.job.id,
            "cs_orphan",
            AdTier::WithCompanyLogo,
            CurrencyCode::Usd,
            "billing@acme.example",
        )
        .await?;
    db.execute_unprepared("PRAGMA foreign_keys = OFF").await?;
    db.execute_unprepared(&format!("DELETE FROM job WHERE id = {}", saved.job.id))
        .await?;

    let err = reconciler(&db, Arc::new(RecordingMailer::default()))
        .confirm("cs_orphan")
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::Integrity(_)));
    Ok(())
}
