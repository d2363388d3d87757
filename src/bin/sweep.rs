//! Runs one demotion and apply-token sweep and prints what changed.
//!
//! Suitable for cron when the API server's built-in sweeper is not running.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use jobboard::{
    apply::QuickApply, config::ConfigLoader, db, lifecycle::AdLifecycle, mail::LogMailer,
    sweeper::Sweeper, telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "sweep", about = "Demote expired pinned jobs and purge stale apply tokens")]
struct Args {
    /// Sweep as of this RFC 3339 instant instead of now
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    /// Apply pending migrations before sweeping
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    if args.migrate {
        db::migrate(&db).await?;
    }

    let db = Arc::new(db);
    let config = Arc::new(config);
    let lifecycle = AdLifecycle::new(db.clone(), config.pricing.clone());
    let quick_apply = QuickApply::new(
        db,
        Arc::new(LogMailer::default()),
        config.email_from.clone(),
        config.site_url.clone(),
    );

    let report = Sweeper::new(config, lifecycle, quick_apply)
        .sweep(args.at.unwrap_or_else(Utc::now))
        .await
        .context("running sweep")?;

    println!(
        "{}",
        serde_json::to_string(&report).context("serializing sweep report")?
    );
    Ok(())
}
