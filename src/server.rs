//! # Server Configuration
//!
//! Application state, router assembly and the HTTP server loop for the job
//! board API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::apply::QuickApply;
use crate::auth::admin_auth_middleware;
use crate::config::AppConfig;
use crate::engagement::EngagementTracker;
use crate::geo::{CurrencyLookup, FixedCurrency, HttpCurrencyLookup};
use crate::handlers::{self, admin, apply, engagement, jobs, payments};
use crate::lifecycle::AdLifecycle;
use crate::mail::{LogMailer, Mailer};
use crate::payments::{PaymentGateway, PaymentReconciler, StripeGateway};
use crate::repositories::{JobRepository, PurchaseEventRepository};
use crate::search::SearchEngine;
use crate::sweeper::Sweeper;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub jobs: JobRepository,
    pub purchases: PurchaseEventRepository,
    pub search: SearchEngine,
    pub lifecycle: AdLifecycle,
    pub reconciler: PaymentReconciler,
    pub engagement: EngagementTracker,
    pub quick_apply: QuickApply,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub currency: Arc<dyn CurrencyLookup>,
}

impl AppState {
    /// Wire the core components around the given collaborators.
    pub fn new(
        config: Arc<AppConfig>,
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        currency: Arc<dyn CurrencyLookup>,
    ) -> Self {
        let lifecycle = AdLifecycle::new(db.clone(), config.pricing.clone());
        let reconciler = PaymentReconciler::new(
            db.clone(),
            lifecycle.clone(),
            mailer.clone(),
            config.email_from.clone(),
            config.site_url.clone(),
        );
        let quick_apply = QuickApply::new(
            db.clone(),
            mailer.clone(),
            config.email_from.clone(),
            config.site_url.clone(),
        );

        Self {
            jobs: JobRepository::new(db.clone()),
            purchases: PurchaseEventRepository::new(db.clone()),
            search: SearchEngine::new(db.clone()),
            engagement: EngagementTracker::new(db.clone()),
            lifecycle,
            reconciler,
            quick_apply,
            gateway,
            mailer,
            currency,
            config,
            db,
        }
    }

    /// Production wiring: Stripe, log-backed mail, and IP geolocation when a
    /// lookup service is configured.
    pub fn from_config(config: Arc<AppConfig>, db: Arc<DatabaseConnection>) -> Result<Self> {
        let gateway: Arc<dyn PaymentGateway> = Arc::new(
            StripeGateway::new(&config).context("Failed to build payment gateway client")?,
        );
        let currency: Arc<dyn CurrencyLookup> = match config.geolocation_api_base.as_deref() {
            Some(base) => Arc::new(
                HttpCurrencyLookup::new(base).context("Failed to build geolocation client")?,
            ),
            None => Arc::new(FixedCurrency::default()),
        };
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::default());

        Ok(Self::new(config, db, gateway, mailer, currency))
    }

    /// Background sweeper sharing this state's lifecycle and quick-apply services.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.config.clone(),
            self.lifecycle.clone(),
            self.quick_apply.clone(),
        )
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/jobs/pending", get(admin::list_pending))
        .route("/admin/jobs/{id}/approve", post(admin::approve_job))
        .route("/admin/jobs/{id}/disapprove", post(admin::disapprove_job))
        .route("/admin/jobs/{id}", delete(admin::delete_job))
        .route_layer(middleware::from_fn_with_state(
            state.config.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/jobs", get(jobs::search_jobs).post(jobs::create_job))
        .route("/jobs/{slug}", get(jobs::get_job))
        .route("/edit/{token}", put(jobs::update_job))
        .route("/manage/{token}", get(jobs::manage_job))
        .route("/clickout", get(engagement::clickout))
        .route("/checkout", post(payments::create_checkout))
        .route(
            "/webhooks/payment",
            post(payments::payment_webhook)
                .layer(DefaultBodyLimit::max(payments::MAX_WEBHOOK_BODY_BYTES)),
        )
        .route(
            "/apply/{external_id}",
            post(apply::apply).layer(DefaultBodyLimit::max(APPLY_BODY_LIMIT)),
        )
        .route("/apply/confirm/{token}", post(apply::confirm_application))
        .merge(admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Base64 inflates the CV by a third; leave headroom for the JSON envelope.
const APPLY_BODY_LIMIT: usize = crate::apply::MAX_CV_BYTES / 3 * 4 + 64 * 1024;

/// Starts the server and the background sweeper, and runs until Ctrl-C.
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> Result<()> {
    let config = Arc::new(config);
    let state = AppState::from_config(config.clone(), Arc::new(db))?;

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(state.sweeper().run(shutdown.clone()));

    let app = create_app(state);

    let addr = config.bind_addr().context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, profile = %config.profile, "Server listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            signal.cancel();
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "Sweeper task failed");
    }

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::jobs::search_jobs,
        crate::handlers::jobs::get_job,
        crate::handlers::jobs::create_job,
        crate::handlers::jobs::update_job,
        crate::handlers::jobs::manage_job,
        crate::handlers::engagement::clickout,
        crate::handlers::payments::create_checkout,
        crate::handlers::payments::payment_webhook,
        crate::handlers::apply::apply,
        crate::handlers::apply::confirm_application,
        crate::handlers::admin::list_pending,
        crate::handlers::admin::approve_job,
        crate::handlers::admin::disapprove_job,
        crate::handlers::admin::delete_job,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::AdTier,
            crate::models::CurrencyCode,
            crate::error::ApiError,
            crate::lifecycle::JobDraft,
            crate::lifecycle::JobState,
            crate::handlers::types::JobInfo,
            crate::handlers::types::PurchaseInfo,
            crate::handlers::types::DailyStatsInfo,
            crate::handlers::types::StatusResponse,
            crate::handlers::jobs::SearchResponse,
            crate::handlers::jobs::CreateJobResponse,
            crate::handlers::jobs::ManageResponse,
            crate::handlers::jobs::TierPrice,
            crate::handlers::payments::CheckoutBody,
            crate::payments::CheckoutSession,
            crate::handlers::apply::ApplyBody,
            crate::handlers::apply::ApplyResponse,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Job Board API",
        description = "Search, post, promote and moderate job listings",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
