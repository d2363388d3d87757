//! # Payment Handlers
//!
//! Checkout initiation for advertisers and the gateway's webhook callback.

use axum::{
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, BoardError};
use crate::geo;
use crate::handlers::types::StatusResponse;
use crate::lifecycle::is_email;
use crate::models::{AdTier, CurrencyCode};
use crate::payments::{
    CheckoutRequest, CheckoutSession, ConfirmOutcome, GatewayEvent, VerificationError,
    signature::SIGNATURE_HEADER,
};
use crate::server::AppState;

/// Largest webhook body accepted from the gateway.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

/// Checkout request for promoting a posting
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutBody {
    /// Edit token of the posting being promoted
    pub edit_token: String,
    pub tier: AdTier,
    /// ISO currency code; detected from the caller's address when absent
    #[schema(example = "EUR")]
    pub currency: Option<String>,
    /// Receipt address; defaults to the posting's company email
    pub email: Option<String>,
}

/// Open a checkout session for a tier upgrade
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutBody,
    responses(
        (status = 201, description = "Checkout session opened", body = CheckoutSession),
        (status = 400, description = "Tier cannot be purchased", body = ApiError),
        (status = 404, description = "Unknown edit token", body = ApiError),
        (status = 502, description = "Payment gateway failed", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CheckoutBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutSession>), ApiError> {
    let Json(body) = payload?;

    let job = state
        .jobs
        .find_by_edit_token(&body.edit_token)
        .await?
        .ok_or(BoardError::not_found("job"))?;
    let amount = state.lifecycle.quote(body.tier)?;

    let currency = match body.currency.as_deref() {
        Some(code) => CurrencyCode::parse_or_default(code),
        None => geo::currency_for_request(state.currency.as_ref(), &headers).await,
    };
    let email = match body.email {
        Some(email) if is_email(email.trim()) => email.trim().to_string(),
        Some(_) => {
            return Err(BoardError::invalid_field("email", "must be a valid email address").into());
        }
        None => job.company_email.clone(),
    };

    let return_base = format!(
        "{}/edit/{}",
        state.config.site_url.trim_end_matches('/'),
        body.edit_token
    );
    let session = state
        .gateway
        .create_checkout_session(&CheckoutRequest {
            tier: body.tier,
            amount,
            currency,
            email: email.clone(),
            description: body.tier.description().to_string(),
            success_url: format!("{}?payment=1", return_base),
            cancel_url: format!("{}?payment=0", return_base),
        })
        .await?;

    state
        .lifecycle
        .initiate_payment(job.id, &session.session_id, body.tier, currency, &email)
        .await?;

    info!(job_id = job.id, tier = body.tier.as_str(), "Checkout session opened");
    Ok((StatusCode::CREATED, Json(session)))
}

/// Payment gateway webhook
///
/// Verified `checkout.session.completed` events are reconciled exactly once.
/// Replays and unknown sessions are acknowledged so the gateway stops
/// retrying; other event types are ignored.
#[utoipa::path(
    post,
    path = "/webhooks/payment",
    request_body(content = String, description = "Raw gateway event", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "Gateway signature header")
    ),
    responses(
        (status = 200, description = "Event acknowledged", body = StatusResponse),
        (status = 400, description = "Signature verification failed", body = ApiError),
        (status = 413, description = "Body too large"),
        (status = 500, description = "Confirmation could not be applied", body = ApiError),
        (status = 503, description = "Webhook secret is not configured", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            verification_error(VerificationError::MissingSignature {
                header: SIGNATURE_HEADER.to_string(),
            })
        })?;

    let event = state
        .gateway
        .verify_and_parse(&body, signature)
        .map_err(verification_error)?;

    let confirmation = match event {
        GatewayEvent::CheckoutCompleted(confirmation) => confirmation,
        GatewayEvent::Ignored { event_type } => {
            debug!(event_type = %event_type, "Ignoring gateway event");
            return Ok(Json(StatusResponse::new("ignored")));
        }
    };

    match state.reconciler.confirm(&confirmation.session_id).await {
        Ok(ConfirmOutcome::Applied { job_id, outcome, .. }) => {
            info!(
                event_id = %confirmation.event_id,
                job_id,
                outcome = ?outcome,
                "Payment confirmed"
            );
            Ok(Json(StatusResponse::new("applied")))
        }
        Ok(ConfirmOutcome::AlreadyProcessed) => {
            info!(event_id = %confirmation.event_id, "Payment already confirmed");
            Ok(Json(StatusResponse::new("already_processed")))
        }
        Err(e) if e.is_not_found() => {
            warn!(
                event_id = %confirmation.event_id,
                session_id = %confirmation.session_id,
                error = %e,
                "Confirmation for unknown checkout session"
            );
            Ok(Json(StatusResponse::new("unknown_session")))
        }
        Err(e) => {
            error!(event_id = %confirmation.event_id, error = %e, "Failed to apply payment");
            Err(e.into())
        }
    }
}

fn verification_error(error: VerificationError) -> ApiError {
    warn!(error = %error, "Rejected payment webhook");
    let code = if error.status_code() == StatusCode::SERVICE_UNAVAILABLE {
        "SERVICE_UNAVAILABLE"
    } else {
        "INVALID_SIGNATURE"
    };
    ApiError::new(error.status_code(), code, error.to_string())
}
