//! # Payments
//!
//! The payment gateway seam, its Stripe implementation and the reconciler
//! that turns confirmed checkouts into tier changes.

pub mod reconcile;
pub mod signature;
pub mod stripe;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::BoardResult;
use crate::models::{AdTier, CurrencyCode};

pub use reconcile::{ConfirmOutcome, PaymentReconciler};
pub use signature::{VerificationError, VerificationResult};
pub use stripe::StripeGateway;

/// Everything the gateway needs to open a hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub tier: AdTier,
    /// Minor currency units.
    pub amount: i64,
    pub currency: CurrencyCode,
    pub email: String,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session opened at the gateway.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutSession {
    pub session_id: String,
    /// Hosted payment page, when the gateway provides one.
    pub url: Option<String>,
}

/// A completed checkout reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub event_id: String,
    pub session_id: String,
}

/// A verified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    CheckoutCompleted(PaymentConfirmation),
    /// Any other event type; acknowledged without action.
    Ignored { event_type: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutRequest)
    -> BoardResult<CheckoutSession>;

    /// Authenticate a raw webhook body against its signature header and
    /// decode it.
    fn verify_and_parse(&self, payload: &[u8], signature: &str)
    -> VerificationResult<GatewayEvent>;
}
