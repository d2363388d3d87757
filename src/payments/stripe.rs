//! Stripe Checkout gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::signature::{VerificationError, VerificationResult, verify_signature};
use super::{CheckoutRequest, CheckoutSession, GatewayEvent, PaymentConfirmation, PaymentGateway};
use crate::config::AppConfig;
use crate::error::{BoardError, BoardResult};

const SERVICE: &str = "payment gateway";
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Stripe implementation of [`PaymentGateway`].
pub struct StripeGateway {
    http_client: Client,
    /// API base endpoint (overridable for tests)
    api_base: String,
    secret_key: Option<String>,
    webhook_secret: Option<String>,
    tolerance_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
struct WebhookEventData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    id: Option<String>,
}

impl StripeGateway {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http_client,
            api_base: config.stripe_api_base.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone(),
            webhook_secret: config.stripe_webhook_secret.clone(),
            tolerance_seconds: config.stripe_webhook_tolerance_seconds,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> BoardResult<CheckoutSession> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| BoardError::upstream(SERVICE, "secret key is not configured"))?;

        let params = [
            ("mode", "payment".to_string()),
            ("customer_email", request.email.clone()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.code().to_ascii_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.description.clone(),
            ),
            ("metadata[ad_tier]", request.tier.as_str().to_string()),
        ];

        let response = self
            .http_client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| BoardError::upstream(SERVICE, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Checkout session creation rejected");
            return Err(BoardError::upstream(
                SERVICE,
                format!("checkout session creation returned {}", status),
            ));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| BoardError::upstream(SERVICE, format!("malformed response: {}", e)))?;

        info!(session_id = %session.id, tier = request.tier.as_str(), "Opened checkout session");
        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
        })
    }

    fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> VerificationResult<GatewayEvent> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(VerificationError::NotConfigured)?;
        verify_signature(payload, signature, secret, self.tolerance_seconds)?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| VerificationError::MalformedPayload(e.to_string()))?;
        debug!(event_id = %event.id, event_type = %event.event_type, "Verified webhook event");

        if event.event_type != CHECKOUT_COMPLETED {
            return Ok(GatewayEvent::Ignored {
                event_type: event.event_type,
            });
        }

        let session_id = event.data.object.id.ok_or_else(|| {
            VerificationError::MalformedPayload("checkout session id missing".to_string())
        })?;
        Ok(GatewayEvent::CheckoutCompleted(PaymentConfirmation {
            event_id: event.id,
            session_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdTier, CurrencyCode};
    use crate::payments::signature::sign;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(api_base: &str) -> StripeGateway {
        let config = AppConfig {
            stripe_api_base: api_base.to_string(),
            stripe_secret_key: Some("sk_test_123".to_string()),
            stripe_webhook_secret: Some("whsec_123".to_string()),
            ..Default::default()
        };
        StripeGateway::new(&config).unwrap()
    }

    fn checkout_request() -> CheckoutRequest {
        CheckoutRequest {
            tier: AdTier::SponsoredPinnedFor7Days,
            amount: 9900,
            currency: CurrencyCode::Eur,
            email: "owner@acme.example".to_string(),
            description: AdTier::SponsoredPinnedFor7Days.description().to_string(),
            success_url: "https://board.example/edit/tok?payment=1".to_string(),
            cancel_url: "https://board.example/edit/tok?payment=0".to_string(),
        }
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[tokio::test]
    async fn test_create_checkout_session_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_string_contains("unit_amount%5D=9900"))
            .and(body_string_contains("currency%5D=eur"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "url": "https://checkout.example/cs_test_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gateway(&server.uri())
            .create_checkout_session(&checkout_request())
            .await
            .unwrap();
        assert_eq!(session.session_id, "cs_test_1");
        assert_eq!(
            session.url.as_deref(),
            Some("https://checkout.example/cs_test_1")
        );
    }

    #[tokio::test]
    async fn test_create_checkout_session_maps_rejection_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("card declined"))
            .mount(&server)
            .await;

        let err = gateway(&server.uri())
            .create_checkout_session(&checkout_request())
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Upstream { .. }));
    }

    #[test]
    fn test_verify_and_parse_completed_checkout() {
        let body = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_1"}}
        })
        .to_string();
        let signature = sign(body.as_bytes(), "whsec_123", now()).unwrap();

        let event = gateway("http://unused")
            .verify_and_parse(body.as_bytes(), &signature)
            .unwrap();
        assert_eq!(
            event,
            GatewayEvent::CheckoutCompleted(PaymentConfirmation {
                event_id: "evt_1".to_string(),
                session_id: "cs_test_1".to_string(),
            })
        );
    }

    #[test]
    fn test_verify_and_parse_ignores_other_events() {
        let body = json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": {"object": {"id": "in_1"}}
        })
        .to_string();
        let signature = sign(body.as_bytes(), "whsec_123", now()).unwrap();

        let event = gateway("http://unused")
            .verify_and_parse(body.as_bytes(), &signature)
            .unwrap();
        assert_eq!(
            event,
            GatewayEvent::Ignored {
                event_type: "invoice.paid".to_string()
            }
        );
    }

    #[test]
    fn test_verify_and_parse_rejects_bad_signature_and_body() {
        let gateway = gateway("http://unused");
        let body = br#"{"id":"evt_3"}"#;
        assert!(gateway.verify_and_parse(body, "t=1,v1=00").is_err());

        let signature = sign(b"not json", "whsec_123", now()).unwrap();
        assert!(matches!(
            gateway.verify_and_parse(b"not json", &signature),
            Err(VerificationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_unconfigured_webhook_secret() {
        let gateway = StripeGateway::new(&AppConfig::default()).unwrap();
        assert!(matches!(
            gateway.verify_and_parse(b"{}", "t=1,v1=00"),
            Err(VerificationError::NotConfigured)
        ));
    }
}
