//! # Payment Webhook Signature Verification
//!
//! Verifies `Stripe-Signature` headers (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
//! using HMAC-SHA256 over `"{t}.{body}"`, a timestamp tolerance window and
//! constant-time comparison.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header the gateway signs webhook deliveries with.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Errors that can occur during webhook signature verification
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Missing required signature header: {header}")]
    MissingSignature { header: String },

    #[error("Invalid signature format: {header}")]
    InvalidSignatureFormat { header: String },

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Signature header carries no timestamp")]
    MissingTimestamp,

    #[error("Invalid timestamp in signature header")]
    InvalidTimestamp,

    #[error("Timestamp too old: {seconds}s old, max allowed: {max_seconds}s")]
    TimestampTooOld { seconds: u64, max_seconds: u64 },

    #[error("Timestamp too far in future: {seconds}s in future, max allowed: {max_seconds}s")]
    TimestampTooFuture { seconds: u64, max_seconds: u64 },

    #[error("Payment webhook verification is not configured")]
    NotConfigured,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),
}

impl VerificationError {
    /// HTTP status used when rejecting the delivery.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result type for webhook verification
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Verify a signature header against the current clock.
pub fn verify_signature(
    body: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_seconds: u64,
) -> VerificationResult<()> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| VerificationError::InvalidTimestamp)?
        .as_secs();
    verify_signature_at(body, signature_header, secret, tolerance_seconds, now)
}

/// Verify a signature header as of `now` (unix seconds).
pub fn verify_signature_at(
    body: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_seconds: u64,
    now: u64,
) -> VerificationResult<()> {
    debug!(
        body_size = body.len(),
        tolerance_seconds, "Starting payment webhook signature verification"
    );

    if signature_header.trim().is_empty() {
        return Err(VerificationError::MissingSignature {
            header: SIGNATURE_HEADER.to_string(),
        });
    }

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in signature_header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(VerificationError::InvalidSignatureFormat {
                header: format!("{SIGNATURE_HEADER} entries must be key=value pairs"),
            });
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            // Other schemes (v0, test-mode keys) are not trusted.
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or(VerificationError::MissingTimestamp)?
        .parse::<u64>()
        .map_err(|_| VerificationError::InvalidTimestamp)?;

    if signatures.is_empty() {
        return Err(VerificationError::InvalidSignatureFormat {
            header: format!("{SIGNATURE_HEADER} carries no v1 signature"),
        });
    }

    let time_diff = now.abs_diff(timestamp);
    if time_diff > tolerance_seconds {
        if now > timestamp {
            return Err(VerificationError::TimestampTooOld {
                seconds: time_diff,
                max_seconds: tolerance_seconds,
            });
        } else {
            return Err(VerificationError::TimestampTooFuture {
                seconds: time_diff,
                max_seconds: tolerance_seconds,
            });
        }
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::VerificationFailed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    let expected_bytes = mac.finalize().into_bytes();
    let expected_bytes: &[u8] = expected_bytes.as_ref();

    for candidate in signatures {
        let Ok(provided_bytes) = hex::decode(candidate) else {
            continue;
        };
        if subtle::ConstantTimeEq::ct_eq(expected_bytes, &provided_bytes[..]).into() {
            return Ok(());
        }
    }

    Err(VerificationError::VerificationFailed)
}

/// Build a valid signature header for `body`. Used by tests and local tooling
/// that replays deliveries.
pub fn sign(body: &[u8], secret: &str, timestamp: u64) -> VerificationResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::VerificationFailed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}
