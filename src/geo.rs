//! Currency-by-IP lookup.
//!
//! Checkout and manage pages quote prices in the visitor's currency. The
//! lookup is best effort: any failure quotes in USD.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use lru::LruCache;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{BoardError, BoardResult};
use crate::models::CurrencyCode;

const SERVICE: &str = "geolocation";
const CACHE_CAPACITY: usize = 1024;

#[async_trait]
pub trait CurrencyLookup: Send + Sync {
    async fn currency_for_ip(&self, ip: &str) -> BoardResult<CurrencyCode>;
}

/// Lookup that always answers with one currency. Used when no geolocation
/// service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCurrency(pub CurrencyCode);

#[async_trait]
impl CurrencyLookup for FixedCurrency {
    async fn currency_for_ip(&self, _ip: &str) -> BoardResult<CurrencyCode> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct GeolocationResponse {
    currency: Option<String>,
}

/// Geolocation lookup against an ipapi-style HTTP endpoint
/// (`GET {base}/{ip}/json/`), with an in-process LRU cache per IP.
pub struct HttpCurrencyLookup {
    http_client: Client,
    api_base: String,
    cache: Arc<RwLock<LruCache<String, CurrencyCode>>>,
}

impl HttpCurrencyLookup {
    pub fn new(api_base: &str) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
        })
    }

    async fn fetch(&self, ip: &str) -> BoardResult<CurrencyCode> {
        let response = self
            .http_client
            .get(format!("{}/{}/json/", self.api_base, ip))
            .send()
            .await
            .map_err(|e| BoardError::upstream(SERVICE, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BoardError::upstream(
                SERVICE,
                format!("lookup returned {}", response.status()),
            ));
        }

        let body: GeolocationResponse = response
            .json()
            .await
            .map_err(|e| BoardError::upstream(SERVICE, format!("malformed response: {}", e)))?;
        Ok(body
            .currency
            .map(|code| CurrencyCode::parse_or_default(&code))
            .unwrap_or_default())
    }
}

#[async_trait]
impl CurrencyLookup for HttpCurrencyLookup {
    async fn currency_for_ip(&self, ip: &str) -> BoardResult<CurrencyCode> {
        {
            let mut cache = self.cache.write().await;
            if let Some(currency) = cache.get(ip) {
                return Ok(*currency);
            }
        }

        let currency = self.fetch(ip).await?;
        debug!(ip, currency = currency.code(), "Resolved currency for IP");

        {
            let mut cache = self.cache.write().await;
            cache.put(ip.to_string(), currency);
        }
        Ok(currency)
    }
}

/// First address of an `X-Forwarded-For` header.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Currency for the caller of a request, USD when it cannot be determined.
pub async fn currency_for_request(lookup: &dyn CurrencyLookup, headers: &HeaderMap) -> CurrencyCode {
    let Some(ip) = client_ip(headers) else {
        debug!("No forwarded client address, quoting in USD");
        return CurrencyCode::Usd;
    };
    match lookup.currency_for_ip(&ip).await {
        Ok(currency) => currency,
        Err(e) => {
            warn!(ip = %ip, error = %e, "Currency lookup failed, quoting in USD");
            CurrencyCode::Usd
        }
    }
}
