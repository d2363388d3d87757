//! # Data Models
//!
//! This module contains all the data models used throughout the job board.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod ad_tier;
pub mod apply_token;
pub mod currency;
pub mod edit_token;
pub mod job;
pub mod job_event;
pub mod purchase_event;

pub use ad_tier::AdTier;
pub use apply_token::Entity as ApplyToken;
pub use currency::CurrencyCode;
pub use edit_token::Entity as EditToken;
pub use job::Entity as Job;
pub use job_event::{Entity as JobEvent, EventType};
pub use purchase_event::Entity as PurchaseEvent;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "jobboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
