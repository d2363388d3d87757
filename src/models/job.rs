//! Job posting entity model
//!
//! This module contains the SeaORM entity model for the `job` table, the
//! central record every other board table hangs off.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ad_tier::AdTier;

/// A job advertisement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Opaque public identifier, used by quick apply and clickout links
    #[sea_orm(unique)]
    pub external_id: String,

    pub job_title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub company_email: String,

    /// Free text, may contain `/`-separated sub-locations
    pub location: String,

    pub salary_min: i64,
    pub salary_max: i64,
    /// Currency symbol, e.g. `$` or `₹`
    pub salary_currency: String,
    /// Display string derived from min, max and currency
    pub salary_range: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub perks: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub interview_process: Option<String>,
    /// URL or email address
    #[sea_orm(column_type = "Text")]
    pub how_to_apply: String,

    /// URL key, immutable once assigned
    #[sea_orm(unique)]
    pub slug: String,

    pub ad_type: AdTier,
    pub company_icon_id: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Set iff the posting is publicly visible
    pub approved_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::edit_token::Entity")]
    EditToken,
    #[sea_orm(has_many = "super::purchase_event::Entity")]
    PurchaseEvent,
    #[sea_orm(has_many = "super::job_event::Entity")]
    JobEvent,
    #[sea_orm(has_many = "super::apply_token::Entity")]
    ApplyToken,
}

impl Related<super::edit_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EditToken.def()
    }
}

impl Related<super::purchase_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseEvent.def()
    }
}

impl Related<super::job_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobEvent.def()
    }
}

impl Related<super::apply_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplyToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }

    pub fn is_pinned(&self) -> bool {
        self.ad_type.is_pinned()
    }

    /// Applications go through the board's own quick-apply flow when the
    /// how-to-apply field is an email address.
    pub fn is_quick_apply(&self) -> bool {
        crate::lifecycle::validation::is_email(self.how_to_apply.trim())
    }
}
