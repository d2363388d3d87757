//! Purchase event entity model
//!
//! One row per checkout session opened with the payment gateway. A row is
//! completed at most once, when the gateway confirms the payment.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ad_tier::AdTier;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Gateway checkout session identifier
    #[sea_orm(unique)]
    pub session_id: String,

    /// Amount in minor currency units
    pub amount: i64,
    /// ISO currency code (USD, EUR, GBP)
    pub currency: String,
    pub description: String,
    pub ad_type: AdTier,
    pub email: String,
    pub job_id: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
