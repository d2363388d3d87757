//! # Purchase Event Repository
//!
//! Checkout sessions and their completion. Completion is a conditional update
//! so a session can be completed at most once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::models::AdTier;
use crate::models::purchase_event::{ActiveModel, Column, Entity, Model};

/// Fields of a checkout session to record.
#[derive(Debug, Clone)]
pub struct NewPurchaseEvent {
    pub session_id: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub tier: AdTier,
    pub email: String,
    pub job_id: i32,
}

/// Repository for purchase event database operations
#[derive(Clone)]
pub struct PurchaseEventRepository {
    db: Arc<DatabaseConnection>,
}

impl PurchaseEventRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, event: NewPurchaseEvent, at: DateTime<Utc>) -> Result<Model, DbErr> {
        ActiveModel {
            session_id: Set(event.session_id),
            amount: Set(event.amount),
            currency: Set(event.currency),
            description: Set(event.description),
            ad_type: Set(event.tier),
            email: Set(event.email),
            job_id: Set(event.job_id),
            created_at: Set(at),
            completed_at: Set(None),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create purchase event: {}", e);
            e
        })
    }

    pub async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .one(self.db.as_ref())
            .await
    }

    /// Mark an open session completed. Returns rows affected, which is 0 when
    /// the session is unknown or was already completed.
    pub async fn mark_completed(&self, session_id: &str, at: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::CompletedAt, Expr::value(at))
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::CompletedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(session_id, "Failed to mark purchase completed: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }

    /// Purchase history of a posting, newest first.
    pub async fn list_for_job(&self, job_id: i32) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::JobId.eq(job_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    /// Whether the posting has a checkout session that has not completed yet.
    pub async fn has_open_session(&self, job_id: i32) -> Result<bool, DbErr> {
        let open = Entity::find()
            .filter(Column::JobId.eq(job_id))
            .filter(Column::CompletedAt.is_null())
            .one(self.db.as_ref())
            .await?;
        Ok(open.is_some())
    }
}
