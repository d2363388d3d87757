//! # Apply Token Repository

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::models::apply_token::{ActiveModel, Column, Entity, Model};
use crate::models::job;

/// How long a candidate has to confirm an application.
pub const APPLY_TOKEN_TTL_HOURS: i64 = 72;

/// Repository for apply token database operations
#[derive(Clone)]
pub struct ApplyTokenRepository {
    db: Arc<DatabaseConnection>,
}

impl ApplyTokenRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        token: &str,
        job_id: i32,
        email: &str,
        cv: Vec<u8>,
        at: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            token: Set(token.to_string()),
            job_id: Set(job_id),
            email: Set(email.to_string()),
            cv: Set(cv),
            created_at: Set(at),
            confirmed_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(job_id, "Failed to store apply token: {}", e);
            e
        })
    }

    /// Unconfirmed, unexpired token together with its approved posting.
    pub async fn find_pending_with_job(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Model, job::Model)>, DbErr> {
        let cutoff = now - Duration::hours(APPLY_TOKEN_TTL_HOURS);
        let found = Entity::find()
            .find_also_related(job::Entity)
            .filter(Column::Token.eq(token))
            .filter(Column::ConfirmedAt.is_null())
            .filter(Column::CreatedAt.gte(cutoff))
            .filter(job::Column::ApprovedAt.is_not_null())
            .one(self.db.as_ref())
            .await?;

        Ok(found.and_then(|(token, job)| job.map(|job| (token, job))))
    }

    /// Returns rows affected; 0 when the token was confirmed concurrently.
    pub async fn confirm(&self, token: &str, at: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::ConfirmedAt, Expr::value(at))
            .filter(Column::Token.eq(token))
            .filter(Column::ConfirmedAt.is_null())
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// Remove tokens that expired or were already confirmed.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let cutoff = now - Duration::hours(APPLY_TOKEN_TTL_HOURS);
        let result = Entity::delete_many()
            .filter(
                Condition::any()
                    .add(Column::CreatedAt.lt(cutoff))
                    .add(Column::ConfirmedAt.is_not_null()),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!("Failed to clean up apply tokens: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }
}
