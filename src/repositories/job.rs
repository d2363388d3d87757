//! # Job Repository
//!
//! Persistence operations for job postings. State transitions that must not
//! race (approval, tier upgrade, demotion) are single conditional `UPDATE`s
//! whose affected-row count tells the caller whether the transition applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};

use crate::models::job::{ActiveModel, Column, Entity, Model};
use crate::models::{AdTier, apply_token, edit_token, job_event, purchase_event};

/// Repository for job posting database operations
#[derive(Clone)]
pub struct JobRepository {
    db: Arc<DatabaseConnection>,
}

impl JobRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new posting on the given connection (plain pool or open transaction).
    pub async fn insert<C: ConnectionTrait>(conn: &C, job: ActiveModel) -> Result<Model, DbErr> {
        job.insert(conn).await.map_err(|e| {
            tracing::error!("Failed to insert job: {}", e);
            e
        })
    }

    /// Persist changed columns of an existing posting.
    pub async fn update(&self, job: ActiveModel) -> Result<Model, DbErr> {
        job.update(self.db.as_ref()).await.map_err(|e| {
            tracing::error!("Failed to update job: {}", e);
            e
        })
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(self.db.as_ref()).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
    }

    /// Publicly visible posting by slug.
    pub async fn find_approved_by_slug(&self, slug: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Slug.eq(slug))
            .filter(Column::ApprovedAt.is_not_null())
            .one(self.db.as_ref())
            .await
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExternalId.eq(external_id))
            .one(self.db.as_ref())
            .await
    }

    /// Posting an edit token was issued for.
    pub async fn find_by_edit_token(&self, token: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .inner_join(edit_token::Entity)
            .filter(edit_token::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
    }

    /// Posting a checkout session was opened for.
    pub async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .inner_join(purchase_event::Entity)
            .filter(purchase_event::Column::SessionId.eq(session_id))
            .one(self.db.as_ref())
            .await
    }

    /// Approved postings on a pinned tier, newest first.
    pub async fn find_pinned(&self) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ApprovedAt.is_not_null())
            .filter(Column::AdType.is_in(AdTier::PINNED.iter().map(|t| t.code())))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    /// Drafts waiting for an admin decision, newest first.
    pub async fn find_pending_approval(&self) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ApprovedAt.is_null())
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    /// Set `approved_at`. Returns rows affected.
    pub async fn approve(&self, id: i32, at: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::ApprovedAt, Expr::value(at))
            .filter(Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(job_id = id, "Failed to approve job: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }

    /// Clear `approved_at`, leaving the tier untouched. Returns rows affected.
    pub async fn disapprove(&self, id: i32) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::ApprovedAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(job_id = id, "Failed to disapprove job: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }

    /// Approve an unapproved posting and set its tier in one statement.
    /// Returns 0 when the posting was already approved.
    pub async fn approve_with_tier(
        &self,
        id: i32,
        tier: AdTier,
        at: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::ApprovedAt, Expr::value(at))
            .col_expr(Column::AdType, Expr::value(tier.code()))
            .filter(Column::Id.eq(id))
            .filter(Column::ApprovedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(job_id = id, "Failed to approve job with tier: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }

    /// Compare-and-swap tier upgrade: applies only while the stored tier ranks
    /// strictly below `tier`. Returns rows affected.
    pub async fn upgrade_tier(&self, id: i32, tier: AdTier) -> Result<u64, DbErr> {
        let lower = tier.ranked_below();
        if lower.is_empty() {
            return Ok(0);
        }

        let result = Entity::update_many()
            .col_expr(Column::AdType, Expr::value(tier.code()))
            .filter(Column::Id.eq(id))
            .filter(Column::AdType.is_in(lower.iter().map(|t| t.code())))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(job_id = id, "Failed to upgrade job tier: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }

    /// Reset postings on `tier` approved at or before `since` back to Basic.
    pub async fn demote_approved_before(
        &self,
        tier: AdTier,
        since: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::AdType, Expr::value(AdTier::Basic.code()))
            .filter(Column::AdType.eq(tier.code()))
            .filter(Column::ApprovedAt.lte(since))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(tier = tier.as_str(), "Failed to demote jobs: {}", e);
                e
            })?;
        Ok(result.rows_affected)
    }

    /// Delete a posting and every dependent row in one transaction.
    /// Returns `false` when no posting with `id` exists.
    pub async fn delete_cascade(&self, id: i32) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        edit_token::Entity::delete_many()
            .filter(edit_token::Column::JobId.eq(id))
            .exec(&txn)
            .await?;
        apply_token::Entity::delete_many()
            .filter(apply_token::Column::JobId.eq(id))
            .exec(&txn)
            .await?;
        job_event::Entity::delete_many()
            .filter(job_event::Column::JobId.eq(id))
            .exec(&txn)
            .await?;
        purchase_event::Entity::delete_many()
            .filter(purchase_event::Column::JobId.eq(id))
            .exec(&txn)
            .await?;

        let deleted = Entity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit().await.map_err(|e| {
            tracing::error!(job_id = id, "Failed to commit job deletion: {}", e);
            e
        })?;
        Ok(true)
    }
}
