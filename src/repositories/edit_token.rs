//! # Edit Token Repository

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};

use crate::models::edit_token::{ActiveModel, Column, Entity, Model};

/// Repository for edit token database operations
#[derive(Clone)]
pub struct EditTokenRepository {
    db: Arc<DatabaseConnection>,
}

impl EditTokenRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a token on the given connection so it can share the draft's transaction.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        token: &str,
        job_id: i32,
        at: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            token: Set(token.to_string()),
            job_id: Set(job_id),
            created_at: Set(at),
        }
        .insert(conn)
        .await
        .map_err(|e| {
            tracing::error!(job_id, "Failed to store edit token: {}", e);
            e
        })
    }

    pub async fn find(&self, token: &str) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(token.to_string())
            .one(self.db.as_ref())
            .await
    }

    pub async fn find_for_job(&self, job_id: i32) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::JobId.eq(job_id))
            .one(self.db.as_ref())
            .await
    }
}
