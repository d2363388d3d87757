//! # Engagement Event Repository

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::models::job_event::{ActiveModel, Column, Entity, EventType};

/// Views and clickouts recorded on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyEngagement {
    pub date: NaiveDate,
    pub page_views: u64,
    pub clickouts: u64,
}

/// Repository for engagement event database operations
#[derive(Clone)]
pub struct JobEventRepository {
    db: Arc<DatabaseConnection>,
}

impl JobEventRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        job_id: i32,
        event_type: EventType,
        at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        ActiveModel {
            event_type: Set(event_type),
            job_id: Set(job_id),
            created_at: Set(at),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(job_id, "Failed to record job event: {}", e);
            e
        })?;
        Ok(())
    }

    pub async fn count(&self, job_id: i32, event_type: EventType) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::JobId.eq(job_id))
            .filter(Column::EventType.eq(event_type))
            .count(self.db.as_ref())
            .await
    }

    /// Per-day counts for a posting, oldest day first.
    pub async fn daily(&self, job_id: i32) -> Result<Vec<DailyEngagement>, DbErr> {
        let events: Vec<(EventType, DateTime<Utc>)> = Entity::find()
            .select_only()
            .column(Column::EventType)
            .column(Column::CreatedAt)
            .filter(Column::JobId.eq(job_id))
            .order_by_asc(Column::CreatedAt)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let mut days: BTreeMap<NaiveDate, DailyEngagement> = BTreeMap::new();
        for (event_type, at) in events {
            let date = at.date_naive();
            let day = days.entry(date).or_insert(DailyEngagement {
                date,
                page_views: 0,
                clickouts: 0,
            });
            match event_type {
                EventType::PageView => day.page_views += 1,
                EventType::Clickout => day.clickouts += 1,
            }
        }

        Ok(days.into_values().collect())
    }
}
