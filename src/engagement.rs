//! Page view and clickout tracking.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::instrument;

use crate::error::BoardResult;
use crate::models::EventType;
use crate::repositories::{DailyEngagement, JobEventRepository};

/// Aggregated engagement for one posting.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementStats {
    pub page_views: u64,
    pub clickouts: u64,
    /// Clickouts per view as a percentage with two decimals.
    pub conversion_rate: Option<String>,
    pub daily: Vec<DailyEngagement>,
}

/// Clickouts as a percentage of views, formatted with two decimals.
/// `None` unless both counts are non-zero.
pub fn conversion_rate(page_views: u64, clickouts: u64) -> Option<String> {
    if page_views == 0 || clickouts == 0 {
        return None;
    }
    Some(format!(
        "{:.2}",
        clickouts as f64 / page_views as f64 * 100.0
    ))
}

#[derive(Clone)]
pub struct EngagementTracker {
    events: JobEventRepository,
}

impl EngagementTracker {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            events: JobEventRepository::new(db),
        }
    }

    #[instrument(skip(self))]
    pub async fn track_view(&self, job_id: i32) -> BoardResult<()> {
        self.events
            .record(job_id, EventType::PageView, Utc::now())
            .await?;
        counter!("jobboard_job_events_total", "type" => "page_view").increment(1);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn track_clickout(&self, job_id: i32) -> BoardResult<()> {
        self.events
            .record(job_id, EventType::Clickout, Utc::now())
            .await?;
        counter!("jobboard_job_events_total", "type" => "clickout").increment(1);
        Ok(())
    }

    pub async fn view_count(&self, job_id: i32) -> BoardResult<u64> {
        Ok(self.events.count(job_id, EventType::PageView).await?)
    }

    pub async fn clickout_count(&self, job_id: i32) -> BoardResult<u64> {
        Ok(self.events.count(job_id, EventType::Clickout).await?)
    }

    pub async fn daily_stats(&self, job_id: i32) -> BoardResult<Vec<DailyEngagement>> {
        Ok(self.events.daily(job_id).await?)
    }

    pub async fn stats(&self, job_id: i32) -> BoardResult<EngagementStats> {
        let page_views = self.view_count(job_id).await?;
        let clickouts = self.clickout_count(job_id).await?;
        Ok(EngagementStats {
            page_views,
            clickouts,
            conversion_rate: conversion_rate(page_views, clickouts),
            daily: self.daily_stats(job_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_rate_needs_both_counts() {
        assert_eq!(conversion_rate(0, 0), None);
        assert_eq!(conversion_rate(10, 0), None);
        assert_eq!(conversion_rate(0, 3), None);
    }

    #[test]
    fn conversion_rate_has_two_decimals() {
        assert_eq!(conversion_rate(3, 1).as_deref(), Some("33.33"));
        assert_eq!(conversion_rate(4, 1).as_deref(), Some("25.00"));
        assert_eq!(conversion_rate(2, 3).as_deref(), Some("150.00"));
    }
}
