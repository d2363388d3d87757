//! # Ranking & Search
//!
//! Turns `(location, skill, page)` into one page of approved, non-pinned
//! postings ordered by relevance and recency, plus the pinned list shown above
//! every page. When a page comes back empty the engine retries against remote
//! postings before giving up.

pub mod query;

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult};
use tracing::{debug, instrument};

use crate::error::{BoardError, BoardResult};
use crate::models::job;
use crate::repositories::JobRepository;

pub use query::{QuerySpec, sanitize, sanitize_location};

/// Location the fallback searches use.
pub const REMOTE_LOCATION: &str = "Remote";

/// Maximum number of page links rendered.
pub const MAX_PAGE_LINKS: u64 = 8;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// A search request as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub location: String,
    pub skill: String,
    pub page: i64,
    pub page_size: u64,
}

/// A listed posting with fields derived for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedJob {
    pub job: job::Model,
    pub is_quick_apply: bool,
}

impl From<job::Model> for RankedJob {
    fn from(job: job::Model) -> Self {
        let is_quick_apply = job.is_quick_apply();
        Self {
            job,
            is_quick_apply,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub jobs: Vec<RankedJob>,
    /// Total matches across every page of the query that produced `jobs`.
    pub total: u64,
    /// Approved pinned postings, independent of the filters.
    pub pinned: Vec<RankedJob>,
    /// Set when the requested filters matched nothing and remote results
    /// were substituted.
    pub remote_fallback: bool,
    pub page: u64,
    pub page_links: Vec<u64>,
}

/// Page numbers to link to: at most [`MAX_PAGE_LINKS`], starting a few pages
/// before `page` and never past the last page.
pub fn page_links(page: u64, total: u64, page_size: u64) -> Vec<u64> {
    if page_size == 0 {
        return Vec::new();
    }
    let last = total / page_size + 1;
    let start = page.saturating_sub(MAX_PAGE_LINKS / 2 + 1).max(1);
    let end = (start + MAX_PAGE_LINKS - 1).min(last);
    (start..=end).collect()
}

/// Executes job searches against the shared pool.
#[derive(Clone)]
pub struct SearchEngine {
    db: Arc<DatabaseConnection>,
    jobs: JobRepository,
}

impl SearchEngine {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            db,
        }
    }

    #[instrument(skip(self), fields(kind = tracing::field::Empty))]
    pub async fn search(&self, request: SearchRequest) -> BoardResult<SearchOutcome> {
        if request.page_size == 0 || request.page_size > MAX_PAGE_SIZE {
            return Err(BoardError::invalid_field(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        let page = u64::try_from(request.page).unwrap_or(0).max(1);
        let plan = QuerySpec::from_parts(
            sanitize_location(&request.location),
            sanitize(&request.skill),
        );
        tracing::Span::current().record("kind", plan.kind());

        let started = Instant::now();
        let (mut jobs, mut total) = self.run_page(&plan, page, request.page_size).await?;

        let remote_fallback = jobs.is_empty();
        if remote_fallback {
            counter!("jobboard_search_fallback_total").increment(1);
            debug!("No results, falling back to remote jobs");

            (jobs, total) = self
                .run_page(&plan.with_location(REMOTE_LOCATION), page, request.page_size)
                .await?;
            if jobs.is_empty() {
                (jobs, total) = self
                    .run_page(
                        &QuerySpec::from_parts(Some(REMOTE_LOCATION.to_string()), Vec::new()),
                        page,
                        request.page_size,
                    )
                    .await?;
            }
        }

        let pinned = self.jobs.find_pinned().await?;

        histogram!("jobboard_search_duration_ms", "kind" => plan.kind())
            .record(started.elapsed().as_secs_f64() * 1000.0);
        counter!("jobboard_searches_total", "kind" => plan.kind()).increment(1);

        Ok(SearchOutcome {
            jobs: jobs.into_iter().map(RankedJob::from).collect(),
            total,
            pinned: pinned.into_iter().map(RankedJob::from).collect(),
            remote_fallback,
            page,
            page_links: page_links(page, total, request.page_size),
        })
    }

    async fn run_page(
        &self,
        plan: &QuerySpec,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<job::Model>, u64), DbErr> {
        let offset = page.saturating_mul(page_size) - page_size;
        let statement = query::render(plan, self.db.get_database_backend(), page_size, offset);
        let rows = self.db.query_all(statement).await?;

        let mut total = 0u64;
        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let full_count: i64 = row.try_get("", "full_count")?;
            total = u64::try_from(full_count).unwrap_or(0);
            jobs.push(job::Model::from_query_result(&row, "")?);
        }
        Ok((jobs, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_links_window() {
        assert_eq!(page_links(1, 100, 10), (1..=8).collect::<Vec<_>>());
        assert_eq!(page_links(10, 100, 10), (5..=11).collect::<Vec<_>>());
        assert_eq!(page_links(1, 0, 10), vec![1]);
        assert_eq!(page_links(3, 25, 10), vec![1, 2, 3]);
    }

    #[test]
    fn page_links_handles_zero_page_size() {
        assert!(page_links(1, 10, 0).is_empty());
    }
}
