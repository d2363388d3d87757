//! Query sanitisation and SQL rendering for job search.
//!
//! Every search is described by one [`QuerySpec`] value and rendered by
//! [`render`] into a single statement for the connected backend. User input
//! only ever reaches the database as bound values.

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::{DbBackend, Statement, Value};

use crate::models::AdTier;

static NON_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s]").expect("valid term regex"));

/// Split raw user input into search terms.
///
/// `|` separates terms; any other character that is not an ASCII letter,
/// digit or whitespace is dropped. An empty result means "no filter".
pub fn sanitize(raw: &str) -> Vec<String> {
    let spaced = raw.replace('|', " ");
    NON_TERM_RE
        .replace_all(&spaced, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Sanitised location filter, or `None` when nothing usable remains.
pub fn sanitize_location(raw: &str) -> Option<String> {
    let terms = sanitize(raw);
    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Which filters a search applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySpec {
    Unfiltered,
    ByLocation { location: String },
    BySkill { terms: Vec<String> },
    ByLocationAndSkill { location: String, terms: Vec<String> },
}

impl QuerySpec {
    /// Build a query plan from already-sanitised inputs.
    pub fn from_parts(location: Option<String>, terms: Vec<String>) -> Self {
        match (location, terms.is_empty()) {
            (None, true) => QuerySpec::Unfiltered,
            (Some(location), true) => QuerySpec::ByLocation { location },
            (None, false) => QuerySpec::BySkill { terms },
            (Some(location), false) => QuerySpec::ByLocationAndSkill { location, terms },
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            QuerySpec::ByLocation { location } | QuerySpec::ByLocationAndSkill { location, .. } => {
                Some(location)
            }
            QuerySpec::Unfiltered | QuerySpec::BySkill { .. } => None,
        }
    }

    pub fn terms(&self) -> &[String] {
        match self {
            QuerySpec::BySkill { terms } | QuerySpec::ByLocationAndSkill { terms, .. } => terms,
            QuerySpec::Unfiltered | QuerySpec::ByLocation { .. } => &[],
        }
    }

    /// Same skill terms, location replaced.
    pub fn with_location(&self, location: &str) -> Self {
        QuerySpec::from_parts(Some(location.to_string()), self.terms().to_vec())
    }

    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QuerySpec::Unfiltered => "unfiltered",
            QuerySpec::ByLocation { .. } => "location",
            QuerySpec::BySkill { .. } => "skill",
            QuerySpec::ByLocationAndSkill { .. } => "location_skill",
        }
    }
}

/// Accumulates bound values and emits numbered placeholders (`$n` on
/// Postgres, `?n` on SQLite) so one value can be referenced more than once.
struct Params {
    backend: DbBackend,
    values: Vec<Value>,
}

impl Params {
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        match self.backend {
            DbBackend::Postgres => format!("${}", self.values.len()),
            DbBackend::Sqlite | DbBackend::MySql => format!("?{}", self.values.len()),
        }
    }
}

const JOB_COLUMNS: &str = "id, external_id, job_title, company, company_url, company_email, \
     location, salary_min, salary_max, salary_currency, salary_range, description, perks, \
     interview_process, how_to_apply, slug, ad_type, company_icon_id, created_at, approved_at";

/// Render one page of `plan` as a statement returning job columns plus a
/// `full_count` column holding the total number of matches.
pub fn render(plan: &QuerySpec, backend: DbBackend, limit: u64, offset: u64) -> Statement {
    let mut params = Params {
        backend,
        values: Vec::new(),
    };

    let pinned = AdTier::PINNED
        .iter()
        .map(|tier| tier.code().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut conditions = vec![
        "approved_at IS NOT NULL".to_string(),
        format!("ad_type NOT IN ({pinned})"),
    ];

    if let Some(location) = plan.location() {
        let placeholder = params.bind(location.to_string());
        conditions.push(match backend {
            DbBackend::Postgres => format!("location ILIKE '%' || {placeholder} || '%'"),
            DbBackend::Sqlite | DbBackend::MySql => {
                format!("LOWER(location) LIKE '%' || LOWER({placeholder}) || '%'")
            }
        });
    }

    let terms = plan.terms();
    let relevance = if terms.is_empty() {
        None
    } else {
        match backend {
            DbBackend::Postgres => {
                let document = "to_tsvector(job_title) || to_tsvector(company) || to_tsvector(description)";
                let query = params.bind(terms.join(" | "));
                conditions.push(format!("({document}) @@ to_tsquery({query})"));
                Some(format!("ts_rank({document}, to_tsquery({query}))"))
            }
            DbBackend::Sqlite | DbBackend::MySql => {
                let document = "LOWER(job_title || ' ' || company || ' ' || description)";
                let occurrences = terms
                    .iter()
                    .map(|term| {
                        let term = params.bind(term.to_lowercase());
                        format!(
                            "((LENGTH({document}) - LENGTH(REPLACE({document}, {term}, ''))) / LENGTH({term}))"
                        )
                    })
                    .collect::<Vec<_>>();
                let score = format!("({})", occurrences.join(" + "));
                conditions.push(format!("{score} > 0"));
                Some(score)
            }
        }
    };

    let order_by = match &relevance {
        Some(_) => "relevance DESC, created_at DESC",
        None => "created_at DESC",
    };
    let relevance_column = relevance
        .map(|expr| format!(", {expr} AS relevance"))
        .unwrap_or_default();

    let limit = params.bind(i64::try_from(limit).unwrap_or(i64::MAX));
    let offset = params.bind(i64::try_from(offset).unwrap_or(i64::MAX));

    let sql = format!(
        "SELECT count(*) OVER () AS full_count, {JOB_COLUMNS}{relevance_column} \
         FROM job WHERE {} ORDER BY {order_by} LIMIT {limit} OFFSET {offset}",
        conditions.join(" AND ")
    );

    Statement::from_sql_and_values(backend, sql, params.values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_splits_on_pipes_and_strips_symbols() {
        assert_eq!(sanitize("go|rust"), vec!["go", "rust"]);
        assert_eq!(sanitize("c++; drop"), vec!["c", "drop"]);
        assert!(sanitize("$$$").is_empty());
        assert_eq!(sanitize("  Golang   developer "), vec!["Golang", "developer"]);
        assert_eq!(sanitize("zürich"), vec!["zrich"]);
    }

    #[test]
    fn location_sanitising_joins_words() {
        assert_eq!(sanitize_location("New York!").as_deref(), Some("New York"));
        assert_eq!(sanitize_location("&&"), None);
    }

    #[test]
    fn query_selection_covers_all_combinations() {
        assert_eq!(QuerySpec::from_parts(None, vec![]), QuerySpec::Unfiltered);
        assert_eq!(
            QuerySpec::from_parts(Some("Berlin".into()), vec![]).kind(),
            "location"
        );
        assert_eq!(QuerySpec::from_parts(None, vec!["go".into()]).kind(), "skill");
        let both = QuerySpec::from_parts(Some("Berlin".into()), vec!["go".into()]);
        assert_eq!(both.kind(), "location_skill");
        assert_eq!(
            both.with_location("Remote"),
            QuerySpec::ByLocationAndSkill {
                location: "Remote".into(),
                terms: vec!["go".into()]
            }
        );
    }

    #[test]
    fn postgres_skill_query_uses_full_text_search() {
        let plan = QuerySpec::from_parts(Some("Berlin".into()), vec!["go".into(), "rust".into()]);
        let stmt = render(&plan, DbBackend::Postgres, 10, 20);

        assert!(stmt.sql.contains("count(*) OVER () AS full_count"));
        assert!(stmt.sql.contains("location ILIKE '%' || $1 || '%'"));
        assert!(stmt.sql.contains("@@ to_tsquery($2)"));
        assert!(stmt.sql.contains("ORDER BY relevance DESC, created_at DESC"));
        assert!(stmt.sql.ends_with("LIMIT $3 OFFSET $4"));

        let values = stmt.values.expect("bound values").0;
        assert_eq!(values[1], Value::from("go | rust".to_string()));
        assert_eq!(values[2], Value::from(10i64));
        assert_eq!(values[3], Value::from(20i64));
    }

    #[test]
    fn unfiltered_query_excludes_pinned_and_unapproved() {
        let stmt = render(&QuerySpec::Unfiltered, DbBackend::Sqlite, 5, 0);
        assert!(stmt.sql.contains("approved_at IS NOT NULL"));
        assert!(stmt.sql.contains("ad_type NOT IN (2, 3)"));
        assert!(stmt.sql.contains("ORDER BY created_at DESC"));
        assert!(!stmt.sql.contains("relevance"));
    }

    #[test]
    fn sqlite_skill_query_binds_each_term_once() {
        let plan = QuerySpec::from_parts(None, vec!["Go".into(), "Rust".into()]);
        let stmt = render(&plan, DbBackend::Sqlite, 10, 0);
        let values = stmt.values.expect("bound values").0;
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], Value::from("go".to_string()));
        assert!(stmt.sql.contains("REPLACE("));
        assert!(stmt.sql.contains("?2"));
    }
}
