//! Draft input validation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{BoardError, BoardResult};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Salary currency symbols a posting may use.
pub const SALARY_CURRENCIES: [&str; 4] = ["$", "€", "£", "₹"];

pub fn is_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate)
}

/// Job submission as entered by the poster. Salaries arrive as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct JobDraft {
    pub job_title: String,
    pub company: String,
    #[serde(default)]
    pub company_url: Option<String>,
    pub company_email: String,
    pub location: String,
    pub salary_min: String,
    pub salary_max: String,
    pub salary_currency: String,
    pub description: String,
    #[serde(default)]
    pub perks: Option<String>,
    #[serde(default)]
    pub interview_process: Option<String>,
    pub how_to_apply: String,
    #[serde(default)]
    pub company_icon_id: Option<String>,
}

/// A draft that passed validation, with salaries parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub job_title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub company_email: String,
    pub location: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub salary_currency: String,
    pub description: String,
    pub perks: Option<String>,
    pub interview_process: Option<String>,
    pub how_to_apply: String,
    pub company_icon_id: Option<String>,
}

impl JobDraft {
    /// Check every field, collecting all failures into one validation error.
    pub fn validate(self) -> BoardResult<ValidDraft> {
        let mut fields = BTreeMap::new();

        let required = [
            ("job_title", &self.job_title),
            ("company", &self.company),
            ("location", &self.location),
            ("description", &self.description),
            ("how_to_apply", &self.how_to_apply),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                fields.insert(name.to_string(), "is required".to_string());
            }
        }

        let company_email = self.company_email.trim().to_string();
        if !is_email(&company_email) {
            fields.insert(
                "company_email".to_string(),
                "must be a valid email address".to_string(),
            );
        }

        let company_url = non_blank(self.company_url);
        if let Some(url) = &company_url
            && url::Url::parse(url).is_err()
        {
            fields.insert(
                "company_url".to_string(),
                "must be an absolute URL".to_string(),
            );
        }

        let how_to_apply = self.how_to_apply.trim().to_string();
        if !how_to_apply.is_empty()
            && !is_email(&how_to_apply)
            && url::Url::parse(&how_to_apply).is_err()
        {
            fields.insert(
                "how_to_apply".to_string(),
                "must be an email address or an absolute URL".to_string(),
            );
        }

        let salary_min = parse_salary(&self.salary_min, "salary_min", &mut fields);
        let salary_max = parse_salary(&self.salary_max, "salary_max", &mut fields);
        if let (Some(min), Some(max)) = (salary_min, salary_max)
            && min > max
        {
            fields.insert(
                "salary_max".to_string(),
                "must not be lower than salary_min".to_string(),
            );
        }

        let salary_currency = self.salary_currency.trim().to_string();
        if !SALARY_CURRENCIES.contains(&salary_currency.as_str()) {
            fields.insert(
                "salary_currency".to_string(),
                format!("must be one of {}", SALARY_CURRENCIES.join(" ")),
            );
        }

        if !fields.is_empty() {
            return Err(BoardError::Validation {
                message: "Job submission is invalid".to_string(),
                fields,
            });
        }

        Ok(ValidDraft {
            job_title: self.job_title.trim().to_string(),
            company: self.company.trim().to_string(),
            company_url,
            company_email,
            location: self.location.trim().to_string(),
            salary_min: salary_min.unwrap_or_default(),
            salary_max: salary_max.unwrap_or_default(),
            salary_currency,
            description: self.description.trim().to_string(),
            perks: non_blank(self.perks),
            interview_process: non_blank(self.interview_process),
            how_to_apply,
            company_icon_id: non_blank(self.company_icon_id),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_salary(raw: &str, field: &str, fields: &mut BTreeMap<String, String>) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 0 => Some(value),
        _ => {
            fields.insert(
                field.to_string(),
                "must be a non-negative whole number".to_string(),
            );
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_draft() -> JobDraft {
        JobDraft {
            job_title: "Senior Go Engineer".to_string(),
            company: "Acme".to_string(),
            company_url: Some("https://acme.example".to_string()),
            company_email: "hiring@acme.example".to_string(),
            location: "Berlin".to_string(),
            salary_min: " 60000 ".to_string(),
            salary_max: "90000".to_string(),
            salary_currency: "€".to_string(),
            description: "Build things in Go and Postgres.".to_string(),
            perks: Some("  ".to_string()),
            interview_process: None,
            how_to_apply: "https://acme.example/jobs/1".to_string(),
            company_icon_id: None,
        }
    }

    #[test]
    fn valid_draft_is_trimmed_and_parsed() {
        let valid = sample_draft().validate().expect("valid");
        assert_eq!(valid.salary_min, 60_000);
        assert_eq!(valid.salary_max, 90_000);
        assert_eq!(valid.perks, None);
    }

    #[test]
    fn collects_every_invalid_field() {
        let draft = JobDraft {
            job_title: " ".to_string(),
            salary_min: "lots".to_string(),
            salary_currency: "¥".to_string(),
            company_email: "not-an-email".to_string(),
            ..sample_draft()
        };

        match draft.validate() {
            Err(BoardError::Validation { fields, .. }) => {
                assert!(fields.contains_key("job_title"));
                assert!(fields.contains_key("salary_min"));
                assert!(fields.contains_key("salary_currency"));
                assert!(fields.contains_key("company_email"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inverted_salary_range() {
        let draft = JobDraft {
            salary_min: "100".to_string(),
            salary_max: "10".to_string(),
            ..sample_draft()
        };
        assert!(matches!(
            draft.validate(),
            Err(BoardError::Validation { fields, .. }) if fields.contains_key("salary_max")
        ));
    }

    #[test]
    fn how_to_apply_accepts_email_or_url() {
        let email = JobDraft {
            how_to_apply: "jobs@acme.example".to_string(),
            ..sample_draft()
        };
        assert!(email.validate().is_ok());

        let neither = JobDraft {
            how_to_apply: "call us maybe".to_string(),
            ..sample_draft()
        };
        assert!(neither.validate().is_err());
    }

    #[test]
    fn email_detection() {
        assert!(is_email("a.b+c@example.co.uk"));
        assert!(!is_email("https://example.com"));
        assert!(!is_email("foo@bar"));
    }
}
