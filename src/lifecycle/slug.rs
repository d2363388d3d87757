//! URL slug generation.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Lowercase `text`, transliterate accented Latin letters to ASCII, replace
/// every run of remaining non-alphanumeric characters with a single `-`, and
/// trim dashes from both ends.
pub fn slugify(text: &str) -> String {
    let ascii = transliterate(&text.to_lowercase());
    NON_SLUG_RE
        .replace_all(&ascii, "-")
        .trim_matches('-')
        .to_string()
}

/// Strip diacritics by compatibility decomposition; letters that do not
/// decompose get their conventional spelling.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'ø' => out.push('o'),
            'đ' | 'ð' => out.push('d'),
            'ł' => out.push('l'),
            'þ' => out.push_str("th"),
            other => out.push(other),
        }
    }
    out
}

/// Slug for a new posting. The creation timestamp keeps it unique across
/// reposts of the same title at the same company.
pub fn job_slug(title: &str, company: &str, created_unix: i64) -> String {
    slugify(&format!("{title} {company} {created_unix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_punctuation_and_spaces() {
        assert_eq!(slugify("  Senior Go/Rust Engineer!! "), "senior-go-rust-engineer");
        assert_eq!(slugify("C++ & Go"), "c-go");
    }

    #[test]
    fn transliterates_accented_letters() {
        assert_eq!(slugify("Zürich"), "zurich");
        assert_eq!(slugify("Crème Brûlée Café"), "creme-brulee-cafe");
        assert_eq!(slugify("Straße Øresund Łódź"), "strasse-oresund-lodz");
        assert_eq!(slugify("東京 Go"), "go");
    }

    #[test]
    fn job_slug_includes_timestamp() {
        assert_eq!(
            job_slug("Backend Engineer", "Acme Inc.", 1_700_000_000),
            "backend-engineer-acme-inc-1700000000"
        );
    }
}
