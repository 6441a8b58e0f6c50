//! Field-level predicates shared by the CV and user forms.
//!
//! Every predicate is total: it returns `false` for malformed input and never panics.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length (in characters) for name-like fields.
pub const MIN_TEXT_LEN: usize = 2;
pub const MIN_SKILL_LEN: usize = 2;
pub const MIN_YEAR: i32 = 1960;
pub const MAX_WORDS: usize = 150;

// Letters include Latin-1 accented and Nordic letters (æ, ø, å, ...).
static NAME_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-ZÀ-ÖØ-öø-ÿ\s-]+$").expect("valid name regex"));
static SKILL_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-ZÀ-ÖØ-öø-ÿ\s+#.-]+$").expect("valid skill regex"));
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+[0-9]{2,4}\s?[0-9]{8}|[0-9]{8})$").expect("valid phone regex")
});
static YEARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(19|20)[0-9]{2}-((19|20)[0-9]{2}|Present)$").expect("valid years regex")
});

pub(crate) fn is_name_like(value: &str, min_len: usize) -> bool {
    value.chars().count() >= min_len && NAME_CHARSET.is_match(value)
}

pub fn validate_name(name: &str) -> bool {
    is_name_like(name, MIN_TEXT_LEN)
}

pub fn validate_title(title: &str) -> bool {
    is_name_like(title, MIN_TEXT_LEN)
}

pub fn validate_company(company: &str) -> bool {
    is_name_like(company, MIN_TEXT_LEN)
}

pub fn validate_institution(institution: &str) -> bool {
    is_name_like(institution, MIN_TEXT_LEN)
}

pub fn validate_degree(degree: &str) -> bool {
    is_name_like(degree, MIN_TEXT_LEN)
}

pub fn validate_ref_name(name: &str) -> bool {
    is_name_like(name, MIN_TEXT_LEN)
}

/// Skills additionally admit `+`, `#` and `.` ("C++", "C#", "Node.js").
pub fn validate_skill(skill: &str) -> bool {
    skill.chars().count() >= MIN_SKILL_LEN && SKILL_CHARSET.is_match(skill)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Accepts `+47 12345678`, `+4712345678` or `12345678`. Prefix is 2 to 4 digits.
pub fn validate_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

pub fn validate_contact_info(contact_info: &str) -> bool {
    validate_email(contact_info) || validate_phone(contact_info)
}

/// Year between 1960 and the current calendar year, inclusive.
pub fn validate_year(year: &str) -> bool {
    validate_year_at(year, Utc::now().year())
}

pub fn validate_year_at(year: &str, current_year: i32) -> bool {
    match year.trim().parse::<i32>() {
        Ok(y) => (MIN_YEAR..=current_year).contains(&y),
        Err(_) => false,
    }
}

/// `YYYY-YYYY` or `YYYY-Present`, each year in 19xx or 20xx.
pub fn validate_years(years: &str) -> bool {
    YEARS.is_match(years)
}

pub fn validate_description(description: &str) -> bool {
    word_count(description) <= MAX_WORDS
}

pub fn validate_projects(projects: &str) -> bool {
    word_count(projects) <= MAX_WORDS
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_accepts_nordic_letters_and_hyphen() {
        assert!(validate_name("Kari Nordmann"));
        assert!(validate_name("Åse Bjørnstad-Øvre"));
        assert!(validate_name("José"));
        assert!(validate_name("Al"));
    }

    #[test]
    fn test_name_rejects_short_digits_and_symbols() {
        assert!(!validate_name("A"));
        assert!(!validate_name(""));
        assert!(!validate_name("R2D2"));
        assert!(!validate_name("O'Brien"));
    }

    #[test]
    fn test_skill_admits_language_tokens() {
        assert!(validate_skill("C++"));
        assert!(validate_skill("C#"));
        assert!(validate_skill("Node.js"));
        assert!(!validate_skill("C"));
        assert!(!validate_skill("HTML5"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("user@example.com"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("us er@example.com"));
        assert!(!validate_email("a@b@c.com"));
    }

    #[test]
    fn test_phone_shapes() {
        assert!(validate_phone("+47 12345678"));
        assert!(validate_phone("+4712345678"));
        assert!(validate_phone("+1234 12345678"));
        assert!(validate_phone("12345678"));
        assert!(!validate_phone("+4 12345678"));
        assert!(!validate_phone("1234567"));
        assert!(!validate_phone("+47  12345678"));
    }

    #[test]
    fn test_contact_info_email_or_phone() {
        assert!(validate_contact_info("ref@example.com"));
        assert!(validate_contact_info("87654321"));
        assert!(!validate_contact_info("call me"));
    }

    #[test]
    fn test_year_bounds() {
        let current = Utc::now().year();
        assert!(validate_year(&current.to_string()));
        assert!(validate_year("1960"));
        assert!(!validate_year("1959"));
        assert!(!validate_year("2999"));
        assert!(!validate_year("twenty"));
    }

    #[test]
    fn test_year_at_fixed_clock() {
        assert!(validate_year_at("2024", 2024));
        assert!(!validate_year_at("2025", 2024));
        assert!(validate_year_at(" 2000 ", 2024));
        assert!(!validate_year_at("2000abc", 2024));
    }

    #[test]
    fn test_years_ranges() {
        assert!(validate_years("2020-2023"));
        assert!(validate_years("2020-Present"));
        assert!(validate_years("1999-2001"));
        assert!(!validate_years("2020-20"));
        assert!(!validate_years("Present-2020"));
        assert!(!validate_years("1899-1900"));
        assert!(!validate_years("2020 - 2023"));
    }

    #[test]
    fn test_description_word_cap() {
        assert!(validate_description(""));
        assert!(validate_description(&"word ".repeat(150)));
        assert!(!validate_description(&"word ".repeat(151)));
        assert!(validate_projects("  spaced   out\twords \n"));
    }
}
