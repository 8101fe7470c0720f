//! Input format rules shared by body and path validation.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

pub static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());
pub static BATCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9-]+$").unwrap());
pub static KIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").unwrap());
pub static SPONSOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\s&.-]+$").unwrap());
/// Trial identifiers and protocol numbers.
pub static TRIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());
pub static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
/// At least one non-whitespace character.
pub static NON_BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S").unwrap());
pub static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").unwrap());

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_expiry_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn validate_expiry_date(value: &str) -> Result<(), ValidationError> {
    let Some(date) = parse_expiry_date(value) else {
        return Err(error("date_format", "Invalid date format - use YYYY-MM-DD"));
    };
    if date < Utc::now() {
        return Err(error("date_past", "Expiry date cannot be in the past"));
    }
    Ok(())
}

pub fn validate_languages(languages: &[String]) -> Result<(), ValidationError> {
    if languages.iter().all(|l| LANGUAGE_RE.is_match(l)) {
        Ok(())
    } else {
        Err(error(
            "language",
            "Languages must be codes like 'en' or 'fr-CA'",
        ))
    }
}
