//! Derived-value transforms applied to raw field text
//!
//! Every transform returns `None` when the input doesn't have the expected
//! shape; the caller substitutes the field default.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Datetime layouts seen in `time[title]` attributes
const DATETIME_FORMATS: &[&str] = &[
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only layouts, read as midnight
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Parses "Rated 4 out of 5 stars" into 4
pub fn parse_rating(text: &str) -> Option<u8> {
    let mut tokens = text.split_whitespace();
    if !tokens.next()?.eq_ignore_ascii_case("rated") {
        return None;
    }
    tokens
        .next()?
        .parse::<u8>()
        .ok()
        .filter(|rating| (1..=5).contains(rating))
}

/// Parses the number in parentheses, e.g. "Helpful (12)" into 12
pub fn parse_parenthesized_count(text: &str) -> Option<u32> {
    let start = text.find('(')? + 1;
    let len = text[start..].find(')')?;
    text[start..start + len]
        .trim()
        .replace(',', "")
        .parse()
        .ok()
}

/// Extracts "3 weeks" from "Posted 2 years ago. Owned for 3 weeks when reviewed."
pub fn parse_ownership(text: &str) -> Option<String> {
    let (_, rest) = text.split_once("Owned for")?;
    let duration = match rest.split_once("when reviewed") {
        Some((duration, _)) => duration,
        None => rest,
    };
    let duration = duration.trim().trim_end_matches('.').trim();
    (!duration.is_empty()).then(|| duration.to_string())
}

/// Parses a review or brand-response timestamp
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// True for the incentivized-review disclosure
pub fn mentions_promo(text: &str) -> bool {
    text.to_lowercase().contains("promo considerations")
}
