//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;
use chrono::{DateTime, Utc};
use regex::Regex;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok()
        })
        .as_ref()
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email))
}

/// Trim and lowercase an email so uniqueness is checked on one spelling
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a slot time for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("jean.dupont@example.fr"));
        assert!(is_valid_email("a+b@lycee.ac-lyon.fr"));
        assert!(!is_valid_email("jean.dupont"));
        assert!(!is_valid_email("@example.fr"));
        assert!(!is_valid_email("jean@example"));
        assert!(!is_valid_email("jean @example.fr"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jean@Example.FR "), "jean@example.fr");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  TG   1ST\tCS "), "TG 1ST CS");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 25, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2025-01-25 09:30 UTC");
    }
}
