//! Search query classification
//!
//! Decides whether a raw query is an Ang (page) reference or free text, and
//! whether free text is Latin-script-like.

use crate::errors::{AppError, Result};
use regex_lite::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// First Ang of the scripture
pub const MIN_ANG: u16 = 1;

/// Last Ang of the scripture
pub const MAX_ANG: u16 = 1430;

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("static pattern"))
}

fn latin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9\s]+$").expect("static pattern"))
}

/// A validated Ang number in `MIN_ANG..=MAX_ANG`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AngNumber(u16);

impl AngNumber {
    /// Validate a digit string as an Ang number
    pub fn parse(digits: &str) -> Result<Self> {
        if !digits_pattern().is_match(digits) {
            return Err(AppError::validation("query", "Invalid Ang number"));
        }

        // Overlong digit strings are out of range, not malformed
        let value = digits.parse::<u32>().unwrap_or(u32::MAX);
        if value < u32::from(MIN_ANG) || value > u32::from(MAX_ANG) {
            return Err(AppError::validation(
                "query",
                format!("Ang number must be between {} and {}", MIN_ANG, MAX_ANG),
            ));
        }

        Ok(Self(value as u16))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for AngNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller's hint for which path to take (`type` query parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Ang,
    Search,
}

impl QueryKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ang" => Ok(QueryKind::Ang),
            "search" => Ok(QueryKind::Search),
            other => Err(AppError::validation(
                "type",
                format!("Unknown search type '{}', expected 'ang' or 'search'", other),
            )),
        }
    }
}

/// A classified search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Page lookup
    Ang(AngNumber),
    /// Free-text search (trimmed)
    FreeText(String),
}

impl SearchQuery {
    /// Classify a raw query. An explicit kind overrides auto-detection.
    pub fn classify(raw: &str, kind: Option<QueryKind>) -> Result<Self> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(AppError::MissingField {
                field: "query".to_string(),
            });
        }

        match kind {
            Some(QueryKind::Ang) => AngNumber::parse(query).map(SearchQuery::Ang),
            Some(QueryKind::Search) => Ok(SearchQuery::FreeText(query.to_string())),
            None if digits_pattern().is_match(query) => {
                AngNumber::parse(query).map(SearchQuery::Ang)
            }
            None => Ok(SearchQuery::FreeText(query.to_string())),
        }
    }

    /// Path label for logs and metrics
    pub fn path(&self) -> &'static str {
        match self {
            SearchQuery::Ang(_) => "ang",
            SearchQuery::FreeText(_) => "search",
        }
    }
}

/// Whether free text looks like Latin script (ASCII letters, digits, whitespace)
pub fn is_latin_script(text: &str) -> bool {
    latin_pattern().is_match(text)
}
