//! Record normalization applied between enrichment and reporting.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{JobListing, SENTINEL};

/// Canonical output form for dates that parse.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_INPUT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Trims fields, fills gaps with a sentinel and canonicalizes dates.
///
/// Total and idempotent: cleaning a cleaned record returns it unchanged.
#[derive(Debug, Clone)]
pub struct ListingCleaner {
    sentinel: String,
}

impl Default for ListingCleaner {
    fn default() -> Self {
        Self::new(SENTINEL)
    }
}

impl ListingCleaner {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn clean(&self, listing: JobListing) -> JobListing {
        JobListing {
            title: listing.title.trim().to_string(),
            company: self.fill(Some(listing.company)).unwrap_or_default(),
            location: self.fill(listing.location),
            date_posted: self.fill(listing.date_posted.map(|d| normalize_date(&d))),
            logo_url: self.fill(listing.logo_url),
            detail_url: listing.detail_url.trim().to_string(),
            description: self.fill(listing.description),
        }
    }

    fn fill(&self, value: Option<String>) -> Option<String> {
        let trimmed = value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(self.sentinel.as_str());
        Some(trimmed.to_string())
    }
}

/// Rewrite a date into [`DATE_FORMAT`] if it matches a known layout,
/// otherwise return it trimmed.
pub fn normalize_date(raw: &str) -> String {
    let value = raw.trim();

    for format in DATE_INPUT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.format(DATE_FORMAT).to_string();
        }
    }
    for format in DATETIME_INPUT_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return datetime.date().format(DATE_FORMAT).to_string();
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return datetime.date_naive().format(DATE_FORMAT).to_string();
    }

    value.to_string()
}
