use std::future::Future;
use std::path::Path;

use crate::error::AppError;
use crate::models::{DetailFields, JobListing, ListingPage, PageRequest, ReportSummary};

/// Loads a page and returns its HTML once the readiness selector is present.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, request: &PageRequest) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Release the underlying session. Called once at the end of a run.
    fn close(&self) -> impl Future<Output = Result<(), AppError>> + Send {
        async { Ok(()) }
    }
}

/// Turns page HTML into listing records.
///
/// Parsing is total: malformed cards are skipped and counted, never an error.
pub trait PageParser: Send + Sync + Clone {
    /// Parse an index page. `page_url` resolves relative links.
    fn parse_listings(&self, html: &str, page_url: &str) -> ListingPage;

    /// Parse a detail page.
    fn parse_detail(&self, html: &str) -> DetailFields;
}

/// Renders cleaned listings into a report file at `dest`.
pub trait ReportWriter: Send + Sync {
    fn write(&self, listings: &[JobListing], dest: &Path) -> Result<ReportSummary, AppError>;
}
