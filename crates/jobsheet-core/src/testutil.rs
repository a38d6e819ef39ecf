//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{DetailFields, JobListing, ListingPage, PageRequest, ReportSummary};
use crate::traits::{Fetcher, PageParser, ReportWriter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FetcherState {
    pages: HashMap<String, String>,
    /// Remaining forced failures per URL.
    failures: HashMap<String, (u32, fn() -> AppError)>,
    requests: Vec<String>,
    closes: u32,
}

/// Mock fetcher serving canned HTML per URL.
///
/// Unknown URLs answer with HTTP 404, which is not retried.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<FetcherState>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    /// Fail the next `times` fetches of `url` with `error()`.
    pub fn fail_times(&self, url: &str, times: u32, error: fn() -> AppError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(url.to_string(), (times, error));
    }

    pub fn always_fail(&self, url: &str, error: fn() -> AppError) {
        self.fail_times(url, u32::MAX, error);
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub fn close_count(&self) -> u32 {
        self.state.lock().unwrap().closes
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String, AppError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.url.clone());

        if let Some((remaining, error)) = state.failures.get_mut(&request.url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error());
            }
        }

        state
            .pages
            .get(&request.url)
            .cloned()
            .ok_or_else(|| AppError::HttpStatus {
                status: 404,
                url: request.url.clone(),
            })
    }

    async fn close(&self) -> Result<(), AppError> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockParser
// ---------------------------------------------------------------------------

/// Mock parser keyed by the exact HTML it receives.
///
/// Unregistered HTML parses as an empty page / empty detail.
#[derive(Clone, Default)]
pub struct MockParser {
    pages: Arc<Mutex<HashMap<String, ListingPage>>>,
    details: Arc<Mutex<HashMap<String, DetailFields>>>,
}

impl MockParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, html: &str, page: ListingPage) -> Self {
        self.pages.lock().unwrap().insert(html.to_string(), page);
        self
    }

    pub fn with_detail(self, html: &str, detail: DetailFields) -> Self {
        self.details.lock().unwrap().insert(html.to_string(), detail);
        self
    }
}

impl PageParser for MockParser {
    fn parse_listings(&self, html: &str, _page_url: &str) -> ListingPage {
        self.pages
            .lock()
            .unwrap()
            .get(html)
            .cloned()
            .unwrap_or_default()
    }

    fn parse_detail(&self, html: &str) -> DetailFields {
        self.details
            .lock()
            .unwrap()
            .get(html)
            .cloned()
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// MockReportWriter
// ---------------------------------------------------------------------------

/// Mock writer that records what it was asked to write.
#[derive(Clone, Default)]
pub struct MockReportWriter {
    pub written: Arc<Mutex<Vec<(PathBuf, Vec<JobListing>)>>>,
    fail: bool,
}

impl MockReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer that fails as if the destination were unwritable.
    pub fn failing() -> Self {
        Self {
            written: Arc::default(),
            fail: true,
        }
    }

    /// Listings passed to the most recent write.
    pub fn last_rows(&self) -> Vec<JobListing> {
        self.written
            .lock()
            .unwrap()
            .last()
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }
}

impl ReportWriter for MockReportWriter {
    fn write(&self, listings: &[JobListing], dest: &Path) -> Result<ReportSummary, AppError> {
        if self.fail {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not writable", dest.display()),
            )));
        }
        self.written
            .lock()
            .unwrap()
            .push((dest.to_path_buf(), listings.to_vec()));
        Ok(ReportSummary {
            data_rows: listings.len(),
            footer_row: listings.len() as u32 + 2,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A listing with every card field populated, keyed by `n`.
pub fn make_test_listing(n: usize) -> JobListing {
    JobListing {
        title: format!("Job {n}"),
        company: format!("Company {n}"),
        location: Some(format!("City {n}")),
        date_posted: Some("2021-04-08".to_string()),
        logo_url: Some(format!("https://example.com/logo/{n}.png")),
        detail_url: detail_url(n),
        description: None,
    }
}

pub fn detail_url(n: usize) -> String {
    format!("https://example.com/jobs/{n}.html")
}

/// Canned HTML for the detail page of listing `n`.
pub fn detail_html(n: usize) -> String {
    format!("<detail {n}>")
}
