use std::time::Duration;

use crate::models::SENTINEL;
use crate::retry::RetryPolicy;

pub const DEFAULT_START_URL: &str = "https://realpython.github.io/fake-jobs/";

/// Run configuration for [`crate::pipeline::ScrapeService`].
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// First index page; later pages are discovered through next links.
    pub start_url: String,
    /// Stop after this many index pages. `None` follows links to the end.
    pub max_pages: Option<usize>,
    /// Pause between consecutive index pages.
    pub page_delay: Duration,
    /// Detail pages fetched at once. 1 is fully sequential.
    pub detail_concurrency: usize,
    /// Selector marking an index page as rendered.
    pub listing_ready_selector: String,
    pub listing_timeout: Duration,
    /// Selector marking a detail page as rendered.
    pub detail_ready_selector: String,
    pub detail_timeout: Duration,
    pub retry: RetryPolicy,
    /// Keep exact duplicate rows instead of collapsing them.
    pub keep_duplicates: bool,
    pub sentinel: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            max_pages: None,
            page_delay: Duration::from_millis(200),
            detail_concurrency: 4,
            listing_ready_selector: "div.card-content".to_string(),
            listing_timeout: Duration::from_secs(15),
            detail_ready_selector: "div.box".to_string(),
            detail_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            keep_duplicates: false,
            sentinel: SENTINEL.to_string(),
        }
    }
}

impl ScrapeConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            ..Self::default()
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_keep_duplicates(mut self, keep: bool) -> Self {
        self.keep_duplicates = keep;
        self
    }
}
