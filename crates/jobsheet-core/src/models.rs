use std::path::PathBuf;
use std::time::Duration;

/// Placeholder written in place of missing or empty data.
pub const SENTINEL: &str = "N/A";

/// Report column labels, in the same order as the [`JobListing`] fields.
pub const COLUMNS: [&str; 7] = [
    "Job Title",
    "Company Name",
    "Location",
    "Date Posted",
    "Logo URL",
    "Job Detail URL",
    "Job Description",
];

/// One job posting, and one row of the output report.
///
/// Built by the parser from a listing card, given its description by the
/// enricher and resolved by the cleaner. Optional fields stay `None` until
/// cleaning replaces them with [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub date_posted: Option<String>,
    pub logo_url: Option<String>,
    pub detail_url: String,
    pub description: Option<String>,
}

impl JobListing {
    pub fn new(title: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: String::new(),
            location: None,
            date_posted: None,
            logo_url: None,
            detail_url: detail_url.into(),
            description: None,
        }
    }

    /// Cell values in [`COLUMNS`] order. Missing optionals render as empty.
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.title,
            &self.company,
            self.location.as_deref().unwrap_or(""),
            self.date_posted.as_deref().unwrap_or(""),
            self.logo_url.as_deref().unwrap_or(""),
            &self.detail_url,
            self.description.as_deref().unwrap_or(""),
        ]
    }

    /// Merge the fields scraped from this listing's detail page.
    ///
    /// The description always comes from the detail page. A location found
    /// there takes precedence over the one printed on the card.
    pub fn merge_detail(&mut self, detail: DetailFields) {
        if detail.location.is_some() {
            self.location = detail.location;
        }
        self.description = detail.description;
    }
}

/// Everything a fetcher needs to load one page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    /// CSS selector whose presence marks the page as rendered.
    pub ready_selector: String,
    pub timeout: Duration,
}

impl PageRequest {
    pub fn new(url: impl Into<String>, ready_selector: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            ready_selector: ready_selector.into(),
            timeout,
        }
    }
}

/// One parsed index page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    /// Well-formed listings in DOM order.
    pub listings: Vec<JobListing>,
    /// Cards skipped for lacking a title or detail link.
    pub dropped: usize,
    /// Absolute URL of the following page, if the page links one.
    pub next_page: Option<String>,
}

/// Fields scraped from a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub location: Option<String>,
    pub description: Option<String>,
}

/// What the report writer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    /// Number of body rows (one per listing).
    pub data_rows: usize,
    /// Zero-based sheet row holding the source/timestamp footer.
    pub footer_row: u32,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub pages_visited: usize,
    pub listings_found: usize,
    pub cards_dropped: usize,
    pub detail_failures: usize,
    pub duplicates_removed: usize,
    pub rows_written: usize,
    pub output: PathBuf,
    /// Cleaned listings in report order.
    pub listings: Vec<JobListing>,
}
