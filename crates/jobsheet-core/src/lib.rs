pub mod cleaner;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use cleaner::ListingCleaner;
pub use config::ScrapeConfig;
pub use error::AppError;
pub use models::{
    COLUMNS, DetailFields, JobListing, ListingPage, PageRequest, ReportSummary, RunReport, SENTINEL,
};
pub use pipeline::ScrapeService;
pub use retry::{RetryPolicy, RetryingFetcher, retry};
pub use traits::{Fetcher, PageParser, ReportWriter};
