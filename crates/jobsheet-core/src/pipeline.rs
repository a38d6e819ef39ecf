use std::collections::HashSet;
use std::path::Path;

use futures::stream::{self, StreamExt};
use url::Url;

use crate::cleaner::ListingCleaner;
use crate::config::ScrapeConfig;
use crate::error::AppError;
use crate::models::{JobListing, ListingPage, PageRequest, RunReport};
use crate::retry::RetryingFetcher;
use crate::traits::{Fetcher, PageParser, ReportWriter};

/// Orchestrates a run: paginate → enrich → close session → clean → dedupe → write.
///
/// Generic over all external collaborators via traits, enabling dependency
/// injection and testability without a real browser or filesystem.
pub struct ScrapeService<F, P, W>
where
    F: Fetcher,
    P: PageParser,
    W: ReportWriter,
{
    fetcher: RetryingFetcher<F>,
    parser: P,
    writer: W,
    cleaner: ListingCleaner,
    config: ScrapeConfig,
}

/// Raw results of the network phase.
#[derive(Debug, Default)]
pub struct Collection {
    pub pages_visited: usize,
    pub cards_dropped: usize,
    pub detail_failures: usize,
    /// Enriched listings in discovery order.
    pub listings: Vec<JobListing>,
}

impl<F, P, W> ScrapeService<F, P, W>
where
    F: Fetcher,
    P: PageParser,
    W: ReportWriter,
{
    pub fn new(fetcher: F, parser: P, writer: W, config: ScrapeConfig) -> Self {
        Self {
            fetcher: RetryingFetcher::new(fetcher, config.retry.clone()),
            parser,
            writer,
            cleaner: ListingCleaner::new(config.sentinel.clone()),
            config,
        }
    }

    /// Run the full pipeline and write the report to `dest`.
    ///
    /// Page and detail failures are logged and absorbed. The fetcher is
    /// closed exactly once before reporting. Only the report write can fail
    /// the run.
    pub async fn run(&self, dest: &Path) -> Result<RunReport, AppError> {
        let collection = self.collect().await;

        if let Err(e) = self.fetcher.close().await {
            tracing::warn!(error = %e, "Failed to close fetcher session");
        }

        let listings_found = collection.listings.len();
        let cleaned: Vec<JobListing> = collection
            .listings
            .into_iter()
            .map(|listing| self.cleaner.clean(listing))
            .collect();

        let (rows, duplicates_removed) = if self.config.keep_duplicates {
            (cleaned, 0)
        } else {
            remove_duplicates(cleaned)
        };
        if duplicates_removed > 0 {
            tracing::info!(duplicates_removed, "Removed duplicate listings");
        }

        let summary = self.writer.write(&rows, dest)?;
        tracing::info!(
            rows = summary.data_rows,
            output = %dest.display(),
            "Saved job records"
        );

        Ok(RunReport {
            pages_visited: collection.pages_visited,
            listings_found,
            cards_dropped: collection.cards_dropped,
            detail_failures: collection.detail_failures,
            duplicates_removed,
            rows_written: summary.data_rows,
            output: dest.to_path_buf(),
            listings: rows,
        })
    }

    /// Walk every index page, then enrich the collected listings.
    pub async fn collect(&self) -> Collection {
        let mut pager = Pager::new(&self.fetcher, &self.parser, &self.config);
        let mut listings = Vec::new();
        let mut cards_dropped = 0;

        while let Some(page) = pager.next_page().await {
            cards_dropped += page.dropped;
            listings.extend(page.listings);
        }
        tracing::info!(
            total = listings.len(),
            pages = pager.pages_visited(),
            "Collected job cards (pre-details)"
        );

        let (listings, detail_failures) = self.enrich(listings).await;

        Collection {
            pages_visited: pager.pages_visited(),
            cards_dropped,
            detail_failures,
            listings,
        }
    }

    /// Fetch each listing's detail page with bounded concurrency.
    ///
    /// `result[i]` always corresponds to `listings[i]`; failed fetches leave
    /// the description empty. Returns the listings and the failure count.
    pub async fn enrich(&self, listings: Vec<JobListing>) -> (Vec<JobListing>, usize) {
        let total = listings.len();
        let concurrency = self.config.detail_concurrency.max(1);

        let mut details = stream::iter(listings.into_iter().enumerate())
            .map(|(idx, listing)| self.enrich_one(idx, listing))
            .buffered(concurrency);

        let mut enriched = Vec::with_capacity(total);
        let mut failures = 0;
        while let Some((listing, fetched)) = details.next().await {
            if !fetched {
                failures += 1;
            }
            enriched.push(listing);

            let done = enriched.len();
            if done % 10 == 0 || done == total {
                tracing::info!(done, total, "Processed job details");
            }
        }

        (enriched, failures)
    }

    async fn enrich_one(&self, idx: usize, mut listing: JobListing) -> (JobListing, bool) {
        let request = PageRequest::new(
            listing.detail_url.clone(),
            self.config.detail_ready_selector.clone(),
            self.config.detail_timeout,
        );

        match self.fetcher.fetch(&request).await {
            Ok(html) => {
                listing.merge_detail(self.parser.parse_detail(&html));
                (listing, true)
            }
            Err(e) => {
                tracing::warn!(
                    job = idx + 1,
                    url = %listing.detail_url,
                    error = %e,
                    "Detail fetch failed, keeping listing without description"
                );
                (listing, false)
            }
        }
    }
}

/// Normalized form of `url` for the loop guard, so spellings of the same
/// page (host case, default port, empty path) compare equal.
fn visit_key(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), String::from)
}

/// Lazy, finite walk over index pages.
///
/// Each call to [`Pager::next_page`] loads one page on demand. The walk ends
/// when a page has no next link or no cards, `max_pages` is reached, a link
/// points back to a visited page, or a page cannot be loaded.
pub struct Pager<'a, F: Fetcher, P: PageParser> {
    fetcher: &'a F,
    parser: &'a P,
    config: &'a ScrapeConfig,
    next_url: Option<String>,
    visited: HashSet<String>,
    pages_visited: usize,
}

impl<'a, F: Fetcher, P: PageParser> Pager<'a, F, P> {
    pub fn new(fetcher: &'a F, parser: &'a P, config: &'a ScrapeConfig) -> Self {
        Self {
            fetcher,
            parser,
            config,
            next_url: Some(config.start_url.clone()),
            visited: HashSet::new(),
            pages_visited: 0,
        }
    }

    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    pub async fn next_page(&mut self) -> Option<ListingPage> {
        let url = self.next_url.take()?;

        if let Some(max) = self.config.max_pages {
            if self.pages_visited >= max {
                tracing::info!(max_pages = max, "Reached page limit, stopping pagination");
                return None;
            }
        }
        if !self.visited.insert(visit_key(&url)) {
            tracing::warn!(%url, "Next link points to a visited page, stopping pagination");
            return None;
        }
        if self.pages_visited > 0 && !self.config.page_delay.is_zero() {
            tokio::time::sleep(self.config.page_delay).await;
        }

        let page_number = self.pages_visited + 1;
        tracing::info!(page = page_number, %url, "Loading page");

        let request = PageRequest::new(
            url.clone(),
            self.config.listing_ready_selector.clone(),
            self.config.listing_timeout,
        );
        let html = match self.fetcher.fetch(&request).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(
                    page = page_number,
                    %url,
                    error = %e,
                    "Failed to load page, stopping pagination"
                );
                return None;
            }
        };
        self.pages_visited = page_number;

        let page = self.parser.parse_listings(&html, &url);
        tracing::info!(
            page = page_number,
            found = page.listings.len(),
            dropped = page.dropped,
            "Found job cards"
        );

        if page.listings.is_empty() && page.dropped == 0 {
            tracing::info!(page = page_number, "Page has no job cards, end of listings");
        } else {
            self.next_url = page.next_page.clone();
        }

        Some(page)
    }
}

/// Drop records identical to an earlier one, keeping first occurrences.
///
/// Returns the surviving records in order and how many were removed.
pub fn remove_duplicates(listings: Vec<JobListing>) -> (Vec<JobListing>, usize) {
    let before = listings.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<JobListing> = listings
        .into_iter()
        .filter(|listing| seen.insert(listing.clone()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
