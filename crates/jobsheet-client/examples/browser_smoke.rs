/// Smoke-test for `BrowserFetcher`.
///
/// Launches a headless Chromium, loads the first listings page, parses it,
/// and checks that job cards came back before closing the session.
///
/// Run with:
///   cargo run --example browser_smoke --features browser
use std::time::Duration;

use jobsheet_client::{BrowserFetcher, HtmlPageParser, ListingSelectors};
use jobsheet_core::config::DEFAULT_START_URL;
use jobsheet_core::{Fetcher, PageParser, PageRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let fetcher = BrowserFetcher::new().await?;

    let request = PageRequest::new(DEFAULT_START_URL, "div.card-content", Duration::from_secs(15));
    println!("Fetching {} …", request.url);
    let fetched = fetcher.fetch(&request).await;
    fetcher.close().await?;
    let html = fetched?;

    let parser = HtmlPageParser::new(ListingSelectors::default())?;
    let page = parser.parse_listings(&html, DEFAULT_START_URL);

    assert!(!page.listings.is_empty(), "No job cards parsed from rendered HTML");

    println!(
        "OK: {} cards ({} dropped), first: {} @ {}",
        page.listings.len(),
        page.dropped,
        page.listings[0].title,
        page.listings[0].company
    );
    Ok(())
}
