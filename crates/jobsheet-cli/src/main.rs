use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "browser")]
use jobsheet_client::{BrowserFetcher, BrowserOptions};
use jobsheet_client::{HtmlPageParser, ListingSelectors, ReqwestFetcher, XlsxReportWriter};
use jobsheet_core::config::DEFAULT_START_URL;
use jobsheet_core::{Fetcher, RetryPolicy, RunReport, ScrapeConfig, ScrapeService};

#[derive(Parser)]
#[command(
    name = "jobsheet",
    version,
    about = "Scrape a job board into a styled spreadsheet"
)]
struct Cli {
    /// First listings page; later pages are found through next links
    #[arg(short, long, env = "JOBSHEET_URL", default_value = DEFAULT_START_URL)]
    url: String,

    /// Spreadsheet to write
    #[arg(short, long, env = "JOBSHEET_OUTPUT", default_value = "fake_jobs.xlsx")]
    output: PathBuf,

    /// Stop after this many listing pages
    #[arg(long, env = "JOBSHEET_MAX_PAGES")]
    max_pages: Option<usize>,

    /// Detail pages fetched concurrently (1 = sequential)
    #[arg(short, long, env = "JOBSHEET_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Attempts per page before giving up
    #[arg(long, env = "JOBSHEET_RETRIES", default_value_t = 3)]
    retries: u32,

    /// How pages are loaded
    #[arg(long, value_enum, env = "JOBSHEET_ENGINE", default_value_t = Engine::default())]
    engine: Engine,

    /// Show the browser window (browser engine only)
    #[arg(long, default_value_t = false)]
    headed: bool,

    /// Listing page load timeout in milliseconds
    #[arg(long, default_value_t = 15_000)]
    nav_timeout_ms: u64,

    /// Detail page load timeout in milliseconds
    #[arg(long, default_value_t = 5_000)]
    detail_timeout_ms: u64,

    /// Keep identical rows instead of collapsing them
    #[arg(long, default_value_t = false)]
    keep_duplicates: bool,

    /// Also print the cleaned listings as JSON to stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Headless Chromium
    Browser,
    /// Plain HTTP requests
    Http,
}

impl Default for Engine {
    fn default() -> Self {
        if cfg!(feature = "browser") {
            Engine::Browser
        } else {
            Engine::Http
        }
    }
}

impl Cli {
    fn scrape_config(&self) -> ScrapeConfig {
        let mut config = ScrapeConfig::new(&self.url)
            .with_detail_concurrency(self.concurrency)
            .with_retry(RetryPolicy::new(self.retries))
            .with_keep_duplicates(self.keep_duplicates);
        config.max_pages = self.max_pages;
        config.listing_timeout = Duration::from_millis(self.nav_timeout_ms);
        config.detail_timeout = Duration::from_millis(self.detail_timeout_ms);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobsheet=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.scrape_config();

    let parser =
        HtmlPageParser::new(ListingSelectors::default()).context("Invalid listing selectors")?;
    let writer = XlsxReportWriter::new(&config.start_url).with_sentinel(&config.sentinel);

    tracing::info!(url = %config.start_url, engine = ?cli.engine, "Starting scrape");

    let report = match cli.engine {
        Engine::Http => {
            let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
            run(fetcher, parser, writer, config, &cli.output).await?
        }
        Engine::Browser => {
            #[cfg(feature = "browser")]
            {
                let options = BrowserOptions {
                    headless: !cli.headed,
                    ..BrowserOptions::default()
                };
                let fetcher = BrowserFetcher::launch(options)
                    .await
                    .context("Failed to launch browser")?;
                run(fetcher, parser, writer, config, &cli.output).await?
            }
            #[cfg(not(feature = "browser"))]
            {
                anyhow::bail!("jobsheet was built without the `browser` feature; use --engine http")
            }
        }
    };

    tracing::info!(
        pages = report.pages_visited,
        found = report.listings_found,
        dropped = report.cards_dropped,
        detail_failures = report.detail_failures,
        duplicates_removed = report.duplicates_removed,
        "Run complete"
    );
    eprintln!(
        "Saved {} job records to {}",
        report.rows_written,
        report.output.display()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.listings)?);
    }

    Ok(())
}

async fn run<F: Fetcher>(
    fetcher: F,
    parser: HtmlPageParser,
    writer: XlsxReportWriter,
    config: ScrapeConfig,
    output: &Path,
) -> Result<RunReport> {
    let service = ScrapeService::new(fetcher, parser, writer, config);
    service
        .run(output)
        .await
        .with_context(|| format!("Failed to write report to {}", output.display()))
}
