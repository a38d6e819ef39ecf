#[cfg(feature = "browser")]
pub mod browser_fetcher;
pub mod fetcher;
pub mod parser;
pub mod report;

#[cfg(feature = "browser")]
pub use browser_fetcher::{BrowserFetcher, BrowserOptions};
pub use fetcher::ReqwestFetcher;
pub use parser::{HtmlPageParser, ListingSelectors};
pub use report::XlsxReportWriter;
