use std::time::Duration;

use jobsheet_core::error::AppError;
use jobsheet_core::models::PageRequest;
use jobsheet_core::traits::Fetcher;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

pub(crate) const USER_AGENT: &str = "jobsheet/0.1 (listing scraper)";

/// HTTP fetcher using reqwest.
///
/// Downloads static HTML and checks that the readiness selector is present
/// in the response, so a truncated or placeholder page counts as a transient
/// failure just like it would in the browser.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String, AppError> {
        let url = validate_url(&request.url)?;

        let response = self
            .client
            .get(url)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(request.timeout.as_millis() as u64)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: request.url.clone(),
            });
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(request.timeout.as_millis() as u64)
            } else {
                AppError::NetworkError(format!("Failed to read response body: {e}"))
            }
        })?;

        ensure_ready(&html, request)?;
        Ok(html)
    }
}

/// Parse a page URL, allowing only `http` and `https`.
pub(crate) fn validate_url(url: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(AppError::InvalidUrl(format!(
            "URL scheme '{scheme}' is not allowed (only http/https): {url}"
        ))),
    }
}

/// Fail with [`AppError::SelectorNotFound`] unless `html` contains the
/// request's readiness selector.
fn ensure_ready(html: &str, request: &PageRequest) -> Result<(), AppError> {
    let selector =
        Selector::parse(&request.ready_selector).map_err(|e| AppError::InvalidSelector {
            selector: request.ready_selector.clone(),
            message: e.to_string(),
        })?;

    if Html::parse_document(html).select(&selector).next().is_none() {
        return Err(AppError::SelectorNotFound {
            selector: request.ready_selector.clone(),
            url: request.url.clone(),
        });
    }
    Ok(())
}
