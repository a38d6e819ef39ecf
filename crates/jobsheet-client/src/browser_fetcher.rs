use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use jobsheet_core::error::AppError;
use jobsheet_core::models::PageRequest;
use jobsheet_core::traits::Fetcher;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::fetcher::validate_url;

/// Launch options for [`BrowserFetcher`].
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run Chromium without a window.
    pub headless: bool,
    /// How often to re-check for the readiness selector.
    pub poll_interval: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Headless-browser fetcher using Chromium via the Chrome DevTools Protocol.
///
/// One Chromium process serves the whole run and is shared by all clones.
/// Each [`Fetcher::fetch`] opens a tab, navigates, waits for the request's
/// readiness selector, grabs the rendered HTML and closes the tab.
///
/// [`Fetcher::close`] shuts the browser down; it only acts the first time.
/// Fetching after that fails with [`AppError::SessionClosed`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use jobsheet_client::BrowserFetcher;
/// use jobsheet_core::{Fetcher, PageRequest};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = BrowserFetcher::new().await?;
/// let request = PageRequest::new(
///     "https://realpython.github.io/fake-jobs/",
///     "div.card-content",
///     Duration::from_secs(15),
/// );
/// let html = fetcher.fetch(&request).await?;
/// fetcher.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<RwLock<Option<Browser>>>,
    handler: Arc<Mutex<Option<JoinHandle<()>>>>,
    poll_interval: Duration,
}

impl BrowserFetcher {
    /// Launches headless Chromium with default options.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH`, `CHROME_BIN`,
    /// or one of the well-known install locations.
    pub async fn new() -> Result<Self, AppError> {
        Self::launch(BrowserOptions::default()).await
    }

    pub async fn launch(options: BrowserOptions) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        if let Some(bin) = Self::find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }
        if options.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        let config = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled for the connection to make progress.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::debug!("Browser CDP handler stopped: {event:?}");
                    break;
                }
            }
        });

        tracing::info!(headless = options.headless, "Browser session opened");

        Ok(Self {
            browser: Arc::new(RwLock::new(Some(browser))),
            handler: Arc::new(Mutex::new(Some(handle))),
            poll_interval: options.poll_interval,
        })
    }

    /// Locate a usable Chrome/Chromium binary.
    ///
    /// `CHROME_BIN` wins when it points at an existing file. Snap-packaged
    /// Chromium ships a wrapper that rejects headless flags, so the real
    /// binary inside the snap is preferred over `/snap/bin/chromium`.
    /// `None` leaves the lookup to chromiumoxide.
    fn find_chrome_binary() -> Option<PathBuf> {
        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(p);
            if path.exists() {
                return Some(path);
            }
        }

        [
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    }

    /// Navigate `page` and wait until the readiness selector shows up.
    async fn render(&self, page: &Page, request: &PageRequest) -> Result<String, AppError> {
        let deadline = Instant::now() + request.timeout;

        match tokio::time::timeout(request.timeout, page.goto(request.url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(AppError::Navigation(format!(
                    "Failed to navigate to {}: {e}",
                    request.url
                )));
            }
            Err(_) => return Err(AppError::Timeout(request.timeout.as_millis() as u64)),
        }

        while page
            .find_element(request.ready_selector.as_str())
            .await
            .is_err()
        {
            if Instant::now() >= deadline {
                return Err(AppError::SelectorNotFound {
                    selector: request.ready_selector.clone(),
                    url: request.url.clone(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        page.content()
            .await
            .map_err(|e| AppError::Navigation(format!("Failed to read page content: {e}")))
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String, AppError> {
        validate_url(&request.url)?;

        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or(AppError::SessionClosed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Navigation(format!("Failed to open tab: {e}")))?;

        let result = self.render(&page, request).await;

        if let Err(e) = page.close().await {
            tracing::debug!(url = %request.url, "Failed to close tab: {e}");
        }
        result
    }

    async fn close(&self) -> Result<(), AppError> {
        let mut guard = self.browser.write().await;
        let Some(mut browser) = guard.take() else {
            return Ok(());
        };

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| AppError::BrowserError(format!("Failed to close browser: {e}")));
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser process wait failed: {e}");
        }

        let handle = self.handler.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            handle.abort();
        }

        tracing::info!("Browser session closed");
        closed
    }
}
