use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobsheet_core::{AppError, Fetcher, PageRequest, RetryPolicy, ScrapeConfig};

pub const BASE_URL: &str = "https://jobs.example.com/";

/// In-memory site: serves registered pages, can fail chosen URLs with a
/// timeout, and records every request and close.
#[derive(Clone, Default)]
pub struct StaticSite {
    pages: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<String>>>,
    closes: Arc<Mutex<u32>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, html: String) {
        self.pages.lock().unwrap().insert(url.to_string(), html);
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().push(url.to_string());
    }

    pub fn hits(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub fn closes(&self) -> u32 {
        *self.closes.lock().unwrap()
    }
}

impl Fetcher for StaticSite {
    async fn fetch(&self, request: &PageRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request.url.clone());
        if self.failing.lock().unwrap().contains(&request.url) {
            return Err(AppError::Timeout(request.timeout.as_millis() as u64));
        }
        self.pages
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| AppError::HttpStatus {
                status: 404,
                url: request.url.clone(),
            })
    }

    async fn close(&self) -> Result<(), AppError> {
        *self.closes.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn test_config() -> ScrapeConfig {
    ScrapeConfig::new(BASE_URL)
        .with_page_delay(Duration::ZERO)
        .with_detail_concurrency(4)
        .with_retry(
            RetryPolicy::new(3)
                .with_base_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(2)),
        )
}

pub fn detail_url(n: usize) -> String {
    format!("{BASE_URL}jobs/job-{n}.html")
}

/// A listing card in the target site's markup. `with_link = false` omits the
/// Apply link, making the card malformed.
pub fn card_html(n: usize, with_link: bool) -> String {
    let apply = if with_link {
        format!(r#"<a href="jobs/job-{n}.html" class="card-footer-item">Apply</a>"#)
    } else {
        String::new()
    };
    format!(
        r#"<div class="card">
            <div class="card-content">
              <div class="media">
                <div class="media-left">
                  <figure class="image is-48x48"><img src="https://files.example.com/logo.jpg" alt="logo"></figure>
                </div>
                <div class="media-content">
                  <h2 class="title is-5">Job {n}</h2>
                  <h3 class="subtitle is-6 company">Company {n}</h3>
                </div>
              </div>
              <div class="content">
                <p class="location"> City {n} </p>
                <p class="is-small has-text-grey"><time datetime="2021-04-08">2021-04-08</time></p>
              </div>
            </div>
            <footer class="card-footer">
              <a href="https://learn.example.com" class="card-footer-item">Learn</a>
              {apply}
            </footer>
          </div>"#
    )
}

pub fn index_html(cards: &[String], next: Option<&str>) -> String {
    let next = next
        .map(|href| format!(r#"<a class="pagination-next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!(
        "<html><body><section><div class=\"columns\">{}</div></section>{next}</body></html>",
        cards.join("\n")
    )
}

pub fn detail_html(n: usize) -> String {
    format!(
        r#"<html><body><div class="box">
            <h1 class="title is-2">Job {n}</h1>
            <div class="content">
              <p>Description of job {n}.</p>
              <p id="location"><strong>Location:</strong> Detail City {n}</p>
              <p id="date"><strong>Posted:</strong> 2021-04-08</p>
            </div>
          </div></body></html>"#
    )
}

/// Serve `count` well-formed cards (ids `first..first + count`) plus
/// `malformed` cards without links on one index page, and a detail page
/// for every well-formed card.
pub fn serve_page(
    site: &StaticSite,
    url: &str,
    first: usize,
    count: usize,
    malformed: usize,
    next: Option<&str>,
) {
    let mut cards: Vec<String> = (first..first + count).map(|n| card_html(n, true)).collect();
    for m in 0..malformed {
        cards.insert((m * 7).min(cards.len()), card_html(1000 + m, false));
    }
    site.serve(url, index_html(&cards, next));
    for n in first..first + count {
        site.serve(&detail_url(n), detail_html(n));
    }
}
