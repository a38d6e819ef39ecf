use std::sync::Arc;

use jobsheet_core::error::AppError;
use jobsheet_core::models::{DetailFields, JobListing, ListingPage};
use jobsheet_core::traits::PageParser;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// CSS selectors describing the target site's markup.
///
/// Card-level selectors are evaluated inside each matched `card`.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub card: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Posting date; its `datetime` attribute wins over its text.
    pub date: String,
    /// Logo `<img>`; its `src` is used.
    pub logo: String,
    /// Candidate links to the detail page.
    pub detail_link: String,
    /// When set, only a candidate link with this text counts.
    pub detail_link_text: Option<String>,
    /// Tried in order; the first match with an `href` is the next page.
    pub next_page: Vec<String>,
    pub detail_location: String,
    pub detail_description: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card: "div.card".to_string(),
            title: "h2.title".to_string(),
            company: "h3.company".to_string(),
            location: "p.location".to_string(),
            date: "p time".to_string(),
            logo: "figure.image img".to_string(),
            detail_link: "footer a.card-footer-item".to_string(),
            detail_link_text: Some("Apply".to_string()),
            next_page: vec![
                "a.pagination-next".to_string(),
                "a.next".to_string(),
                "a[rel=\"next\"]".to_string(),
            ],
            detail_location: "p#location".to_string(),
            detail_description: "div.box p:not([id])".to_string(),
        }
    }
}

struct Compiled {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    date: Selector,
    logo: Selector,
    detail_link: Selector,
    detail_link_text: Option<String>,
    next_page: Vec<Selector>,
    detail_location: Selector,
    detail_description: Selector,
}

/// [`PageParser`] backed by the `scraper` crate.
#[derive(Clone)]
pub struct HtmlPageParser {
    selectors: Arc<Compiled>,
}

impl HtmlPageParser {
    /// Compile `selectors`, failing on the first invalid one.
    pub fn new(selectors: ListingSelectors) -> Result<Self, AppError> {
        let compiled = Compiled {
            card: compile(&selectors.card)?,
            title: compile(&selectors.title)?,
            company: compile(&selectors.company)?,
            location: compile(&selectors.location)?,
            date: compile(&selectors.date)?,
            logo: compile(&selectors.logo)?,
            detail_link: compile(&selectors.detail_link)?,
            detail_link_text: selectors.detail_link_text,
            next_page: selectors
                .next_page
                .iter()
                .map(|s| compile(s))
                .collect::<Result<_, _>>()?,
            detail_location: compile(&selectors.detail_location)?,
            detail_description: compile(&selectors.detail_description)?,
        };

        Ok(Self {
            selectors: Arc::new(compiled),
        })
    }

    /// Parse one card. `None` when the title or detail link is missing.
    fn parse_card(&self, card: ElementRef<'_>, base: Option<&Url>) -> Option<JobListing> {
        let s = &self.selectors;

        let title = first_text(card, &s.title)?;
        let detail_url = card
            .select(&s.detail_link)
            .find(|link| match &s.detail_link_text {
                Some(text) => collapse_text(*link).eq_ignore_ascii_case(text),
                None => true,
            })
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| resolve(base, href))?;

        let date_posted = card.select(&s.date).next().and_then(|el| {
            el.value()
                .attr("datetime")
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .or_else(|| Some(collapse_text(el)).filter(|t| !t.is_empty()))
        });
        let logo_url = card
            .select(&s.logo)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| resolve(base, src));

        Some(JobListing {
            title,
            company: first_text(card, &s.company).unwrap_or_default(),
            location: first_text(card, &s.location),
            date_posted,
            logo_url,
            detail_url,
            description: None,
        })
    }
}

impl PageParser for HtmlPageParser {
    fn parse_listings(&self, html: &str, page_url: &str) -> ListingPage {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();
        let s = &self.selectors;

        let mut page = ListingPage::default();
        for (idx, card) in document.select(&s.card).enumerate() {
            match self.parse_card(card, base.as_ref()) {
                Some(listing) => page.listings.push(listing),
                None => {
                    tracing::debug!(card = idx + 1, page = %page_url, "Listing card missing title or detail link");
                    page.dropped += 1;
                }
            }
        }
        if page.dropped > 0 {
            tracing::warn!(
                dropped = page.dropped,
                page = %page_url,
                "Skipped listing cards missing title or detail link"
            );
        }

        page.next_page = s.next_page.iter().find_map(|selector| {
            document
                .select(selector)
                .find_map(|link| link.value().attr("href"))
                .and_then(|href| resolve(base.as_ref(), href))
        });

        page
    }

    fn parse_detail(&self, html: &str) -> DetailFields {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let s = &self.selectors;

        let location = first_text(root, &s.detail_location)
            .map(|text| strip_label(&text, "location:").to_string())
            .filter(|text| !text.is_empty());

        DetailFields {
            location,
            description: first_text(root, &s.detail_description),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector).map_err(|e| AppError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text of the first match under `scope`, whitespace-collapsed. `None` if
/// nothing matches or the text is blank.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(collapse_text)
        .filter(|text| !text.is_empty())
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `href` against the page URL; absolute hrefs pass through.
fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };
    match resolved {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!(%href, "Unresolvable link: {e}");
            None
        }
    }
}

/// Remove a leading, case-insensitive `label` such as `Location:`.
fn strip_label<'a>(text: &'a str, label: &str) -> &'a str {
    let trimmed = text.trim();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => trimmed[label.len()..].trim(),
        _ => trimmed,
    }
}
