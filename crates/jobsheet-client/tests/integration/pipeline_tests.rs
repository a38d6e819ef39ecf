use jobsheet_client::{HtmlPageParser, ListingSelectors, XlsxReportWriter};
use jobsheet_core::{AppError, PageParser, SENTINEL, ScrapeService};

use crate::common::*;

fn parser() -> HtmlPageParser {
    HtmlPageParser::new(ListingSelectors::default()).unwrap()
}

fn service(site: &StaticSite) -> ScrapeService<StaticSite, HtmlPageParser, XlsxReportWriter> {
    ScrapeService::new(
        site.clone(),
        parser(),
        XlsxReportWriter::new(BASE_URL),
        test_config(),
    )
}

#[test]
fn malformed_cards_are_excluded_from_page() {
    let html = index_html(
        &(0..20)
            .map(|n| card_html(n, true))
            .chain([card_html(98, false), card_html(99, false)])
            .collect::<Vec<_>>(),
        None,
    );

    let page = parser().parse_listings(&html, BASE_URL);

    assert_eq!(page.listings.len(), 20);
    assert_eq!(page.dropped, 2);
    assert_eq!(page.listings[0].detail_url, detail_url(0));
    assert_eq!(page.listings[19].detail_url, detail_url(19));
}

#[tokio::test]
async fn twenty_good_cards_produce_twenty_rows() {
    let site = StaticSite::new();
    serve_page(&site, BASE_URL, 0, 20, 2, None);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("jobs.xlsx");

    let report = service(&site).run(&dest).await.unwrap();

    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.cards_dropped, 2);
    assert_eq!(report.rows_written, 20);
    assert_eq!(report.detail_failures, 0);
    assert!(dest.exists());
    assert_eq!(site.closes(), 1);

    let first = &report.listings[0];
    assert_eq!(first.title, "Job 0");
    assert_eq!(first.location.as_deref(), Some("Detail City 0"));
    assert_eq!(first.date_posted.as_deref(), Some("2021-04-08"));
    assert_eq!(first.description.as_deref(), Some("Description of job 0."));
}

#[tokio::test]
async fn failed_detail_page_keeps_row_with_sentinel() {
    let site = StaticSite::new();
    serve_page(&site, BASE_URL, 1, 10, 0, None);
    site.fail(&detail_url(5));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("jobs.xlsx");

    let report = service(&site).run(&dest).await.unwrap();

    assert_eq!(report.rows_written, 10);
    assert_eq!(report.detail_failures, 1);
    assert_eq!(site.hits(&detail_url(5)), 3);

    let fifth = &report.listings[4];
    assert_eq!(fifth.detail_url, detail_url(5));
    assert_eq!(fifth.description.as_deref(), Some(SENTINEL));
    assert_eq!(fifth.location.as_deref(), Some("City 5"));
    assert!(dest.exists());
}

#[tokio::test]
async fn follows_pagination_in_order() {
    let site = StaticSite::new();
    let page_2 = format!("{BASE_URL}page/2/");
    serve_page(&site, BASE_URL, 0, 3, 0, Some("page/2/"));
    serve_page(&site, &page_2, 3, 2, 0, None);
    let dir = tempfile::tempdir().unwrap();

    let report = service(&site)
        .run(&dir.path().join("jobs.xlsx"))
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 2);
    let titles: Vec<_> = report.listings.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, ["Job 0", "Job 1", "Job 2", "Job 3", "Job 4"]);
}

#[tokio::test]
async fn missing_output_directory_fails_without_file() {
    let site = StaticSite::new();
    serve_page(&site, BASE_URL, 0, 2, 0, None);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nope").join("jobs.xlsx");

    let err = service(&site).run(&dest).await.unwrap_err();

    assert!(matches!(err, AppError::Io(_)));
    assert!(!dest.exists());
    assert_eq!(site.closes(), 1);
}
