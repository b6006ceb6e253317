//! Integration tests for the crawl module.
//!
//! These tests drive the real reqwest-backed client against mock HTTP servers.

use journal_miner::crawl::{CrawlEngine, CrawlError, FetchError, PageClient, RateLimiter, RetryPolicy};
use journal_miner::extract::{FieldDefaults, ListingEntry};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_page(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, href)| {
            format!(r#"<li><div class="cont"><p class="title"><a href="{href}">{title}</a></p></div></li>"#)
        })
        .collect();
    format!(
        r#"<html><body><div class="srchResultListW"><ul>{items}</ul></div></body></html>"#
    )
}

fn detail_page(year: &str, keywords: &str) -> String {
    format!(
        r#"<html><body><div class="infoDetailL"><ul>
        <li><span class="strong">저자</span><div><p>홍길동</p></div></li>
        <li><span class="strong">발행연도</span><div><p>{year}</p></div></li>
        <li><span class="strong">주제어</span><div><p>{keywords}</p></div></li>
        </ul></div></body></html>"#
    )
}

fn engine(client: &PageClient) -> CrawlEngine<'_> {
    CrawlEngine::new(
        client,
        RetryPolicy::with_max_attempts(3).without_jitter(),
        RateLimiter::disabled(),
    )
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_listing_crawl_resolves_links_and_drops_repeats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("p", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[
            ("첫 논문", "/detail/1"),
            ("둘째 논문", "/detail/2"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[
            ("둘째 논문", "/detail/2"),
            ("셋째 논문", "/detail/3"),
        ])))
        .mount(&server)
        .await;

    let client = PageClient::new().unwrap();
    let pages = vec![
        format!("{}/search?p=1", server.uri()),
        format!("{}/search?p=2", server.uri()),
    ];
    let crawl = engine(&client).crawl_listing(&pages).await.unwrap();

    assert_eq!(crawl.pages, 2);
    assert_eq!(crawl.duplicates, 1);
    assert_eq!(
        crawl.entries,
        vec![
            ListingEntry::new("첫 논문", format!("{}/detail/1", server.uri())),
            ListingEntry::new("둘째 논문", format!("{}/detail/2", server.uri())),
            ListingEntry::new("셋째 논문", format!("{}/detail/3", server.uri())),
        ]
    );
}

#[tokio::test]
async fn test_listing_crawl_aborts_on_page_without_result_list() {
    let server = MockServer::start().await;
    mount_page(&server, "/search", 200, "<html><body>maintenance</body></html>".to_string()).await;

    let client = PageClient::new().unwrap();
    let result = engine(&client)
        .crawl_listing(&[format!("{}/search", server.uri())])
        .await;

    assert!(matches!(result, Err(CrawlError::ListingParse { page: 1, .. })));
}

#[tokio::test]
async fn test_batch_with_one_malformed_page_yields_remaining_records() {
    let server = MockServer::start().await;
    let mut entries = Vec::new();
    for index in 0..10 {
        let page_path = format!("/detail/{index}");
        let body = if index == 4 {
            "<html><body><p>no detail panel here</p></body></html>".to_string()
        } else {
            detail_page("2018", "음악치료 , 자폐")
        };
        mount_page(&server, &page_path, 200, body).await;
        entries.push(ListingEntry::new(
            format!("논문 {index}"),
            format!("{}{page_path}", server.uri()),
        ));
    }

    let client = PageClient::new().unwrap();
    let (records, report) = engine(&client)
        .crawl_articles(&entries, &FieldDefaults::default())
        .await;

    assert_eq!(records.len(), 9);
    assert_eq!(report.attempted, 10);
    assert_eq!(report.extracted, 9);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.failed(), 1);
    assert!(records.iter().all(|record| record.title != "논문 4"));
    assert_eq!(records[0].year, Some(2018));
    assert_eq!(records[0].author.as_deref(), Some("홍길동"));
}

#[tokio::test]
async fn test_rate_limited_page_is_retried_after_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/detail/1", 200, detail_page("2020", "music")).await;

    let client = PageClient::new().unwrap();
    let entries = vec![ListingEntry::new("t", format!("{}/detail/1", server.uri()))];
    let (records, report) = engine(&client)
        .crawl_articles(&entries, &FieldDefaults::default())
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(report.retried, 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(records[0].year, Some(2020));
}

#[tokio::test]
async fn test_not_found_page_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/gone"))
        .respond_with(ResponseTemplate::new(404))
        // one request per call below, no retries
        .expect(2)
        .mount(&server)
        .await;

    let client = PageClient::new().unwrap();
    let url = format!("{}/detail/gone", server.uri());
    let result = engine(&client).fetch_with_retry(&url).await;

    let (error, attempts) = result.unwrap_err();
    assert_eq!(attempts, 1);
    assert!(matches!(error, FetchError::HttpStatus { status: 404, .. }));

    let entries = vec![ListingEntry::new("gone", url)];
    let (records, report) = engine(&client)
        .crawl_articles(&entries, &FieldDefaults::default())
        .await;
    assert!(records.is_empty());
    assert_eq!(report.fetch_failed, 1);
}

#[tokio::test]
async fn test_field_defaults_fill_unrendered_attributes() {
    let server = MockServer::start().await;
    mount_page(&server, "/detail/1", 200, detail_page("2019", "autism")).await;

    let defaults = FieldDefaults {
        organization: Some("한국음악치료학회".to_string()),
        name: Some("한국음악치료학회지".to_string()),
        media: Some("학술저널".to_string()),
    };
    let client = PageClient::new().unwrap();
    let entries = vec![ListingEntry::new("t", format!("{}/detail/1", server.uri()))];
    let (records, _) = engine(&client).crawl_articles(&entries, &defaults).await;

    assert_eq!(records[0].organization.as_deref(), Some("한국음악치료학회"));
    assert_eq!(records[0].name.as_deref(), Some("한국음악치료학회지"));
    assert_eq!(records[0].media.as_deref(), Some("학술저널"));
}
