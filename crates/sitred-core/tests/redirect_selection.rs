//! End-to-end selection against a mock sitemap origin.
#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use sitred_core::{Fetcher, RedirectSelector, RetryPolicy, SelectError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{fixture, large_sitemap};

async fn origin(body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(body),
        )
        .mount(&server)
        .await;
    server
}

fn unlimited_fetcher() -> Arc<Fetcher> {
    Arc::new(
        Fetcher::builder("sitred-test", "test@example.com")
            .rate_limit(1000, 100)
            .retry_policy(RetryPolicy::none())
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn selects_only_page_urls_from_fixture() {
    let server = origin(fixture("images.xml")).await;
    let selector = RedirectSelector::new(
        unlimited_fetcher(),
        format!("{}/sitemap.xml", server.uri()),
    );

    let pages = [
        "https://example.com/gallery/",
        "https://example.com/contact/",
        "https://example.com/press/",
    ];
    for _ in 0..30 {
        let url = selector.select().await.unwrap();
        assert!(pages.contains(&url.as_str()), "unexpected redirect target {url}");
    }
}

#[tokio::test]
async fn large_sitemap_is_streamed_from_the_network() {
    let server = origin(large_sitemap(100_000)).await;
    let selector = RedirectSelector::new(
        unlimited_fetcher(),
        format!("{}/sitemap.xml", server.uri()),
    );

    let candidates = selector.candidates().await.unwrap();
    assert_eq!(candidates.len(), 100_000);

    let url = selector.select().await.unwrap();
    assert!(url.starts_with("https://example.com/page/"));
}

#[tokio::test]
async fn malformed_fixture_is_a_parse_failure() {
    let server = origin(fixture("malformed.xml")).await;
    let selector = RedirectSelector::new(
        unlimited_fetcher(),
        format!("{}/sitemap.xml", server.uri()),
    );

    assert!(matches!(
        selector.select().await,
        Err(SelectError::ParseFailed(_))
    ));
}

#[tokio::test]
async fn concurrent_requests_share_one_rate_limit() {
    let server = origin(fixture("valid.xml")).await;
    let fetcher = Arc::new(Fetcher::new("sitred-test", "test@example.com").unwrap());
    let selector = RedirectSelector::new(fetcher, format!("{}/sitemap.xml", server.uri()));

    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let selector = selector.clone();
            tokio::spawn(async move { selector.select().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    // Four requests through a 2/s bucket with a burst of one take at least 1.5s.
    assert!(
        start.elapsed() >= Duration::from_millis(1400),
        "limiter was not shared: {:?}",
        start.elapsed()
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}
