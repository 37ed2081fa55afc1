// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{spawn_upstream, test_fetcher, Hits};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use fetchrs::domain::services::batch_scrape_service::{BatchScrapeService, ScrapeError};
use fetchrs::domain::services::extraction_service::ExtractionService;
use fetchrs::utils::errors::{FetchError, GroupError};
use std::sync::Arc;
use std::time::Duration;

fn page(title: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>Mock body content<a href="http://example.com/{title}">Link</a></body></html>"#
    )
}

fn service(concurrency: usize) -> BatchScrapeService {
    BatchScrapeService::new(test_fetcher(3), Arc::new(ExtractionService), concurrency)
}

#[tokio::test]
async fn test_records_follow_input_order() {
    // Earlier pages respond more slowly so completion order is reversed.
    let router = Router::new()
        .route(
            "/one",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                page("one")
            }),
        )
        .route(
            "/two",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(75)).await;
                page("two")
            }),
        )
        .route("/three", get(|| async { page("three") }));
    let base = spawn_upstream(router).await;

    let urls = vec![
        format!("{}/one", base),
        format!("{}/two", base),
        format!("{}/three", base),
    ];
    let records = service(0).scrape_many(urls.clone()).await.unwrap();

    let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
    assert_eq!(records[0].url, urls[0]);
    assert_eq!(records[1].body, "Mock body contentLink");
    assert_eq!(records[2].links, vec!["http://example.com/three".to_string()]);
}

#[tokio::test]
async fn test_missing_page_fails_whole_batch() {
    let a_hits = Hits::default();
    let c_hits = Hits::default();
    let (a_counter, c_counter) = (a_hits.clone(), c_hits.clone());
    // The missing page answers late so its siblings are already in flight.
    let router = Router::new()
        .route(
            "/a",
            get(move || {
                let counter = a_counter.clone();
                async move {
                    counter.hit();
                    page("a")
                }
            }),
        )
        .route(
            "/b",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                (StatusCode::NOT_FOUND, "missing").into_response()
            }),
        )
        .route(
            "/c",
            get(move || {
                let counter = c_counter.clone();
                async move {
                    counter.hit();
                    page("c")
                }
            }),
        );
    let base = spawn_upstream(router).await;

    let err = service(0)
        .scrape_many(vec![
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/c", base),
        ])
        .await
        .unwrap_err();

    match err {
        GroupError::TaskFailed { index, source } => {
            assert_eq!(index, 1);
            assert!(source.url().ends_with("/b"));
            assert!(matches!(
                source,
                ScrapeError::Fetch {
                    source: FetchError::UpstreamRejected { status: 404, .. },
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(a_hits.count(), 1);
    assert_eq!(c_hits.count(), 1);
}

#[tokio::test]
async fn test_serial_batch_stops_after_first_failure() {
    let hits = Hits::default();
    let counter = hits.clone();
    let router = Router::new().route(
        "/gone",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.hit();
                (StatusCode::GONE, "gone").into_response()
            }
        }),
    );
    let base = spawn_upstream(router).await;

    let urls = (0..4).map(|_| format!("{}/gone", base)).collect();
    let err = service(1).scrape_many(urls).await.unwrap_err();

    assert!(err.index().is_some());
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_scrape_one() {
    let router = Router::new().route("/single", get(|| async { page("single") }));
    let base = spawn_upstream(router).await;

    let record = service(4)
        .scrape_one(&format!("{}/single", base))
        .await
        .unwrap();

    assert_eq!(record.title, "single");
}

#[tokio::test]
async fn test_empty_page_yields_empty_record() {
    let router = Router::new().route("/blank", get(|| async { "" }));
    let base = spawn_upstream(router).await;
    let url = format!("{}/blank", base);

    let record = service(4).scrape_one(&url).await.unwrap();

    assert_eq!(record.url, url);
    assert_eq!(record.title, "");
    assert_eq!(record.body, "");
    assert!(record.links.is_empty());
}

#[tokio::test]
async fn test_empty_batch() {
    let records = service(2).scrape_many(Vec::new()).await.unwrap();
    assert!(records.is_empty());
}
