// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{test_limiter, test_policy};
use fetchrs::engines::fetcher::{target_key, Fetcher};
use fetchrs::engines::reqwest_engine::ReqwestEngine;
use fetchrs::utils::errors::FetchError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_attempts: u32) -> Fetcher {
    let client = Arc::new(ReqwestEngine::new(Duration::from_secs(5), None).unwrap());
    Fetcher::new(client, test_limiter(), test_policy(max_attempts))
}

#[tokio::test]
async fn test_recovers_after_three_throttled_responses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/candidates/123"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/candidates/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"123"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(5);
    let url = format!("{}/candidates/123", server.uri());

    let response = fetcher.fetch(&url).await.unwrap();

    assert_eq!(response.status, 200);
    let target = target_key(&url).unwrap();
    let snapshot = fetcher.limiter().snapshot(&target).unwrap();
    assert_eq!(snapshot.throttled_total, 3);
    assert_eq!(snapshot.backoff_exponent, 0);
    assert!(snapshot.cooldown_until.is_none());
    assert!(!fetcher.limiter().is_throttled(&target));
}

#[tokio::test]
async fn test_throttling_exhausts_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/456"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fetcher(3);
    let url = format!("{}/jobs/456", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert!(err.is_rate_limited());
    match err {
        FetchError::RetryExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, FetchError::RateLimited { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let target = target_key(&url).unwrap();
    assert!(fetcher.limiter().snapshot(&target).unwrap().backoff_exponent > 0);
}

#[tokio::test]
async fn test_client_error_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher(5)
        .fetch(&format!("{}/jobs/missing", server.uri()))
        .await
        .unwrap_err();

    match err {
        FetchError::UpstreamRejected { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "no such job");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let response = fetcher(5)
        .fetch(&format!("{}/flaky", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.body.as_ref(), b"ok");
}
