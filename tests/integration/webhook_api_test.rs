// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{spawn_upstream, test_fetcher};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use axum_test::TestServer;
use fetchrs::domain::services::batch_scrape_service::BatchScrapeService;
use fetchrs::domain::services::enrichment_service::EnrichmentPipeline;
use fetchrs::domain::services::extraction_service::ExtractionService;
use fetchrs::infrastructure::repositories::memory_sink::InMemorySink;
use fetchrs::presentation::routes;
use serde_json::{json, Value};
use std::sync::Arc;

struct TestApp {
    server: TestServer,
    sink: InMemorySink,
    upstream: String,
}

async fn create_test_app() -> TestApp {
    let router = Router::new()
        .route(
            "/candidates/123",
            get(|| async { r#"{"ID":"123","FullName":"John Doe","Email":"john@example.com"}"# }),
        )
        .route(
            "/jobs/456",
            get(|| async { r#"{"ID":"456","Name":"Software Engineer","Description":"Develops software"}"# }),
        )
        .route(
            "/page",
            get(|| async { "<html><head><title>Page</title></head><body>Hello</body></html>" }),
        );
    let upstream = spawn_upstream(router).await;

    let fetcher = test_fetcher(3);
    let sink = InMemorySink::new();
    let pipeline = Arc::new(EnrichmentPipeline::new(
        fetcher.clone(),
        Arc::new(sink.clone()),
        format!("{}/candidates/", upstream),
        format!("{}/jobs/", upstream),
    ));
    let scraper = Arc::new(BatchScrapeService::new(
        fetcher,
        Arc::new(ExtractionService),
        4,
    ));

    TestApp {
        server: TestServer::new(routes::app(pipeline, scraper)).unwrap(),
        sink,
        upstream,
    }
}

fn payload(candidate: &str, job: &str) -> Value {
    json!({
        "hook": {"id": "1", "resource": "application", "action": "update", "target": "sample"},
        "linked_account": "sample",
        "data": {
            "id": "app-1",
            "remote_id": "r-1",
            "candidate": candidate,
            "job": job,
            "applied_at": "2024-01-01T00:00:00Z",
            "source": "referral",
            "current_stage": "interview"
        }
    })
}

#[tokio::test]
async fn test_webhook_enriches_application() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/webhooks/applications")
        .json(&payload("123", "456"))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["record"]["candidate"]["full_name"], "John Doe");
    assert_eq!(body["record"]["job"]["name"], "Software Engineer");
    assert_eq!(body["record"]["current_stage"], "interview");
    assert_eq!(app.sink.candidate_count(), 1);
    assert_eq!(app.sink.job_count(), 1);
}

#[tokio::test]
async fn test_webhook_missing_identifier_is_bad_request() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/webhooks/applications")
        .json(&payload("", "456"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("candidate"));
    assert_eq!(app.sink.candidate_count(), 0);
}

#[tokio::test]
async fn test_webhook_upstream_failure_is_bad_gateway() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/webhooks/applications")
        .json(&payload("999", "456"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(app.sink.job_count(), 0);
}

#[tokio::test]
async fn test_webhook_store_failure_is_internal_error() {
    let app = create_test_app().await;
    app.sink.set_available(false);

    let response = app
        .server
        .post("/v1/webhooks/applications")
        .json(&payload("123", "456"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_scrape_endpoints() {
    let app = create_test_app().await;
    let url = format!("{}/page", app.upstream);

    let single = app.server.post("/v1/scrape").json(&json!({ "url": url })).await;
    single.assert_status(StatusCode::OK);
    assert_eq!(single.json::<Value>()["data"]["title"], "Page");

    let batch = app
        .server
        .post("/v1/scrape/batch")
        .json(&json!({ "urls": [url, url] }))
        .await;
    batch.assert_status(StatusCode::OK);
    let body: Value = batch.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][1]["body"], "Hello");
}

#[tokio::test]
async fn test_batch_scrape_rejects_empty_list() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/scrape/batch")
        .json(&json!({ "urls": [] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_scrape_reports_missing_page() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/scrape/batch")
        .json(&json!({ "urls": [format!("{}/page", app.upstream), format!("{}/missing", app.upstream)] }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Task 1"));
}
