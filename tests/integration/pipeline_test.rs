// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{notification, spawn_upstream, test_fetcher, Hits};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use fetchrs::domain::services::enrichment_service::{
    EnrichmentPipeline, PipelineError, PipelineState,
};
use fetchrs::infrastructure::repositories::memory_sink::InMemorySink;
use fetchrs::utils::errors::FetchError;
use std::sync::Arc;

const CANDIDATE_JSON: &str = r#"{"id":"123","full_name":"John Doe","email":"john@example.com"}"#;
const JOB_JSON: &str = r#"{"id":"456","name":"Software Engineer","description":"Develops software"}"#;

/// 模拟上游的单条路由行为
#[derive(Clone, Copy)]
enum Behaviour {
    Ok(&'static str),
    Status(StatusCode),
    Throttled,
}

fn respond(behaviour: Behaviour) -> Response {
    match behaviour {
        Behaviour::Ok(body) => (StatusCode::OK, body).into_response(),
        Behaviour::Status(status) => (status, "upstream says no").into_response(),
        Behaviour::Throttled => {
            (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "0")], "").into_response()
        }
    }
}

struct Upstream {
    base: String,
    candidate_hits: Hits,
    job_hits: Hits,
}

async fn upstream(candidate: Behaviour, job: Behaviour) -> Upstream {
    let candidate_hits = Hits::default();
    let job_hits = Hits::default();

    let c = candidate_hits.clone();
    let j = job_hits.clone();
    let router = Router::new()
        .route(
            "/candidates/123",
            get(move || {
                let hits = c.clone();
                async move {
                    hits.hit();
                    respond(candidate)
                }
            }),
        )
        .route(
            "/jobs/456",
            get(move || {
                let hits = j.clone();
                async move {
                    hits.hit();
                    respond(job)
                }
            }),
        );

    Upstream {
        base: spawn_upstream(router).await,
        candidate_hits,
        job_hits,
    }
}

fn pipeline(upstream: &Upstream, sink: &InMemorySink, max_attempts: u32) -> EnrichmentPipeline {
    EnrichmentPipeline::new(
        test_fetcher(max_attempts),
        Arc::new(sink.clone()),
        format!("{}/candidates/", upstream.base),
        format!("{}/jobs/", upstream.base),
    )
}

#[tokio::test]
async fn test_enrichment_completes_and_stores_both_parts() {
    let upstream = upstream(Behaviour::Ok(CANDIDATE_JSON), Behaviour::Ok(JOB_JSON)).await;
    let sink = InMemorySink::new();

    let outcome = pipeline(&upstream, &sink, 3)
        .handle(&notification("123", "456"))
        .await
        .unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert_eq!(outcome.record.hook_id, "hook-1");
    assert_eq!(sink.candidate("123").unwrap().full_name, "John Doe");
    assert_eq!(sink.job("456").unwrap().name, "Software Engineer");
    assert_eq!(sink.candidate_count(), 1);
    assert_eq!(sink.job_count(), 1);
    assert_eq!(upstream.candidate_hits.count(), 1);
    assert_eq!(upstream.job_hits.count(), 1);
}

#[tokio::test]
async fn test_throttled_job_exhausts_retries_without_storing() {
    let upstream = upstream(Behaviour::Ok(CANDIDATE_JSON), Behaviour::Throttled).await;
    let sink = InMemorySink::new();

    let err = pipeline(&upstream, &sink, 3)
        .handle(&notification("123", "456"))
        .await
        .unwrap_err();

    assert_eq!(err.state(), PipelineState::FetchFailed);
    assert!(err.is_rate_limited());
    match &err {
        PipelineError::Fetch(group) => {
            assert_eq!(group.index(), Some(1));
            assert!(matches!(
                group.task_error(),
                Some(FetchError::RetryExhausted { attempts: 3, .. })
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(upstream.job_hits.count(), 3);
    assert_eq!(sink.candidate_count(), 0);
    assert_eq!(sink.job_count(), 0);
}

#[tokio::test]
async fn test_missing_candidate_is_not_retried() {
    let upstream = upstream(Behaviour::Status(StatusCode::NOT_FOUND), Behaviour::Ok(JOB_JSON)).await;
    let sink = InMemorySink::new();

    let err = pipeline(&upstream, &sink, 5)
        .handle(&notification("123", "456"))
        .await
        .unwrap_err();

    match err {
        PipelineError::Fetch(group) => {
            assert_eq!(group.index(), Some(0));
            assert_eq!(group.task_error().and_then(FetchError::status), Some(404));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(upstream.candidate_hits.count(), 1);
    assert_eq!(sink.candidate_count(), 0);
}

#[tokio::test]
async fn test_transient_upstream_error_recovers() {
    let flaky_hits = Hits::default();
    let hits = flaky_hits.clone();
    let router = Router::new()
        .route(
            "/candidates/123",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.hit();
                    if hits.count() < 3 {
                        respond(Behaviour::Status(StatusCode::SERVICE_UNAVAILABLE))
                    } else {
                        respond(Behaviour::Ok(CANDIDATE_JSON))
                    }
                }
            }),
        )
        .route("/jobs/456", get(|| async { respond(Behaviour::Ok(JOB_JSON)) }));
    let base = spawn_upstream(router).await;
    let sink = InMemorySink::new();

    let outcome = EnrichmentPipeline::new(
        test_fetcher(5),
        Arc::new(sink.clone()),
        format!("{}/candidates/", base),
        format!("{}/jobs/", base),
    )
    .handle(&notification("123", "456"))
    .await
    .unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert_eq!(flaky_hits.count(), 3);
}

#[tokio::test]
async fn test_unavailable_sink_fails_store_stage() {
    let upstream = upstream(Behaviour::Ok(CANDIDATE_JSON), Behaviour::Ok(JOB_JSON)).await;
    let sink = InMemorySink::new();
    sink.set_available(false);

    let err = pipeline(&upstream, &sink, 3)
        .handle(&notification("123", "456"))
        .await
        .unwrap_err();

    assert_eq!(err.state(), PipelineState::StoreFailed);
    assert!(matches!(err, PipelineError::Store(_)));
    // Fetch stage ran to completion before storing began.
    assert_eq!(upstream.candidate_hits.count(), 1);
    assert_eq!(upstream.job_hits.count(), 1);
}
