// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use fetchrs::config::settings::Settings;
use fetchrs::domain::services::batch_scrape_service::BatchScrapeService;
use fetchrs::domain::services::enrichment_service::EnrichmentPipeline;
use fetchrs::domain::services::extraction_service::ExtractionService;
use fetchrs::engines::fetcher::Fetcher;
use fetchrs::engines::rate_limiter::HostRateLimiter;
use fetchrs::engines::reqwest_engine::ReqwestEngine;
use fetchrs::infrastructure::repositories::memory_sink::InMemorySink;
use fetchrs::presentation::routes;
use fetchrs::utils::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(settings.server.json_logs);
    info!("Starting fetchrs...");
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    if settings.metrics.enabled {
        fetchrs::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr)?;
    }

    // 3. Upstream client, limiter and fetcher
    let client = Arc::new(ReqwestEngine::new(
        settings.upstream.request_timeout(),
        settings.upstream.user_agent.as_deref(),
    )?);
    let limiter = HostRateLimiter::new(settings.rate_limiting.to_limiter_config());
    let fetcher = Arc::new(Fetcher::new(client, limiter, settings.retry.to_policy()));
    info!("Fetcher initialized");

    // 4. Services
    let sink = Arc::new(InMemorySink::new());
    let pipeline = Arc::new(EnrichmentPipeline::new(
        fetcher.clone(),
        sink,
        settings.upstream.candidate_endpoint.clone(),
        settings.upstream.job_endpoint.clone(),
    ));
    let scraper = Arc::new(BatchScrapeService::new(
        fetcher,
        Arc::new(ExtractionService),
        settings.concurrency.batch_concurrency,
    ));

    // 5. Start HTTP server
    let app = routes::app(pipeline, scraper);

    let addr = settings.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
