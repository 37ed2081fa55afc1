// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::batch_scrape_service::BatchScrapeService;
use crate::domain::services::enrichment_service::EnrichmentPipeline;
use crate::presentation::handlers::{scrape_handler, webhook_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由，处理器依赖通过 [`app`] 注入
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route(
            "/v1/webhooks/applications",
            post(webhook_handler::receive_application),
        )
        .route("/v1/scrape", post(scrape_handler::scrape))
        .route("/v1/scrape/batch", post(scrape_handler::scrape_batch));

    Router::new().merge(public_routes).merge(api_routes)
}

/// 组装完整应用
///
/// # 参数
///
/// * `pipeline` - Webhook 富化流水线
/// * `scraper` - 批量抓取服务
pub fn app(pipeline: Arc<EnrichmentPipeline>, scraper: Arc<BatchScrapeService>) -> Router {
    routes()
        .layer(Extension(pipeline))
        .layer(Extension(scraper))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
