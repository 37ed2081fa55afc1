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

use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::services::batch_scrape_service::BatchScrapeService;
use crate::presentation::errors::{AppError, RequestError};

/// 单个URL抓取请求
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// 批量抓取请求
#[derive(Debug, Deserialize)]
pub struct BatchScrapeRequest {
    pub urls: Vec<String>,
}

pub async fn scrape(
    Extension(service): Extension<Arc<BatchScrapeService>>,
    Json(payload): Json<ScrapeRequest>,
) -> Result<Json<Value>, AppError> {
    if payload.url.trim().is_empty() {
        return Err(RequestError::Validation("url cannot be empty".to_string()).into());
    }

    let record = service.scrape_one(payload.url.trim()).await?;
    Ok(Json(json!({ "data": record })))
}

pub async fn scrape_batch(
    Extension(service): Extension<Arc<BatchScrapeService>>,
    Json(payload): Json<BatchScrapeRequest>,
) -> Result<Json<Value>, AppError> {
    // Validate the request
    if payload.urls.is_empty() {
        return Err(RequestError::Validation("At least one URL is required".to_string()).into());
    }

    let urls = payload
        .urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .collect();

    let records = service.scrape_many(urls).await?;
    Ok(Json(json!({ "data": records })))
}
