// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::services::batch_scrape_service::ScrapeError;
use crate::domain::services::enrichment_service::PipelineError;
use crate::utils::errors::{FetchError, GroupError};

/// 请求校验错误
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid request: {0}")]
    Validation(String),
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 错误对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<RequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }

        if let Some(error) = self.0.downcast_ref::<PipelineError>() {
            return match error {
                PipelineError::InvalidNotification(_) => StatusCode::BAD_REQUEST,
                PipelineError::Fetch(_) => {
                    if error.is_rate_limited() {
                        StatusCode::SERVICE_UNAVAILABLE
                    } else {
                        StatusCode::BAD_GATEWAY
                    }
                }
                PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        if let Some(error) = self.0.downcast_ref::<GroupError<ScrapeError>>() {
            return match error.task_error() {
                Some(scrape_error) => scrape_status(scrape_error),
                None => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        if let Some(error) = self.0.downcast_ref::<ScrapeError>() {
            return scrape_status(error);
        }

        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn scrape_status(error: &ScrapeError) -> StatusCode {
    match error.fetch_error() {
        Some(FetchError::InvalidTarget(_)) => StatusCode::BAD_REQUEST,
        Some(fetch_error) if fetch_error.is_rate_limited() => StatusCode::SERVICE_UNAVAILABLE,
        Some(_) => StatusCode::BAD_GATEWAY,
        None => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
