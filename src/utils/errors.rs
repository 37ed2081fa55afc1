// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;

/// 上游抓取错误类型
///
/// `TransientNetwork` 与 `RateLimited` 可重试，其余均为终止错误。
#[derive(Error, Debug)]
pub enum FetchError {
    /// 临时网络故障（连接失败、超时、5xx）
    #[error("Transient network failure: {0}")]
    TransientNetwork(String),

    /// 上游返回 429
    #[error("Rate limited by upstream (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// 上游拒绝请求（404 等非 429 的 4xx）
    #[error("Upstream rejected request with status {status}: {message}")]
    UpstreamRejected { status: u16, message: String },

    /// 响应内容无法解析
    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    /// 目标地址无效
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// 重试次数耗尽
    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },

    /// 任务组已取消，不再发起新的尝试
    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::TransientNetwork(_) | FetchError::RateLimited { .. }
        )
    }

    /// 判断是否为限流导致的失败（包括限流重试耗尽）
    ///
    /// 调用方据此区分"上游过载"与"上游拒绝请求"。
    pub fn is_rate_limited(&self) -> bool {
        match self {
            FetchError::RateLimited { .. } => true,
            FetchError::RetryExhausted { source, .. } => source.is_rate_limited(),
            _ => false,
        }
    }

    /// 上游返回的HTTP状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RateLimited { .. } => Some(429),
            FetchError::UpstreamRejected { status, .. } => Some(*status),
            FetchError::RetryExhausted { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// 任务组错误类型
///
/// 任务组本身从不重试，只转发最先观察到的终止错误。
#[derive(Error, Debug)]
pub enum GroupError<E>
where
    E: std::error::Error + 'static,
{
    /// 某个任务失败
    #[error("Task {index} failed: {source}")]
    TaskFailed {
        index: usize,
        #[source]
        source: E,
    },

    /// 某个任务发生 panic
    #[error("Task {index} panicked: {message}")]
    TaskPanicked { index: usize, message: String },

    /// 任务组在全部任务完成前被外部取消
    #[error("Task group cancelled before completion")]
    Cancelled,

    /// 任务无法被 join（运行时关闭等）
    #[error("Task join failed: {0}")]
    Join(String),
}

impl<E> GroupError<E>
where
    E: std::error::Error + 'static,
{
    /// 失败任务的下标
    pub fn index(&self) -> Option<usize> {
        match self {
            GroupError::TaskFailed { index, .. } | GroupError::TaskPanicked { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// 失败任务的原始错误
    pub fn task_error(&self) -> Option<&E> {
        match self {
            GroupError::TaskFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
