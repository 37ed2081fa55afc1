// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::rate_limiter::HostRateLimiter;
use crate::engines::traits::{UpstreamClient, UpstreamResponse};
use crate::utils::errors::FetchError;
use crate::utils::retry_policy::{RetryDecision, RetryPolicy};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// 错误信息中保留的响应体最大长度
const MAX_ERROR_BODY_CHARS: usize = 200;

/// 带限流准入与重试的抓取器
///
/// 每次尝试前先通过 [`HostRateLimiter`] 准入；遇到 429 时通知限流器并按
/// [`RetryPolicy`] 决定是否重试。
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn UpstreamClient>,
    limiter: HostRateLimiter,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Arc<dyn UpstreamClient>, limiter: HostRateLimiter, policy: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            policy,
        }
    }

    pub fn limiter(&self) -> &HostRateLimiter {
        &self.limiter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 抓取目标URL
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(UpstreamResponse)` - 2xx 响应
    /// * `Err(FetchError)` - 终止错误；重试耗尽时为 [`FetchError::RetryExhausted`]
    pub async fn fetch(&self, url: &str) -> Result<UpstreamResponse, FetchError> {
        self.fetch_with_cancel(url, &CancellationToken::new()).await
    }

    /// 可取消的抓取
    ///
    /// 取消后不再开始新的尝试、准入等待或重试休眠；已经发出的请求自然完成。
    pub async fn fetch_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<UpstreamResponse, FetchError> {
        let target = target_key(url)?;
        let mut attempt: u32 = 0;

        loop {
            self.wait_for_admission(&target, cancel).await?;

            attempt += 1;
            counter!("upstream_fetch_attempts_total", "target" => target.clone()).increment(1);
            debug!("Fetching {} (attempt {})", url, attempt);

            let outcome = self.attempt(url).await;
            match &outcome {
                Ok(_) => self.limiter.signal_success(&target),
                Err(FetchError::RateLimited { retry_after }) => {
                    self.limiter.signal_429(&target, *retry_after);
                }
                Err(_) => {}
            }

            match self.policy.next_action(attempt, outcome) {
                RetryDecision::StopSuccess(response) => {
                    if attempt > 1 {
                        info!("Fetched {} after {} attempts", url, attempt);
                    }
                    return Ok(response);
                }
                RetryDecision::StopFailure(error) => {
                    counter!("upstream_fetch_failures_total", "target" => target.clone())
                        .increment(1);
                    warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
                    return Err(error);
                }
                RetryDecision::Retry { delay, error } => {
                    warn!(
                        "Attempt {} for {} failed: {}; retrying in {:?}",
                        attempt, url, error, delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// 等待目标准入
    ///
    /// 休眠只占用当前任务，不阻塞其他任务。
    async fn wait_for_admission(
        &self,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let admission = self.limiter.admit(target);
            if admission.allowed {
                return Ok(());
            }

            let deadline = admission.wait_until.unwrap_or_else(Instant::now);
            debug!(
                "Target {} not admitted, waiting {:?}",
                target,
                deadline.saturating_duration_since(Instant::now())
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = sleep_until(deadline) => {}
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<UpstreamResponse, FetchError> {
        let start = Instant::now();
        let result = self.client.get(url).await;
        histogram!("upstream_fetch_duration_seconds").record(start.elapsed().as_secs_f64());

        classify(result?)
    }
}

/// 提取限流目标标识（host:port）
///
/// 同一主机的不同端口视为不同上游。
pub fn target_key(url: &str) -> Result<String, FetchError> {
    let parsed =
        Url::parse(url).map_err(|e| FetchError::InvalidTarget(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| FetchError::InvalidTarget(format!("{}: missing host", url)))?;

    Ok(match parsed.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// 将上游响应按状态码归类
fn classify(response: UpstreamResponse) -> Result<UpstreamResponse, FetchError> {
    if response.is_success() {
        return Ok(response);
    }
    match response.status {
        429 => Err(FetchError::RateLimited {
            retry_after: response.header("retry-after").and_then(parse_retry_after),
        }),
        408 | 500..=599 => Err(FetchError::TransientNetwork(format!(
            "upstream returned status {}",
            response.status
        ))),
        status => Err(FetchError::UpstreamRejected {
            status,
            message: String::from_utf8_lossy(&response.body)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect(),
        }),
    }
}

/// 解析 Retry-After 头
///
/// 支持秒数与 HTTP 日期两种格式；日期早于当前时间时返回零。
/// 超出 `u64` 的秒数饱和为 [`Duration::MAX`]，由限流器按上限截断。
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return Some(
            value
                .parse::<u64>()
                .map(Duration::from_secs)
                .unwrap_or(Duration::MAX),
        );
    }
    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Duration::try_from_secs_f64(secs).ok();
        }
        return None;
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&Utc) - Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}
