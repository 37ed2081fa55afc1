// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::FetchError;
use std::time::Duration;

/// 重试决策
#[derive(Debug)]
pub enum RetryDecision<T> {
    /// 成功，停止
    StopSuccess(T),
    /// 失败，停止
    StopFailure(FetchError),
    /// 等待 `delay` 后重试；`error` 为本次观察到的错误
    Retry { delay: Duration, error: FetchError },
}

/// 重试策略配置
///
/// 不可变配置，只负责决策，不执行任何等待。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含首次）
    pub max_attempts: u32,
    /// 初始退避时间
    pub base_delay: Duration,
    /// 最大退避时间
    pub max_delay: Duration,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 可重试错误判定
    pub retryable: fn(&FetchError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.25,
            retryable: FetchError::is_retryable,
        }
    }
}

impl RetryPolicy {
    /// 计算第 `attempt` 次尝试失败后的退避时间
    ///
    /// `min(max_delay, base_delay * 2^attempt)` 加上 `[0, jitter_factor]` 比例的随机抖动，
    /// 最终结果不超过 `max_delay`。
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(32) as i32;
        let backoff_secs = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        let max_secs = self.max_delay.as_secs_f64();
        let capped = backoff_secs.min(max_secs);

        let jittered = if self.jitter_factor > 0.0 && capped > 0.0 {
            capped + rand::random_range(0.0..=capped * self.jitter_factor)
        } else {
            capped
        };

        Duration::from_secs_f64(jittered.min(max_secs))
    }

    /// 是否还有剩余尝试次数
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// 根据已尝试次数与本次结果决定下一步动作
    ///
    /// # 参数
    ///
    /// * `attempt` - 已完成的尝试次数（从1开始）
    /// * `outcome` - 本次尝试的结果
    ///
    /// # 返回值
    ///
    /// 尝试次数耗尽时，可重试错误被包装为 [`FetchError::RetryExhausted`]，
    /// 不可重试错误原样返回。
    pub fn next_action<T>(&self, attempt: u32, outcome: Result<T, FetchError>) -> RetryDecision<T> {
        let error = match outcome {
            Ok(value) => return RetryDecision::StopSuccess(value),
            Err(error) => error,
        };

        let retryable = (self.retryable)(&error);

        if !self.should_retry(attempt) {
            if retryable {
                return RetryDecision::StopFailure(FetchError::RetryExhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }
            return RetryDecision::StopFailure(error);
        }

        if retryable {
            RetryDecision::Retry {
                delay: self.calculate_backoff(attempt),
                error,
            }
        } else {
            RetryDecision::StopFailure(error)
        }
    }
}
