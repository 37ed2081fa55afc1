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

use crate::engines::rate_limiter::RateLimiterConfig;
use crate::utils::errors::FetchError;
use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、上游、重试、限流、并发与指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 上游配置
    pub upstream: UpstreamSettings,
    /// 重试配置
    pub retry: RetrySettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 并发控制配置
    pub concurrency: ConcurrencySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 是否输出 JSON 日志
    pub json_logs: bool,
}

/// 上游配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    /// 候选人接口前缀，拼接ID后得到完整URL
    pub candidate_endpoint: String,
    /// 职位接口前缀
    pub job_endpoint: String,
    /// 单次请求超时（毫秒）
    pub request_timeout_ms: u64,
    /// 请求 User-Agent
    pub user_agent: Option<String>,
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// 抖动比例，取值 0.0 ~ 1.0
    pub jitter: f64,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingSettings {
    /// 429 冷却基础时长（毫秒）
    pub base_delay_ms: u64,
    /// 冷却时长上限（毫秒）
    pub max_delay_ms: u64,
    /// 退避指数上限
    pub max_exponent: u32,
    pub jitter: f64,
    /// Retry-After 提示的上限（毫秒）
    pub max_retry_after_ms: u64,
    /// 每个目标每秒请求配额，缺省表示不限制
    pub requests_per_second: Option<u32>,
}

/// 并发控制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ConcurrencySettings {
    /// 批量抓取的最大并发数，0 表示不限制
    pub batch_concurrency: usize,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `FETCHRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FETCHRS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 从指定文件加载配置
    ///
    /// 文件必须存在；未出现的字段使用默认值，不读取环境变量。
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path.as_ref()).required(true))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.json_logs", false)?
            .set_default("upstream.candidate_endpoint", "http://localhost:8081/candidates/")?
            .set_default("upstream.job_endpoint", "http://localhost:8081/jobs/")?
            .set_default("upstream.request_timeout_ms", 10_000)?
            .set_default("retry.max_attempts", 5)?
            .set_default("retry.base_delay_ms", 200)?
            .set_default("retry.max_delay_ms", 10_000)?
            .set_default("retry.jitter", 0.25)?
            .set_default("rate_limiting.base_delay_ms", 500)?
            .set_default("rate_limiting.max_delay_ms", 30_000)?
            .set_default("rate_limiting.max_exponent", 6)?
            .set_default("rate_limiting.jitter", 0.25)?
            .set_default("rate_limiting.max_retry_after_ms", 60_000)?
            .set_default("concurrency.batch_concurrency", 8)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    /// 服务器监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl UpstreamSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl RetrySettings {
    /// 转换为重试策略
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter_factor: self.jitter.clamp(0.0, 1.0),
            retryable: FetchError::is_retryable,
        }
    }
}

impl RateLimitingSettings {
    /// 转换为限流器配置
    pub fn to_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_exponent: self.max_exponent,
            jitter: self.jitter.clamp(0.0, 1.0),
            max_retry_after: Duration::from_millis(self.max_retry_after_ms),
            requests_per_second: self.requests_per_second.and_then(NonZeroU32::new),
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
