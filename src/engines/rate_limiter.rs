// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use metrics::{counter, histogram};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 限流器配置
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    /// 基础退避时间
    pub base_delay: Duration,
    /// 计算得出的冷却时间上限
    pub max_delay: Duration,
    /// 退避指数上限
    pub max_exponent: u32,
    /// 抖动因子 (0.0-1.0)
    pub jitter: f64,
    /// 上游 Retry-After 提示的上限
    pub max_retry_after: Duration,
    /// 每个目标每秒允许的请求数（None 表示不限制）
    pub requests_per_second: Option<NonZeroU32>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_exponent: 6,
            jitter: 0.25,
            max_retry_after: Duration::from_secs(60),
            requests_per_second: None,
        }
    }
}

/// 准入检查结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    /// 是否允许立即执行
    pub allowed: bool,
    /// 不允许时，最早可以重新检查的时间
    pub wait_until: Option<Instant>,
}

impl Admission {
    fn allowed() -> Self {
        Self {
            allowed: true,
            wait_until: None,
        }
    }

    fn wait_until(deadline: Instant) -> Self {
        Self {
            allowed: false,
            wait_until: Some(deadline),
        }
    }
}

/// 单个目标的限流状态
#[derive(Clone, Debug, Default)]
struct HostState {
    /// 冷却截止时间（None 表示未被限流）
    cooldown_until: Option<Instant>,
    /// 当前退避指数
    backoff_exponent: u32,
    /// 上一次施加的冷却时长
    last_cooldown: Duration,
    // Statistics
    throttled_total: u64,
}

/// 目标限流状态快照
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostSnapshot {
    pub cooldown_until: Option<Instant>,
    pub backoff_exponent: u32,
    pub last_cooldown: Duration,
    pub throttled_total: u64,
}

/// 按目标（上游主机）区分的限流器
///
/// 状态在首次使用时惰性创建，生命周期与进程相同。多个任务并发访问同一目标时，
/// 读改写通过 `DashMap` 的条目锁串行化。
#[derive(Clone)]
pub struct HostRateLimiter {
    /// 状态映射
    states: Arc<DashMap<String, HostState>>,
    /// 稳态配额（令牌桶）
    quota: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    /// 配置
    config: RateLimiterConfig,
}

impl Default for HostRateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}

impl HostRateLimiter {
    /// 创建新的限流器实例
    ///
    /// # 参数
    ///
    /// * `config` - 限流配置
    ///
    /// # 返回值
    ///
    /// 返回新的限流器实例
    pub fn new(config: RateLimiterConfig) -> Self {
        let quota = config
            .requests_per_second
            .map(|rps| Arc::new(RateLimiter::keyed(Quota::per_second(rps))));

        Self {
            states: Arc::new(DashMap::new()),
            quota,
            config,
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// 检查目标是否允许立即执行
    ///
    /// # 参数
    ///
    /// * `target` - 目标标识（通常为 host:port）
    ///
    /// # 返回值
    ///
    /// 处于冷却期或配额耗尽时返回不允许，并附带最早可重试的时间
    pub fn admit(&self, target: &str) -> Admission {
        let now = Instant::now();

        {
            let mut state = self.states.entry(target.to_string()).or_default();
            if let Some(deadline) = state.cooldown_until {
                if deadline > now {
                    counter!("rate_limiter_rejected_total", "target" => target.to_string())
                        .increment(1);
                    return Admission::wait_until(deadline);
                }
                // Cooldown elapsed; the exponent is kept until a success resets it.
                state.cooldown_until = None;
            }
        }

        if let Some(quota) = &self.quota {
            if let Err(not_until) = quota.check_key(&target.to_string()) {
                let wait = not_until.wait_time_from(DefaultClock::default().now());
                debug!("Quota exhausted for {}, next slot in {:?}", target, wait);
                return Admission::wait_until(now + wait);
            }
        }

        Admission::allowed()
    }

    /// 记录一次 429 响应
    ///
    /// 有 Retry-After 提示时冷却 `retry_after`，否则冷却 `base_delay * 2^exponent`；
    /// 两者都叠加 `[0, jitter]` 比例的随机抖动。连续的 429（中间没有成功）产生的冷却时长
    /// 单调不减。
    ///
    /// # 参数
    ///
    /// * `target` - 目标标识
    /// * `retry_after` - 上游提供的重试提示
    ///
    /// # 返回值
    ///
    /// 实际施加的冷却时长
    pub fn signal_429(&self, target: &str, retry_after: Option<Duration>) -> Duration {
        let now = Instant::now();
        let mut state = self.states.entry(target.to_string()).or_default();

        let (delay, cap) = match retry_after {
            Some(hint) => (
                hint.min(self.config.max_retry_after),
                self.config.max_retry_after,
            ),
            None => (
                self.backoff_delay(state.backoff_exponent),
                self.config.max_delay,
            ),
        };

        let cooldown = self
            .apply_jitter(delay)
            .min(cap)
            .max(state.last_cooldown);

        let deadline = now + cooldown;
        state.cooldown_until = Some(match state.cooldown_until {
            Some(existing) if existing > deadline => existing,
            _ => deadline,
        });
        state.backoff_exponent = (state.backoff_exponent + 1).min(self.config.max_exponent);
        state.last_cooldown = cooldown;
        state.throttled_total += 1;

        counter!("rate_limiter_throttled_total", "target" => target.to_string()).increment(1);
        histogram!("rate_limiter_cooldown_seconds").record(cooldown.as_secs_f64());
        warn!(
            "Upstream {} throttled (hint {:?}), cooling down for {:?} (exponent {})",
            target, retry_after, cooldown, state.backoff_exponent
        );

        cooldown
    }

    /// 记录一次成功
    ///
    /// 单次成功即完全恢复：清除冷却并将退避指数归零。未被限流时调用无副作用。
    pub fn signal_success(&self, target: &str) {
        if let Some(mut state) = self.states.get_mut(target) {
            if state.cooldown_until.is_some() || state.backoff_exponent > 0 {
                debug!("Upstream {} recovered, clearing backoff", target);
            }
            state.cooldown_until = None;
            state.backoff_exponent = 0;
            state.last_cooldown = Duration::ZERO;
        }
    }

    /// 获取目标的限流状态快照
    pub fn snapshot(&self, target: &str) -> Option<HostSnapshot> {
        self.states.get(target).map(|state| HostSnapshot {
            cooldown_until: state.cooldown_until,
            backoff_exponent: state.backoff_exponent,
            last_cooldown: state.last_cooldown,
            throttled_total: state.throttled_total,
        })
    }

    /// 目标当前是否处于冷却期
    pub fn is_throttled(&self, target: &str) -> bool {
        self.states
            .get(target)
            .and_then(|state| state.cooldown_until)
            .is_some_and(|deadline| deadline > Instant::now())
    }

    fn backoff_delay(&self, exponent: u32) -> Duration {
        let secs = self.config.base_delay.as_secs_f64() * 2f64.powi(exponent.min(32) as i32);
        Duration::from_secs_f64(secs.min(self.config.max_delay.as_secs_f64()))
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.config.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let secs = delay.as_secs_f64();
        Duration::from_secs_f64(secs + rand::random_range(0.0..=secs * self.config.jitter))
    }
}
