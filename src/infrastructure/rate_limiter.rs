//! 滑动窗口限流器 - 基础设施层
//!
//! 每个提供方一个独立实例，限流一个注册机构不会阻塞另一个。

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::{Config, RateLimitConfig};
use crate::models::Provider;

/// 等待时附加的最大随机抖动，避免多个 worker 同时醒来
const MAX_JITTER_MS: u64 = 100;

/// 滑动窗口限流器
///
/// 任意长度为 `period` 的时间窗口内最多放行 `calls` 次请求。
/// 锁只在修改窗口时持有，等待发生在锁外。
#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, calls: usize, period: Duration) -> Self {
        Self {
            name,
            calls: calls.max(1),
            period,
            window: Mutex::new(VecDeque::with_capacity(calls.max(1))),
        }
    }

    pub fn from_config(name: &'static str, limit: RateLimitConfig) -> Self {
        Self::new(name, limit.calls, limit.period())
    }

    /// 阻塞直到可以再发出一次请求
    pub async fn admit(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                self.prune(&mut window, now);

                if window.len() < self.calls {
                    window.push_back(now);
                    return;
                }

                // 窗口已满：等最早的一条滑出窗口
                match window.front() {
                    Some(oldest) => oldest
                        .checked_add(self.period)
                        .map_or(self.period, |t| t.saturating_duration_since(now)),
                    None => Duration::ZERO,
                }
            };

            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS));
            debug!(
                "⏳ {} 限流：等待 {:.3}s",
                self.name,
                (wait + jitter).as_secs_f64()
            );
            sleep(wait + jitter).await;
        }
    }

    fn prune(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= self.period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

/// 两个提供方各自的限流器
#[derive(Debug)]
pub struct RateLimiters {
    datacite: RateLimiter,
    crossref: RateLimiter,
}

impl RateLimiters {
    pub fn new(datacite: RateLimiter, crossref: RateLimiter) -> Self {
        Self { datacite, crossref }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RateLimiter::from_config("DataCite", config.datacite_rate_limit),
            RateLimiter::from_config("Crossref", config.crossref_rate_limit),
        )
    }

    pub fn for_provider(&self, provider: Provider) -> &RateLimiter {
        match provider {
            Provider::Datacite => &self.datacite,
            Provider::Crossref => &self.crossref,
        }
    }

    pub async fn admit(&self, provider: Provider) {
        self.for_provider(provider).admit().await;
    }
}
