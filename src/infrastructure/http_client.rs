//! 带重试的 HTTP 会话 - 基础设施层
//!
//! 只暴露幂等的 GET / HEAD，对 429 与 5xx 状态码按指数退避自动重试。

use std::time::Duration;

use reqwest::{redirect, Client, Method, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::HttpError;

/// 重试策略
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 首次请求之外最多重试的次数
    pub max_retries: u32,
    /// 第 n 次重试前等待 `backoff_factor * 2^(n-1)`
    pub backoff_factor: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_secs(1),
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: Duration::from_secs_f64(config.backoff_factor_seconds),
            ..Default::default()
        }
    }

    pub fn should_retry(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// 第 `retry` 次重试（从 1 开始）之前的等待时间
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exp)
    }
}

/// 会话参数
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub user_agent: String,
    pub max_redirects: usize,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            request_timeout: config.request_timeout(),
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// 单个 worker 独占的 HTTP 会话
#[derive(Debug, Clone)]
pub struct ResilientClient {
    client: Client,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl ResilientClient {
    pub fn new(settings: &SessionSettings) -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .pool_max_idle_per_host(1)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            retry: settings.retry.clone(),
            request_timeout: settings.request_timeout,
        })
    }

    /// GET 请求，使用会话默认超时
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.send(Method::GET, url, self.request_timeout).await
    }

    /// 指定超时的请求
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> Result<Response, HttpError> {
        self.execute(url, || {
            self.client.request(method.clone(), url).timeout(timeout)
        })
        .await
    }

    /// 重试装饰器：按状态码白名单重试，传输层错误立即返回
    async fn execute<F>(&self, url: &str, build: F) -> Result<Response, HttpError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retry = 0;
        loop {
            let response = build().send().await.map_err(|source| HttpError::Transport {
                url: url.to_string(),
                source,
            })?;

            let status = response.status();
            if !self.retry.should_retry(status) {
                return Ok(response);
            }

            if retry >= self.retry.max_retries {
                warn!("❌ {} 重试 {} 次后仍返回 {}", url, retry, status);
                return Err(HttpError::RetriesExhausted {
                    url: url.to_string(),
                    status: status.as_u16(),
                    attempts: retry + 1,
                });
            }

            retry += 1;
            let delay = self.retry.backoff(retry);
            debug!(
                "🔁 {} 返回 {}，{:.1}s 后第 {}/{} 次重试",
                url,
                status,
                delay.as_secs_f64(),
                retry,
                self.retry.max_retries
            );
            sleep(delay).await;
        }
    }
}
