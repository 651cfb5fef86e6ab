//! 解析器跳转检查 - 业务能力层
//!
//! 对 `{resolver}/{doi}` 发 HEAD 并跟随跳转；有的落地页不支持 HEAD，
//! 状态码 >= 400 时改用 GET 再试一次。此检查永不返回错误。

use std::time::{Duration, Instant};

use reqwest::Method;
use tracing::debug;

use crate::config::Config;
use crate::error::HttpError;
use crate::infrastructure::ResilientClient;
use crate::models::{Doi, ResolutionInfo};

#[derive(Debug, Clone)]
pub struct ResolutionChecker {
    resolver_base: String,
    timeout: Duration,
}

impl ResolutionChecker {
    pub fn new(resolver_base: &str, timeout: Duration) -> Self {
        Self {
            resolver_base: resolver_base.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.resolver_base, config.resolution_timeout())
    }

    pub fn resolver_url(&self, doi: &Doi) -> String {
        format!("{}/{}", self.resolver_base, doi)
    }

    pub async fn check(&self, session: &ResilientClient, doi: &Doi) -> ResolutionInfo {
        let url = self.resolver_url(doi);
        let start = Instant::now();

        match self.probe(session, &url).await {
            Ok((status, final_url)) => {
                let resolves = (200..400).contains(&status);
                debug!("解析 {} -> {} ({})", doi, final_url, status);
                ResolutionInfo {
                    resolves,
                    url: Some(final_url),
                    http_status: Some(status),
                    elapsed_seconds: Some(round_millis(start.elapsed())),
                    error: (!resolves)
                        .then(|| format!("Resolution failed with status code {}", status)),
                }
            }
            Err(e) => ResolutionInfo {
                resolves: false,
                url: None,
                http_status: None,
                elapsed_seconds: Some(round_millis(start.elapsed())),
                error: Some(format!("Resolution error: {}", e)),
            },
        }
    }

    async fn probe(&self, session: &ResilientClient, url: &str) -> Result<(u16, String), HttpError> {
        let response = session.send(Method::HEAD, url, self.timeout).await?;
        let response = if response.status().as_u16() >= 400 {
            session.send(Method::GET, url, self.timeout).await?
        } else {
            response
        };
        Ok((response.status().as_u16(), response.url().to_string()))
    }
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round_millis(Duration::from_micros(1_234_567)), 1.235);
        assert_eq!(round_millis(Duration::ZERO), 0.0);
    }

    #[test]
    fn builds_resolver_url() {
        let checker = ResolutionChecker::new("https://doi.org/", Duration::from_secs(5));
        let doi = Doi::parse("doi:10.1234/ABC").unwrap();
        assert_eq!(checker.resolver_url(&doi), "https://doi.org/10.1234/abc");
    }
}
