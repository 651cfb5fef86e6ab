use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::Provider;

/// 单个提供方的限流配置：`period_seconds` 秒内最多 `calls` 次请求
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    pub calls: usize,
    pub period_seconds: f64,
}

impl RateLimitConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period_seconds)
    }
}

/// 程序配置
///
/// 优先级：命令行参数 > 配置文件 > 默认值
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// 报告、附件、日志的输出目录
    pub output_dir: PathBuf,
    /// 保存注册机构返回的 JSON
    pub save_json: bool,
    /// 保存 XML 元数据
    pub save_xml: bool,
    /// 是否检查 doi.org 跳转
    pub check_resolution: bool,
    pub resolution_timeout_seconds: u64,
    pub max_redirects: usize,
    /// 并发线程数
    pub thread_count: usize,
    /// 为 false 时强制顺序处理
    pub parallel: bool,
    /// 每批提交的 DOI 数量
    pub batch_size: usize,
    /// 顺序模式下两次请求之间的间隔
    pub sequential_delay_ms: u64,
    pub datacite_rate_limit: RateLimitConfig,
    pub crossref_rate_limit: RateLimitConfig,
    /// 整个运行使用的提供方（输入文件中的 provider 列优先）
    pub provider: Option<Provider>,
    /// 通过 Crossref agency 接口推断提供方
    pub auto_detect_provider: bool,
    // --- HTTP 配置 ---
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_factor_seconds: f64,
    /// 存在性检查的单次请求超时
    pub request_timeout_seconds: u64,
    // --- 接口地址 ---
    pub datacite_api_base: String,
    pub crossref_api_base: String,
    pub resolver_base: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results"),
            save_json: false,
            save_xml: false,
            check_resolution: false,
            resolution_timeout_seconds: 30,
            max_redirects: 5,
            thread_count: 2,
            parallel: true,
            batch_size: 1000,
            sequential_delay_ms: 100,
            datacite_rate_limit: RateLimitConfig {
                calls: 3000,
                period_seconds: 300.0,
            },
            crossref_rate_limit: RateLimitConfig {
                calls: 50,
                period_seconds: 1.0,
            },
            provider: None,
            auto_detect_provider: false,
            user_agent: format!("doi-verify/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 3,
            backoff_factor_seconds: 1.0,
            request_timeout_seconds: 60,
            datacite_api_base: "https://api.datacite.org".to_string(),
            crossref_api_base: "https://api.crossref.org".to_string(),
            resolver_base: "https://doi.org".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，未出现的字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 实际使用的工作线程数
    pub fn workers(&self) -> usize {
        if self.parallel {
            self.thread_count
        } else {
            1
        }
    }

    pub fn rate_limit_for(&self, provider: Provider) -> RateLimitConfig {
        match provider {
            Provider::Datacite => self.datacite_rate_limit,
            Provider::Crossref => self.crossref_rate_limit,
        }
    }

    pub fn api_base_for(&self, provider: Provider) -> &str {
        match provider {
            Provider::Datacite => &self.datacite_api_base,
            Provider::Crossref => &self.crossref_api_base,
        }
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("verification_report.csv")
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join("application.log")
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == 0 {
            return Err(invalid("thread_count", "必须至少为 1"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "必须至少为 1"));
        }
        for (field, limit) in [
            ("datacite_rate_limit", self.datacite_rate_limit),
            ("crossref_rate_limit", self.crossref_rate_limit),
        ] {
            if limit.calls == 0 {
                return Err(invalid(field, "calls 必须至少为 1"));
            }
            if !(limit.period_seconds.is_finite() && limit.period_seconds > 0.0) {
                return Err(invalid(field, "period_seconds 必须大于 0"));
            }
            if Duration::try_from_secs_f64(limit.period_seconds).is_err() {
                return Err(invalid(field, "period_seconds 超出可表示的时长"));
            }
        }
        if !(self.backoff_factor_seconds.is_finite() && self.backoff_factor_seconds >= 0.0) {
            return Err(invalid("backoff_factor_seconds", "不能为负数"));
        }
        if Duration::try_from_secs_f64(self.backoff_factor_seconds).is_err() {
            return Err(invalid("backoff_factor_seconds", "超出可表示的时长"));
        }
        if self.resolution_timeout_seconds == 0 {
            return Err(invalid("resolution_timeout_seconds", "必须大于 0"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workers(), 2);
        assert_eq!(config.crossref_rate_limit.calls, 50);
        assert_eq!(config.datacite_rate_limit.period(), Duration::from_secs(300));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            save_xml = true
            thread_count = 8
            provider = "crossref"

            [crossref_rate_limit]
            calls = 10
            period_seconds = 2.5
            "#,
        )
        .unwrap();
        assert!(config.save_xml);
        assert!(!config.save_json);
        assert_eq!(config.thread_count, 8);
        assert_eq!(config.provider, Some(Provider::Crossref));
        assert_eq!(config.crossref_rate_limit.period(), Duration::from_millis(2500));
        assert_eq!(config.datacite_rate_limit.calls, 3000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml_str("max_threadz = 3").is_err());
    }

    #[test]
    fn sequential_when_parallel_disabled() {
        let config = Config {
            parallel: false,
            thread_count: 16,
            ..Default::default()
        };
        assert_eq!(config.workers(), 1);
    }

    #[test]
    fn rejects_durations_too_large_to_represent() {
        let mut config = Config::default();
        config.datacite_rate_limit.period_seconds = 1e300;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "datacite_rate_limit", .. })
        ));

        let config = Config {
            backoff_factor_seconds: 1e300,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "backoff_factor_seconds", .. })
        ));
    }

    #[test]
    fn rejects_zero_rate_limit() {
        let mut config = Config::default();
        config.crossref_rate_limit.calls = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "crossref_rate_limit", .. })
        ));
    }
}
