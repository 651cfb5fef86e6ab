//! 命令行参数
//!
//! 命令行参数覆盖配置文件；布尔开关只能打开功能，不能关闭。

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::error::ConfigError;
use crate::models::Provider;

#[derive(Debug, Parser)]
#[command(name = "doi-verify", version, about = "DOI verification tool for DataCite and Crossref")]
pub struct Cli {
    /// Input CSV file (must have a "doi" column, optional "provider" column)
    #[arg(short, long = "input-file", alias = "input_file", value_name = "CSV")]
    pub input_file: PathBuf,

    /// Provider used when a row has no provider of its own
    #[arg(short, long, value_parser = parse_provider)]
    pub provider: Option<Provider>,

    /// Output directory for the report, artifacts and log
    #[arg(short = 'd', long = "output-dir", alias = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose console logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of verification workers
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Save JSON responses
    #[arg(short, long)]
    pub json: bool,

    /// Save XML metadata
    #[arg(short = 'x', long)]
    pub xml: bool,

    /// Check that each DOI resolves through doi.org
    #[arg(long)]
    pub check_resolution: bool,

    /// Resolution timeout in seconds
    #[arg(long)]
    pub resolution_timeout: Option<u64>,

    /// Maximum redirects followed during resolution
    #[arg(long)]
    pub max_redirects: Option<usize>,

    #[arg(long)]
    pub datacite_rate_limit_calls: Option<usize>,

    #[arg(long)]
    pub datacite_rate_limit_period: Option<f64>,

    #[arg(long)]
    pub crossref_rate_limit_calls: Option<usize>,

    #[arg(long)]
    pub crossref_rate_limit_period: Option<f64>,

    /// Infer the provider of rows without one via the Crossref agency lookup
    #[arg(long)]
    pub auto_detect_provider: bool,
}

fn parse_provider(value: &str) -> Result<Provider, String> {
    value
        .parse::<Provider>()
        .map_err(|_| format!("'{value}' must be either 'datacite' or 'crossref'"))
}

impl Cli {
    /// 加载配置文件（如有）并叠加命令行参数
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// 把命令行参数叠加到配置上
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.provider.is_some() {
            config.provider = self.provider;
        }
        if let Some(threads) = self.threads {
            config.thread_count = threads;
            config.parallel = threads > 1;
        }
        config.save_json |= self.json;
        config.save_xml |= self.xml;
        config.check_resolution |= self.check_resolution;
        config.auto_detect_provider |= self.auto_detect_provider;
        config.verbose_logging |= self.verbose;

        if let Some(v) = self.resolution_timeout {
            config.resolution_timeout_seconds = v;
        }
        if let Some(v) = self.max_redirects {
            config.max_redirects = v;
        }
        if let Some(v) = self.datacite_rate_limit_calls {
            config.datacite_rate_limit.calls = v;
        }
        if let Some(v) = self.datacite_rate_limit_period {
            config.datacite_rate_limit.period_seconds = v;
        }
        if let Some(v) = self.crossref_rate_limit_calls {
            config.crossref_rate_limit.calls = v;
        }
        if let Some(v) = self.crossref_rate_limit_period {
            config.crossref_rate_limit.period_seconds = v;
        }
        config
    }
}
