//! 注册机构查询服务 - 业务能力层
//!
//! 只负责"某个 DOI 在某个注册机构是否存在"以及取回元数据，
//! 不写文件、不计数、不关心流程。

pub mod crossref;
pub mod datacite;

use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::error::{ExtractionError, HttpError};
use crate::infrastructure::{RateLimiters, ResilientClient};
use crate::models::{Doi, Provider};

pub use crossref::CrossrefRegistry;
pub use datacite::DataciteRegistry;

/// 需要额外取回的附件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub json: bool,
    pub xml: bool,
}

impl ArtifactRequest {
    pub fn any(&self) -> bool {
        self.json || self.xml
    }
}

/// 一次存在性查询的结果
#[derive(Debug, Default)]
pub struct RegistryLookup {
    pub status: u16,
    /// 响应 JSON（仅在 DOI 存在且需要附件时解析）
    pub json: Option<JsonValue>,
    pub xml: Option<String>,
    /// 附件提取失败不影响存在性
    pub extraction_error: Option<ExtractionError>,
}

impl RegistryLookup {
    pub fn exists(&self) -> bool {
        self.status == 200
    }
}

/// 两个注册机构的查询入口
#[derive(Debug, Clone)]
pub struct RegistryService {
    datacite: DataciteRegistry,
    crossref: CrossrefRegistry,
}

impl RegistryService {
    pub fn new(config: &Config) -> Self {
        Self {
            datacite: DataciteRegistry::new(&config.datacite_api_base),
            crossref: CrossrefRegistry::new(&config.crossref_api_base),
        }
    }

    /// 在对应提供方的限流器放行后查询
    pub async fn lookup(
        &self,
        session: &ResilientClient,
        limiters: &RateLimiters,
        doi: &Doi,
        provider: Provider,
        request: ArtifactRequest,
    ) -> Result<RegistryLookup, HttpError> {
        let limiter = limiters.for_provider(provider);
        match provider {
            Provider::Datacite => self.datacite.lookup(session, limiter, doi, request).await,
            Provider::Crossref => self.crossref.lookup(session, limiter, doi, request).await,
        }
    }
}

/// 解析响应体为 JSON；失败时记录为提取错误
pub(crate) async fn read_json(
    response: reqwest::Response,
    url: &str,
) -> Result<JsonValue, ExtractionError> {
    let bytes = response.bytes().await.map_err(|source| {
        ExtractionError::Http(HttpError::Transport {
            url: url.to_string(),
            source,
        })
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
