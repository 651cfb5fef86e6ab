//! Crossref（引文索引注册机构）
//!
//! 存在性检查 `GET {base}/works/{doi}`；XML 需要单独请求 transform 接口，
//! 第二次请求同样经过 Crossref 限流器。

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::{read_json, ArtifactRequest, RegistryLookup};
use crate::error::{ExtractionError, HttpError};
use crate::infrastructure::{RateLimiter, ResilientClient};
use crate::models::{Doi, Provider};

const UNIXSD_TRANSFORM: &str = "transform/application/vnd.crossref.unixsd+xml";

#[derive(Debug, Clone)]
pub struct CrossrefRegistry {
    api_base: String,
}

impl CrossrefRegistry {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn works_url(&self, doi: &Doi) -> String {
        format!("{}/works/{}", self.api_base, doi)
    }

    pub fn xml_url(&self, doi: &Doi) -> String {
        format!("{}/works/{}/{}", self.api_base, doi, UNIXSD_TRANSFORM)
    }

    pub fn agency_url(&self, doi: &Doi) -> String {
        format!("{}/works/{}/agency", self.api_base, doi)
    }

    pub async fn lookup(
        &self,
        session: &ResilientClient,
        limiter: &RateLimiter,
        doi: &Doi,
        request: ArtifactRequest,
    ) -> Result<RegistryLookup, HttpError> {
        limiter.admit().await;

        let url = self.works_url(doi);
        let response = session.get(&url).await?;
        let mut lookup = RegistryLookup {
            status: response.status().as_u16(),
            ..Default::default()
        };
        debug!("Crossref {} -> {}", doi, lookup.status);

        if !lookup.exists() {
            return Ok(lookup);
        }

        if request.json {
            match read_json(response, &url).await {
                Ok(json) => lookup.json = Some(json),
                Err(e) => {
                    warn!("⚠️ Crossref {} 响应体解析失败: {}", doi, e);
                    lookup.extraction_error = Some(e);
                }
            }
        }

        if request.xml {
            match self.fetch_xml(session, limiter, doi).await {
                Ok(xml) => lookup.xml = Some(xml),
                Err(e) => {
                    warn!("⚠️ Crossref {} XML 获取失败: {}", doi, e);
                    lookup.extraction_error.get_or_insert(e);
                }
            }
        }

        Ok(lookup)
    }

    /// 请求 unixsd XML
    pub async fn fetch_xml(
        &self,
        session: &ResilientClient,
        limiter: &RateLimiter,
        doi: &Doi,
    ) -> Result<String, ExtractionError> {
        limiter.admit().await;

        let url = self.xml_url(doi);
        let response = session.get(&url).await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(ExtractionError::CrossrefXmlStatus(status));
        }

        response.text().await.map_err(|source| {
            ExtractionError::Http(HttpError::Transport { url, source })
        })
    }

    /// 查询 DOI 所属的注册机构
    ///
    /// 返回 `Ok(None)` 表示注册机构不是本工具支持的两家之一。
    pub async fn agency(
        &self,
        session: &ResilientClient,
        limiter: &RateLimiter,
        doi: &Doi,
    ) -> Result<Option<Provider>, ExtractionError> {
        limiter.admit().await;

        let url = self.agency_url(doi);
        let response = session.get(&url).await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(ExtractionError::AgencyStatus(status));
        }

        let json = read_json(response, &url).await?;
        Ok(parse_agency(&json))
    }
}

/// 读取 `message.agency.id`
pub fn parse_agency(json: &JsonValue) -> Option<Provider> {
    json.pointer("/message/agency/id")
        .and_then(JsonValue::as_str)
        .and_then(|id| id.parse().ok())
}
