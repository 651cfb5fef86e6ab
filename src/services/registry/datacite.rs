//! DataCite（元数据注册机构）
//!
//! `GET {base}/works/{doi}`，XML 元数据以 base64 形式嵌在
//! `data.attributes.xml` 中。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::{read_json, ArtifactRequest, RegistryLookup};
use crate::error::{ExtractionError, HttpError};
use crate::infrastructure::{RateLimiter, ResilientClient};
use crate::models::Doi;

#[derive(Debug, Clone)]
pub struct DataciteRegistry {
    api_base: String,
}

impl DataciteRegistry {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn works_url(&self, doi: &Doi) -> String {
        format!("{}/works/{}", self.api_base, doi)
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
        debug!("DataCite {} -> {}", doi, lookup.status);

        if !lookup.exists() || !request.any() {
            return Ok(lookup);
        }

        // XML 就在同一个响应里，无需再请求
        let json = match read_json(response, &url).await {
            Ok(json) => json,
            Err(e) => {
                warn!("⚠️ DataCite {} 响应体解析失败: {}", doi, e);
                lookup.extraction_error = Some(e);
                return Ok(lookup);
            }
        };

        if request.xml {
            match extract_xml(&json) {
                Ok(xml) => lookup.xml = Some(xml),
                Err(e) => {
                    warn!("⚠️ DataCite {} XML 提取失败: {}", doi, e);
                    lookup.extraction_error = Some(e);
                }
            }
        }
        if request.json {
            lookup.json = Some(json);
        }

        Ok(lookup)
    }
}

/// 从 DataCite JSON 中解码 base64 XML
pub fn extract_xml(json: &JsonValue) -> Result<String, ExtractionError> {
    let encoded = json
        .pointer("/data/attributes/xml")
        .and_then(JsonValue::as_str)
        .ok_or(ExtractionError::XmlNotFound)?;

    // 接口返回的 base64 可能按行折断
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|_| ExtractionError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| ExtractionError::InvalidBase64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_embedded_xml() {
        let xml = "<resource><identifier>10.1234/x</identifier></resource>";
        let body = json!({ "data": { "attributes": { "xml": STANDARD.encode(xml) } } });
        assert_eq!(extract_xml(&body).unwrap(), xml);
    }

    #[test]
    fn decodes_line_wrapped_base64() {
        let xml = "<resource><identifier>10.1234/wrapped</identifier><titles/></resource>";
        let encoded = STANDARD.encode(xml);
        let wrapped = encoded
            .as_bytes()
            .chunks(20)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        let body = json!({ "data": { "attributes": { "xml": format!(" {wrapped}\n") } } });
        assert_eq!(extract_xml(&body).unwrap(), xml);
    }

    #[test]
    fn missing_xml_is_reported() {
        let body = json!({ "data": { "attributes": {} } });
        assert!(matches!(extract_xml(&body), Err(ExtractionError::XmlNotFound)));
    }

    #[test]
    fn malformed_base64_is_reported() {
        let body = json!({ "data": { "attributes": { "xml": "***not base64***" } } });
        assert!(matches!(extract_xml(&body), Err(ExtractionError::InvalidBase64)));
    }

    #[test]
    fn works_url_ignores_trailing_slash() {
        let registry = DataciteRegistry::new("https://api.datacite.org/");
        let doi = Doi::parse("10.5061/dryad.8515").unwrap();
        assert_eq!(
            registry.works_url(&doi),
            "https://api.datacite.org/works/10.5061/dryad.8515"
        );
    }
}
