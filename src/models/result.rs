//! 单个 DOI 的校验结果
//!
//! 结果由 workflow 层构造，交给报告写入器后即被丢弃。

use std::path::PathBuf;

use super::provider::Provider;

/// 持久化的附件路径
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub json: Option<PathBuf>,
    pub xml: Option<PathBuf>,
}

impl ArtifactPaths {
    pub fn is_empty(&self) -> bool {
        self.json.is_none() && self.xml.is_none()
    }
}

/// 解析器（doi.org）跳转检查结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionInfo {
    pub resolves: bool,
    /// 跟随跳转后的最终 URL
    pub url: Option<String>,
    pub http_status: Option<u16>,
    /// 保留三位小数
    pub elapsed_seconds: Option<f64>,
    pub error: Option<String>,
}

/// 校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    identifier: String,
    provider: Option<Provider>,
    exists: bool,
    http_status: i32,
    error_message: String,
    artifacts: Option<ArtifactPaths>,
    resolution: Option<ResolutionInfo>,
}

impl VerificationResult {
    /// 已拿到注册机构响应的结果
    pub fn checked(identifier: impl Into<String>, provider: Provider, http_status: u16) -> Self {
        Self {
            identifier: identifier.into(),
            provider: Some(provider),
            exists: http_status == 200,
            http_status: i32::from(http_status),
            error_message: String::new(),
            artifacts: None,
            resolution: None,
        }
    }

    /// 没有拿到任何响应的失败结果（状态码记为 -1）
    pub fn failed(
        identifier: impl Into<String>,
        provider: Option<Provider>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            provider,
            exists: false,
            http_status: -1,
            error_message: error_message.into(),
            artifacts: None,
            resolution: None,
        }
    }

    /// 附加附件路径；不存在的 DOI 不会携带附件
    pub fn with_artifacts(mut self, artifacts: ArtifactPaths) -> Self {
        if self.exists && !artifacts.is_empty() {
            self.artifacts = Some(artifacts);
        }
        self
    }

    /// 记录非致命错误（如 XML 提取失败），不改变存在性
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionInfo) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn provider(&self) -> Option<Provider> {
        self.provider
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn http_status(&self) -> i32 {
        self.http_status
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn artifacts(&self) -> Option<&ArtifactPaths> {
        self.artifacts.as_ref()
    }

    pub fn resolution(&self) -> Option<&ResolutionInfo> {
        self.resolution.as_ref()
    }

    /// 转换为报告中的一行
    pub fn to_record(&self, include_resolution: bool) -> Vec<String> {
        let path_cell = |p: Option<&PathBuf>| {
            p.map(|p| p.display().to_string()).unwrap_or_default()
        };
        let artifacts = self.artifacts.as_ref();

        let mut record = vec![
            self.identifier.clone(),
            self.provider.map(|p| p.tag().to_string()).unwrap_or_default(),
            self.exists.to_string(),
            self.http_status.to_string(),
            self.error_message.clone(),
            path_cell(artifacts.and_then(|a| a.json.as_ref())),
            path_cell(artifacts.and_then(|a| a.xml.as_ref())),
        ];

        if include_resolution {
            match &self.resolution {
                Some(r) => record.extend([
                    r.resolves.to_string(),
                    r.url.clone().unwrap_or_default(),
                    r.http_status.map(|s| s.to_string()).unwrap_or_default(),
                    r.elapsed_seconds
                        .map(|s| format!("{:.3}", s))
                        .unwrap_or_default(),
                    r.error.clone().unwrap_or_default(),
                ]),
                None => record.extend(std::iter::repeat(String::new()).take(5)),
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_doi_never_carries_artifacts() {
        let result = VerificationResult::checked("10.1234/x", Provider::Datacite, 404)
            .with_artifacts(ArtifactPaths {
                json: Some(PathBuf::from("a.json")),
                xml: None,
            });
        assert!(!result.exists());
        assert!(result.artifacts().is_none());
    }

    #[test]
    fn record_width_depends_on_resolution_columns() {
        let result = VerificationResult::checked("10.1234/x", Provider::Crossref, 200);
        assert_eq!(result.to_record(false).len(), 7);
        assert_eq!(result.to_record(true).len(), 12);
    }

    #[test]
    fn failed_result_records_minus_one() {
        let result = VerificationResult::failed("bad", None, "Invalid DOI format: bad");
        let record = result.to_record(false);
        assert_eq!(record[1], "");
        assert_eq!(record[2], "false");
        assert_eq!(record[3], "-1");
    }

    #[test]
    fn resolution_time_has_three_decimals() {
        let result = VerificationResult::checked("10.1234/x", Provider::Datacite, 200)
            .with_resolution(ResolutionInfo {
                resolves: true,
                url: Some("https://example.org/landing".into()),
                http_status: Some(200),
                elapsed_seconds: Some(0.5),
                error: None,
            });
        let record = result.to_record(true);
        assert_eq!(record[7], "true");
        assert_eq!(record[10], "0.500");
    }
}
