use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// DOI 注册机构
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// 元数据注册机构（DataCite）
    #[serde(alias = "metadata-registry")]
    Datacite,
    /// 引文索引注册机构（Crossref）
    #[serde(alias = "citation-index")]
    Crossref,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Datacite, Provider::Crossref];

    /// 报告与目录名中使用的标识
    pub fn tag(self) -> &'static str {
        match self {
            Provider::Datacite => "datacite",
            Provider::Crossref => "crossref",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 无法识别的提供方标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown provider '{}'", self.0)
    }
}

impl std::error::Error for UnknownProvider {}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datacite" | "metadata-registry" => Ok(Provider::Datacite),
            "crossref" | "citation-index" => Ok(Provider::Crossref),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}
